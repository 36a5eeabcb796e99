//! Host-facing API tests

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::build::*;
use super::{create_sync_runtime, create_test_runtime, run};
use jseval::value::PropertyKey;
use jseval::{ErrorKind, HostObject, JsError, JsValue, Program, Runtime, api};
use serde_json::json;

/// Numeric settings owned by the host
#[derive(Debug, Default)]
struct Settings {
    values: RefCell<BTreeMap<String, f64>>,
}

impl HostObject for Settings {
    fn class_name(&self) -> &str {
        "Settings"
    }

    fn get(&self, key: &PropertyKey) -> Option<JsValue> {
        self.values
            .borrow()
            .get(&key.to_string())
            .map(|n| JsValue::Number(*n))
    }

    fn set(&self, key: &PropertyKey, value: JsValue) -> bool {
        match value.as_number() {
            Some(n) => {
                self.values.borrow_mut().insert(key.to_string(), n);
                true
            }
            None => false,
        }
    }

    fn keys(&self) -> Vec<PropertyKey> {
        self.values
            .borrow()
            .keys()
            .map(|key| PropertyKey::from(key.as_str()))
            .collect()
    }
}

#[test]
fn test_evaluate_reads_json_trees() {
    let runtime = create_test_runtime();
    // [1 + 1, "a"]
    let source = r#"{"body": [{"Expression": {"Array": [
        {"Expression": {"Binary": {"operator": "Add",
            "left": {"Literal": {"Number": 1.0}},
            "right": {"Literal": {"Number": 1.0}}}}},
        {"Expression": {"Literal": {"String": "a"}}}
    ]}}]}"#;
    assert_eq!(runtime.evaluate(source).unwrap(), json!([2, "a"]));
}

#[test]
fn test_evaluate_rejects_malformed_source() {
    let runtime = create_test_runtime();
    let err = runtime.evaluate("1 +").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_custom_parser() {
    // every source becomes a string literal of itself
    let runtime = Runtime::new().with_parser(
        |source: &str, _module: Option<&str>| -> Result<Program, JsError> {
            Ok(program(vec![expr(string(source))]))
        },
    );
    assert_eq!(runtime.evaluate("hello").unwrap(), json!("hello"));

    let module = runtime.compile("mod", Some("named")).unwrap();
    assert_eq!(module.name(), Some("named"));
    assert_eq!(runtime.invoke(&module).unwrap(), JsValue::from("mod"));
}

#[test]
fn test_call_script_function_with_host_data() {
    let runtime = create_test_runtime();
    // function total(order) { let s = 0; for (const item of order.items) { s += item.qty } return s }
    run(
        &runtime,
        program(vec![func_decl(
            "total",
            params(&["order"]),
            vec![
                let_("s", num(0.0)),
                for_of(
                    "item",
                    member(ident("order"), "items"),
                    vec![expr(add_assign("s", member(ident("item"), "qty")))],
                ),
                ret(ident("s")),
            ],
        )]),
    )
    .unwrap();

    let total = runtime.get_global("total").unwrap();
    let order = api::from_json(&runtime, &json!({"items": [{"qty": 2}, {"qty": 3}]}));
    let result = runtime.call(&total, JsValue::Undefined, vec![order]).unwrap();
    assert_eq!(result, JsValue::Number(5.0));
}

#[test]
fn test_calling_non_function_from_host() {
    let runtime = create_test_runtime();
    let err = runtime
        .call(&JsValue::Number(1.0), JsValue::Undefined, vec![])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_host_object_properties() {
    let runtime = create_test_runtime();
    let settings = Rc::new(Settings::default());
    settings.values.borrow_mut().insert("limit".to_string(), 5.0);
    let value = api::host_object(&runtime, settings.clone());

    // function bump(s) { s.limit = s.limit + 1; s.note = "x"; return Object.prototype.toString.call(s) }
    run(
        &runtime,
        program(vec![func_decl(
            "bump",
            params(&["s"]),
            vec![
                expr(assign_member(
                    ident("s"),
                    "limit",
                    add(member(ident("s"), "limit"), num(1.0)),
                )),
                expr(assign_member(ident("s"), "note", string("x"))),
                ret(method(
                    member(member(ident("Object"), "prototype"), "toString"),
                    "call",
                    vec![ident("s")],
                )),
            ],
        )]),
    )
    .unwrap();

    let bump = runtime.get_global("bump").unwrap();
    let tag = runtime
        .call(&bump, JsValue::Undefined, vec![value.clone()])
        .unwrap();
    assert_eq!(tag, JsValue::from("[object Settings]"));
    assert_eq!(settings.values.borrow().get("limit"), Some(&6.0));
    // rejected by the host, kept on the script side
    assert!(!settings.values.borrow().contains_key("note"));
    assert_eq!(api::get_property(&value, "note").unwrap(), JsValue::from("x"));
    assert_eq!(api::keys(&value), vec!["limit".to_string(), "note".to_string()]);
}

#[test]
fn test_to_json_drops_unrepresentable_values() {
    // ({ a: 1, f: function () {}, u: undefined, n: [undefined, 1] })
    let value = run(
        &create_test_runtime(),
        program(vec![expr(object(vec![
            ("a", num(1.0)),
            ("f", func_expr(vec![], vec![])),
            ("u", undefined()),
            ("n", array(vec![undefined(), num(1.0)])),
        ]))]),
    )
    .unwrap();
    assert_eq!(api::to_json(&value).unwrap(), json!({"a": 1, "n": [null, 1]}));
}

#[test]
fn test_get_property() {
    let runtime = create_test_runtime();
    let value = api::from_json(&runtime, &json!({"a": 1}));
    assert_eq!(api::get_property(&value, "a").unwrap(), JsValue::Number(1.0));
    assert_eq!(api::get_property(&value, "missing").unwrap(), JsValue::Undefined);
    // inherited
    assert!(api::get_property(&value, "hasOwnProperty").unwrap().is_callable());
    assert!(api::get_property(&JsValue::Number(1.0), "a").is_err());
}

#[test]
fn test_task_result_of_non_task() {
    assert!(api::task_result(&JsValue::Number(1.0)).is_none());
    let runtime = create_test_runtime();
    assert!(api::task_result(&api::from_json(&runtime, &json!({}))).is_none());
}

#[test]
fn test_global_names_are_sorted() {
    let runtime = create_test_runtime();
    runtime.register_function("zeta", 0, |_scope, _this, _args| Ok(JsValue::Undefined));
    let names: Vec<String> = runtime
        .global_names()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect();
    assert!(names.contains(&"zeta".to_string()));
    assert!(names.contains(&"Object".to_string()));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_invoke_sync_requires_sync_runtime() {
    let script_body = || program(vec![expr(num(1.0))]);

    let runtime = create_test_runtime();
    let script = runtime.compile_program(script_body(), None).unwrap();
    assert_eq!(runtime.invoke_sync(&script).unwrap_err().kind(), ErrorKind::Type);

    let runtime = create_sync_runtime();
    let script = runtime.compile_program(script_body(), None).unwrap();
    assert_eq!(runtime.invoke_sync(&script).unwrap(), JsValue::Number(1.0));
    assert_eq!(runtime.invoke(&script).unwrap(), JsValue::Number(1.0));
}

#[test]
fn test_registering_same_name_replaces_host_function() {
    let runtime = create_test_runtime();
    runtime.register_function("answer", 0, |_scope, _this, _args| Ok(JsValue::Number(1.0)));
    runtime.register_function("answer", 0, |_scope, _this, _args| Ok(JsValue::Number(42.0)));
    runtime.reset();
    let value = run(&runtime, program(vec![expr(call(ident("answer"), vec![]))])).unwrap();
    assert_eq!(value, JsValue::Number(42.0));
}

#[test]
fn test_failed_invocation_leaves_runtime_usable() {
    for runtime in [create_test_runtime(), create_sync_runtime()] {
        // var kept = 1; var items = [{ toString: function () { null.x } }]
        run(
            &runtime,
            program(vec![
                var("kept", num(1.0)),
                var(
                    "items",
                    array(vec![object(vec![(
                        "toString",
                        func_expr(vec![], vec![expr(member(null(), "x"))]),
                    )])]),
                ),
            ]),
        )
        .unwrap();

        // items.join()
        let failing = runtime
            .compile_program(program(vec![expr(method(ident("items"), "join", vec![]))]), None)
            .unwrap();
        for _ in 0..2 {
            assert_eq!(runtime.invoke(&failing).unwrap_err().kind(), ErrorKind::Type);
        }

        // items[0] = kept; items.join()
        run(&runtime, program(vec![expr(assign_index(ident("items"), num(0.0), ident("kept")))]))
            .unwrap();
        assert_eq!(runtime.invoke(&failing).unwrap(), JsValue::from("1"));
        assert_eq!(runtime.get_global("kept"), Some(JsValue::Number(1.0)));
    }
}

#[test]
fn test_evaluate_after_thrown_error() {
    let runtime = create_test_runtime();
    let err = run(&runtime, program(vec![var("x", num(2.0)), throw(string("boom"))])).unwrap_err();
    assert!(matches!(err, JsError::Thrown(_)));
    // bindings made before the throw stay
    let value = run(&runtime, program(vec![expr(mul(ident("x"), num(3.0)))])).unwrap();
    assert_eq!(value, JsValue::Number(6.0));
}
