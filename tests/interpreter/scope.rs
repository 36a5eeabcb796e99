//! Binding and frame tests

use super::build::*;
use super::{create_test_runtime, error_kind, eval, run, throws_error};
use jseval::{ErrorKind, JsValue, Runtime, RuntimeConfig};

#[test]
fn test_const_rejects_assignment() {
    // const x = 1; x = 2
    assert!(throws_error(
        vec![const_("x", num(1.0)), expr(assign("x", num(2.0)))],
        ErrorKind::Type,
        "constant"
    ));
    // const x = 1; x++
    assert_eq!(
        error_kind(vec![const_("x", num(1.0)), expr(increment(ident("x"), false))]),
        Some(ErrorKind::Type)
    );
}

#[test]
fn test_const_redeclaration_in_same_frame() {
    // const x = 1; const x = 2
    assert_eq!(
        error_kind(vec![const_("x", num(1.0)), const_("x", num(2.0))]),
        Some(ErrorKind::Syntax)
    );
}

#[test]
fn test_const_without_initializer_fails_to_compile() {
    let runtime = create_test_runtime();
    let result = runtime.compile_program(program(vec![const_uninit("x")]), None);
    assert!(matches!(result, Err(jseval::JsError::SyntaxError { .. })));
}

#[test]
fn test_let_shadows_in_block() {
    // let x = 1; { let x = 2; } x
    let result = eval(vec![
        let_("x", num(1.0)),
        block(vec![let_("x", num(2.0))]),
        expr(ident("x")),
    ]);
    assert_eq!(result, JsValue::Number(1.0));
}

#[test]
fn test_assignment_updates_nearest_binding() {
    // let x = 1; { x = 2; } x
    let result = eval(vec![
        let_("x", num(1.0)),
        block(vec![expr(assign("x", num(2.0)))]),
        expr(ident("x")),
    ]);
    assert_eq!(result, JsValue::Number(2.0));
}

#[test]
fn test_const_shadowed_by_inner_let() {
    // const x = 1; { let x = 2; x = 3; } x
    let result = eval(vec![
        const_("x", num(1.0)),
        block(vec![let_("x", num(2.0)), expr(assign("x", num(3.0)))]),
        expr(ident("x")),
    ]);
    assert_eq!(result, JsValue::Number(1.0));
}

#[test]
fn test_var_escapes_block_but_not_function() {
    // { var y = 3; } y
    assert_eq!(
        eval(vec![block(vec![var("y", num(3.0))]), expr(ident("y"))]),
        JsValue::Number(3.0)
    );
    // function f() { var inner = 1 } f(); typeof inner
    assert_eq!(
        eval(vec![
            func_decl("f", vec![], vec![var("inner", num(1.0))]),
            expr(call(ident("f"), vec![])),
            expr(type_of(ident("inner"))),
        ]),
        JsValue::from("undefined")
    );
}

#[test]
fn test_var_is_hoisted() {
    // const before = typeof v; var v = 1; before
    let result = eval(vec![
        const_("before", type_of(ident("v"))),
        var("v", num(1.0)),
        expr(ident("before")),
    ]);
    assert_eq!(result, JsValue::from("undefined"));
}

#[test]
fn test_function_declarations_are_hoisted() {
    // f(); function f() { return 9 }
    let result = eval(vec![
        expr(call(ident("f"), vec![])),
        func_decl("f", vec![], vec![ret(num(9.0))]),
    ]);
    assert_eq!(result, JsValue::Number(9.0));
}

#[test]
fn test_unresolvable_names() {
    assert!(throws_error(
        vec![expr(ident("missing"))],
        ErrorKind::Reference,
        "missing is not defined"
    ));
    // assigning an undeclared name does not create a global
    assert_eq!(error_kind(vec![expr(assign("missing", num(1.0)))]), Some(ErrorKind::Reference));
}

#[test]
fn test_globals_persist_across_invocations() {
    let runtime = create_test_runtime();
    run(&runtime, program(vec![var("count", num(0.0))])).unwrap();
    let script = runtime
        .compile_program(
            program(vec![expr(add_assign("count", num(1.0))), expr(ident("count"))]),
            None,
        )
        .unwrap();
    runtime.invoke(&script).unwrap();
    assert_eq!(runtime.invoke(&script).unwrap(), JsValue::Number(2.0));
    assert_eq!(runtime.get_global("count"), Some(JsValue::Number(2.0)));
}

#[test]
fn test_reset_discards_globals() {
    let runtime = create_test_runtime();
    run(&runtime, program(vec![var("g", num(1.0))])).unwrap();
    runtime.reset();
    let err = run(&runtime, program(vec![expr(ident("g"))])).unwrap_err();
    assert_eq!(err.kind(), jseval::ErrorKind::Reference);
    // intrinsics come back
    assert!(runtime.get_global("Object").is_some());
}

#[test]
fn test_module_frame_is_isolated() {
    let runtime = create_test_runtime();
    run(&runtime, program(vec![var("shared", num(5.0))])).unwrap();

    // module: var m = 1; let secret = 2; shared + 1
    let module = runtime
        .compile_program(
            program(vec![
                var("m", num(1.0)),
                let_("secret", num(2.0)),
                expr(add(ident("shared"), num(1.0))),
            ]),
            Some("config"),
        )
        .unwrap();
    assert_eq!(module.name(), Some("config"));
    assert_eq!(runtime.invoke(&module).unwrap(), JsValue::Number(6.0));

    // neither binding leaks into the root frame
    let probe = program(vec![expr(array(vec![type_of(ident("m")), type_of(ident("secret"))]))]);
    let value = run(&runtime, probe).unwrap();
    assert_eq!(
        jseval::api::to_json(&value).unwrap(),
        serde_json::json!(["undefined", "undefined"])
    );
}

#[test]
fn test_strict_program_on_sloppy_root() {
    let runtime = create_test_runtime();
    // "use strict"; var v = 1; let s = 2;
    run(
        &runtime,
        strict_program(vec![var("v", num(1.0)), let_("s", num(2.0))]),
    )
    .unwrap();
    assert_eq!(run(&runtime, program(vec![expr(ident("v"))])).unwrap(), JsValue::Number(1.0));
    assert_eq!(
        run(&runtime, program(vec![expr(type_of(ident("s")))])).unwrap(),
        JsValue::from("undefined")
    );
}

#[test]
fn test_call_depth_limit() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_max_call_depth(24));
    // function r() { return r() } r()
    let result = run(
        &runtime,
        program(vec![
            func_decl("r", vec![], vec![ret(call(ident("r"), vec![]))]),
            expr(call(ident("r"), vec![])),
        ]),
    );
    assert!(matches!(result, Err(jseval::JsError::RangeError { .. })));

    // shallow recursion stays under the limit
    let result = run(
        &runtime,
        program(vec![
            func_decl(
                "down",
                params(&["n"]),
                vec![ret(conditional(
                    lt(ident("n"), num(1.0)),
                    num(0.0),
                    call(ident("down"), vec![sub(ident("n"), num(1.0))]),
                ))],
            ),
            expr(call(ident("down"), vec![num(10.0)])),
        ]),
    );
    assert_eq!(result.unwrap(), JsValue::Number(0.0));
}
