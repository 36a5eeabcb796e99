//! Function, closure and binding tests

use super::build::*;
use super::{create_test_runtime, error_kind, eval, eval_json};
use jseval::ast::BinaryOp;
use jseval::{ErrorKind, JsError, JsValue};
use serde_json::json;

#[test]
fn test_closure_retains_defining_scope() {
    // function counter() { let n = 0; return function () { n = n + 1; return n } }
    // const c = counter(); c(); c()
    let result = eval(vec![
        func_decl(
            "counter",
            vec![],
            vec![
                let_("n", num(0.0)),
                ret(func_expr(
                    vec![],
                    vec![expr(assign("n", add(ident("n"), num(1.0)))), ret(ident("n"))],
                )),
            ],
        ),
        const_("c", call(ident("counter"), vec![])),
        expr(call(ident("c"), vec![])),
        expr(call(ident("c"), vec![])),
    ]);
    assert_eq!(result, JsValue::Number(2.0));
}

#[test]
fn test_closures_share_captured_bindings() {
    // function pair() {
    //   let v = 0;
    //   return [function () { v = v + 1 }, function () { return v }]
    // }
    // const p = pair(); p[0](); p[0](); p[1]()
    let result = eval(vec![
        func_decl(
            "pair",
            vec![],
            vec![
                let_("v", num(0.0)),
                ret(array(vec![
                    func_expr(vec![], vec![expr(assign("v", add(ident("v"), num(1.0))))]),
                    func_expr(vec![], vec![ret(ident("v"))]),
                ])),
            ],
        ),
        const_("p", call(ident("pair"), vec![])),
        expr(call(index(ident("p"), num(0.0)), vec![])),
        expr(call(index(ident("p"), num(0.0)), vec![])),
        expr(call(index(ident("p"), num(1.0)), vec![])),
    ]);
    assert_eq!(result, JsValue::Number(2.0));
}

#[test]
fn test_independent_closure_instances() {
    // const a = counter(); const b = counter(); a(); a(); b()
    let counter = func_decl(
        "counter",
        vec![],
        vec![
            let_("n", num(0.0)),
            ret(arrow(vec![], assign("n", add(ident("n"), num(1.0))))),
        ],
    );
    let result = eval(vec![
        counter,
        const_("a", call(ident("counter"), vec![])),
        const_("b", call(ident("counter"), vec![])),
        expr(call(ident("a"), vec![])),
        expr(call(ident("a"), vec![])),
        expr(call(ident("b"), vec![])),
    ]);
    assert_eq!(result, JsValue::Number(1.0));
}

#[test]
fn test_bind_composition() {
    // function f(a, b, c) { return [this.tag, a, b, c] }
    // const g = f.bind({ tag: "t1" }, "a").bind({ tag: "t2" }, "b");
    // g("c")
    let result = eval_json(vec![
        func_decl(
            "f",
            params(&["a", "b", "c"]),
            vec![ret(array(vec![
                member(this(), "tag"),
                ident("a"),
                ident("b"),
                ident("c"),
            ]))],
        ),
        const_(
            "g",
            method(
                method(
                    ident("f"),
                    "bind",
                    vec![object(vec![("tag", string("t1"))]), string("a")],
                ),
                "bind",
                vec![object(vec![("tag", string("t2"))]), string("b")],
            ),
        ),
        expr(call(ident("g"), vec![string("c")])),
    ]);
    assert_eq!(result, json!(["t1", "a", "b", "c"]));
}

#[test]
fn test_bound_function_metadata() {
    // function add3(a, b, c) {}; const b = add3.bind(null, 1); [b.name, b.length]
    let result = eval_json(vec![
        func_decl("add3", params(&["a", "b", "c"]), vec![]),
        const_("b", method(ident("add3"), "bind", vec![null(), num(1.0)])),
        expr(array(vec![member(ident("b"), "name"), member(ident("b"), "length")])),
    ]);
    assert_eq!(result, json!(["bound add3", 2]));
}

#[test]
fn test_call_and_apply_set_this() {
    // function f(a) { return this.x + a }
    let f = func_decl(
        "f",
        params(&["a"]),
        vec![ret(add(member(this(), "x"), ident("a")))],
    );
    // f.call({ x: 1 }, 2)
    assert_eq!(
        eval(vec![
            f.clone(),
            expr(method(ident("f"), "call", vec![object(vec![("x", num(1.0))]), num(2.0)])),
        ]),
        JsValue::Number(3.0)
    );
    // f.apply({ x: 1 }, [5])
    assert_eq!(
        eval(vec![
            f,
            expr(method(
                ident("f"),
                "apply",
                vec![object(vec![("x", num(1.0))]), array(vec![num(5.0)])],
            )),
        ]),
        JsValue::Number(6.0)
    );
}

#[test]
fn test_method_call_passes_receiver() {
    // const o = { v: 4, get2() { return this.v * 2 } }; o.get2()
    let result = eval(vec![
        const_(
            "o",
            object_with(vec![
                prop("v", num(4.0)),
                method_prop("get2", vec![], vec![ret(mul(member(this(), "v"), num(2.0)))]),
            ]),
        ),
        expr(method(ident("o"), "get2", vec![])),
    ]);
    assert_eq!(result, JsValue::Number(8.0));
}

#[test]
fn test_arrow_keeps_outer_this() {
    // const o = { v: 1, m() { return (() => this.v)() } }; o.m()
    let result = eval(vec![
        const_(
            "o",
            object_with(vec![
                prop("v", num(1.0)),
                method_prop(
                    "m",
                    vec![],
                    vec![ret(call(arrow(vec![], member(this(), "v")), vec![]))],
                ),
            ]),
        ),
        expr(method(ident("o"), "m", vec![])),
    ]);
    assert_eq!(result, JsValue::Number(1.0));
}

#[test]
fn test_rest_parameters_collect_remaining_arguments() {
    // function f(a, ...rest) { return [a, rest] } f(1, 2, 3)
    let result = eval_json(vec![
        func_decl(
            "f",
            vec![param("a"), rest("rest")],
            vec![ret(array(vec![ident("a"), ident("rest")]))],
        ),
        expr(call(ident("f"), vec![num(1.0), num(2.0), num(3.0)])),
    ]);
    assert_eq!(result, json!([1, [2, 3]]));

    // f() with no arguments still gets an empty array
    let result = eval_json(vec![
        func_decl("f", vec![rest("rest")], vec![ret(ident("rest"))]),
        expr(call(ident("f"), vec![])),
    ]);
    assert_eq!(result, json!([]));
}

#[test]
fn test_malformed_rest_parameters_fail_at_definition() {
    let runtime = create_test_runtime();
    // function f(...a, ...b) {}
    let two_rests = program(vec![func_decl("f", vec![rest("a"), rest("b")], vec![])]);
    assert!(matches!(
        runtime.compile_program(two_rests, None),
        Err(JsError::SyntaxError { .. })
    ));
    // (function (...a, b) {})
    let not_last = program(vec![expr(func_expr(vec![rest("a"), param("b")], vec![]))]);
    assert!(matches!(
        runtime.compile_program(not_last, None),
        Err(JsError::SyntaxError { .. })
    ));
}

#[test]
fn test_default_parameters() {
    // function f(a, b = a * 10) { return a + b }
    let f = func_decl(
        "f",
        vec![param("a"), default_param("b", mul(ident("a"), num(10.0)))],
        vec![ret(add(ident("a"), ident("b")))],
    );
    assert_eq!(
        eval(vec![f.clone(), expr(call(ident("f"), vec![num(1.0)]))]),
        JsValue::Number(11.0)
    );
    assert_eq!(
        eval(vec![f.clone(), expr(call(ident("f"), vec![num(1.0), undefined()]))]),
        JsValue::Number(11.0)
    );
    assert_eq!(
        eval(vec![f, expr(call(ident("f"), vec![num(1.0), num(2.0)]))]),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_missing_arguments_are_undefined() {
    // function f(a, b) { return typeof b } f(1)
    let result = eval(vec![
        func_decl("f", params(&["a", "b"]), vec![ret(type_of(ident("b")))]),
        expr(call(ident("f"), vec![num(1.0)])),
    ]);
    assert_eq!(result, JsValue::from("undefined"));
}

#[test]
fn test_arguments_object() {
    // function f() { return arguments.length } f(1, 2, 3)
    let result = eval(vec![
        func_decl("f", vec![], vec![ret(member(ident("arguments"), "length"))]),
        expr(call(ident("f"), vec![num(1.0), num(2.0), num(3.0)])),
    ]);
    assert_eq!(result, JsValue::Number(3.0));
}

#[test]
fn test_return_unwinds_nested_loops() {
    // function f() {
    //   for (let i = 0; i < 10; i++) { while (true) { if (i === 3) return i; break; } }
    //   return -1
    // }
    // f()
    let result = eval(vec![
        func_decl(
            "f",
            vec![],
            vec![
                for_let(
                    "i",
                    num(0.0),
                    lt(ident("i"), num(10.0)),
                    increment(ident("i"), false),
                    vec![while_(
                        boolean(true),
                        vec![
                            if_(strict_eq(ident("i"), num(3.0)), ret(ident("i")), None),
                            brk(),
                        ],
                    )],
                ),
                ret(num(-1.0)),
            ],
        ),
        expr(call(ident("f"), vec![])),
    ]);
    assert_eq!(result, JsValue::Number(3.0));
}

#[test]
fn test_return_runs_finally() {
    // let x = 0; function f() { try { return 1 } finally { x = 2 } } [f(), x]
    let result = eval_json(vec![
        let_("x", num(0.0)),
        func_decl(
            "f",
            vec![],
            vec![try_finally(vec![ret(num(1.0))], vec![expr(assign("x", num(2.0)))])],
        ),
        expr(array(vec![call(ident("f"), vec![]), ident("x")])),
    ]);
    assert_eq!(result, json!([1, 2]));
}

#[test]
fn test_break_cannot_cross_function_boundary() {
    // while (true) { (function () { break })() }
    let body = vec![while_(
        boolean(true),
        vec![expr(call(func_expr(vec![], vec![brk()]), vec![]))],
    )];
    assert_eq!(error_kind(body), Some(ErrorKind::Syntax));
}

#[test]
fn test_constructor_and_instanceof() {
    // function P(x) { this.x = x } const p = new P(4); [p.x, p instanceof P, p instanceof Array]
    let result = eval_json(vec![
        func_decl("P", params(&["x"]), vec![expr(assign_member(this(), "x", ident("x")))]),
        const_("p", new(ident("P"), vec![num(4.0)])),
        expr(array(vec![
            member(ident("p"), "x"),
            bin(BinaryOp::Instanceof, ident("p"), ident("P")),
            bin(BinaryOp::Instanceof, ident("p"), ident("Array")),
        ])),
    ]);
    assert_eq!(result, json!([4, true, false]));
}

#[test]
fn test_prototype_methods_are_shared() {
    // function P() {} P.prototype.hello = function () { return "hi" }; new P().hello()
    let result = eval(vec![
        func_decl("P", vec![], vec![]),
        expr(assign_member(
            member(ident("P"), "prototype"),
            "hello",
            func_expr(vec![], vec![ret(string("hi"))]),
        )),
        expr(method(new(ident("P"), vec![]), "hello", vec![])),
    ]);
    assert_eq!(result, JsValue::from("hi"));
}

#[test]
fn test_arrows_are_not_constructors() {
    // new (() => 1)()
    assert_eq!(
        error_kind(vec![expr(new(arrow(vec![], num(1.0)), vec![]))]),
        Some(ErrorKind::Type)
    );
}

#[test]
fn test_calling_non_function() {
    assert!(super::throws_error(
        vec![const_("o", object(vec![])), expr(method(ident("o"), "nope", vec![]))],
        ErrorKind::Type,
        "o.nope is not a function"
    ));
}

#[test]
fn test_function_to_string() {
    // function add(a, b) { return a + b } add.toString()
    let result = eval(vec![
        func_decl("add", params(&["a", "b"]), vec![ret(add(ident("a"), ident("b")))]),
        expr(method(ident("add"), "toString", vec![])),
    ]);
    assert!(
        result
            .as_str()
            .is_some_and(|text| text.starts_with("function add(a, b)"))
    );
}
