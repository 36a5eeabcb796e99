//! Type conversion tests

use super::build::*;
use super::{error_kind, eval, is_nan};
use jseval::ast::{BinaryOp, UnaryOp};
use jseval::{ErrorKind, JsValue};

fn to_number(value: jseval::ast::Expression) -> JsValue {
    eval(vec![expr(unary(UnaryOp::Plus, value))])
}

#[test]
fn test_to_number_of_primitives() {
    assert_eq!(to_number(boolean(true)), JsValue::Number(1.0));
    assert_eq!(to_number(boolean(false)), JsValue::Number(0.0));
    assert_eq!(to_number(null()), JsValue::Number(0.0));
    assert_eq!(to_number(string("  ")), JsValue::Number(0.0));
    assert_eq!(to_number(string(" 42 ")), JsValue::Number(42.0));
    assert_eq!(to_number(string("0x10")), JsValue::Number(16.0));
    assert!(is_nan(&to_number(undefined())));
    assert!(is_nan(&to_number(string("12px"))));
}

#[test]
fn test_to_string_of_primitives() {
    // String(null), String(undefined), String(1.5), String(true)
    let convert = |value| eval(vec![expr(call(ident("String"), vec![value]))]);
    assert_eq!(convert(null()), JsValue::from("null"));
    assert_eq!(convert(undefined()), JsValue::from("undefined"));
    assert_eq!(convert(num(1.5)), JsValue::from("1.5"));
    assert_eq!(convert(boolean(true)), JsValue::from("true"));
    assert_eq!(convert(num(-0.0)), JsValue::from("0"));
}

#[test]
fn test_to_primitive_number_hint_falls_back_to_to_string() {
    // ({ toString() { return "7" } }) * 2
    let operand = object_with(vec![method_prop("toString", vec![], vec![ret(string("7"))])]);
    assert_eq!(eval(vec![expr(mul(operand, num(2.0)))]), JsValue::Number(14.0));
}

#[test]
fn test_to_primitive_string_hint_prefers_to_string() {
    // String({ valueOf() { return 1 }, toString() { return "str" } })
    let operand = object_with(vec![
        method_prop("valueOf", vec![], vec![ret(num(1.0))]),
        method_prop("toString", vec![], vec![ret(string("str"))]),
    ]);
    assert_eq!(eval(vec![expr(call(ident("String"), vec![operand]))]), JsValue::from("str"));
}

#[test]
fn test_symbol_to_primitive_receives_hint() {
    // const o = {}; o[Symbol.toPrimitive] = function (hint) { return hint };
    // [o + "", String(o)]
    let body = vec![
        const_("o", object(vec![])),
        expr(assign_index(
            ident("o"),
            member(ident("Symbol"), "toPrimitive"),
            func_expr(params(&["hint"]), vec![ret(ident("hint"))]),
        )),
        expr(array(vec![
            add(ident("o"), string("")),
            call(ident("String"), vec![ident("o")]),
        ])),
    ];
    assert_eq!(
        super::eval_json(body),
        serde_json::json!(["default", "string"])
    );
}

#[test]
fn test_to_primitive_without_primitive_result() {
    // ({ valueOf() { return {} }, toString() { return {} } }) * 1
    let operand = object_with(vec![
        method_prop("valueOf", vec![], vec![ret(object(vec![]))]),
        method_prop("toString", vec![], vec![ret(object(vec![]))]),
    ]);
    assert_eq!(error_kind(vec![expr(mul(operand, num(1.0)))]), Some(ErrorKind::Type));
}

#[test]
fn test_default_object_and_array_strings() {
    assert_eq!(eval(vec![expr(add(object(vec![]), string("")))]), JsValue::from("[object Object]"));
    // [1, [2, 3], null] + ""
    let value = array(vec![num(1.0), array(vec![num(2.0), num(3.0)]), null()]);
    assert_eq!(eval(vec![expr(add(value, string("")))]), JsValue::from("1,2,3,"));
}

#[test]
fn test_symbol_refuses_implicit_conversion() {
    assert_eq!(
        error_kind(vec![expr(add(call(ident("Symbol"), vec![]), string("")))]),
        Some(ErrorKind::Type)
    );
    assert_eq!(
        error_kind(vec![expr(unary(UnaryOp::Plus, call(ident("Symbol"), vec![])))]),
        Some(ErrorKind::Type)
    );
}

#[test]
fn test_loose_equality() {
    let loose = |left, right| eval(vec![expr(bin(BinaryOp::Eq, left, right))]);
    assert_eq!(loose(null(), undefined()), JsValue::Boolean(true));
    assert_eq!(loose(null(), num(0.0)), JsValue::Boolean(false));
    assert_eq!(loose(string("1"), num(1.0)), JsValue::Boolean(true));
    assert_eq!(loose(boolean(true), string("1")), JsValue::Boolean(true));
    assert_eq!(loose(object(vec![]), object(vec![])), JsValue::Boolean(false));
}

#[test]
fn test_relational_comparison() {
    assert_eq!(eval(vec![expr(lt(num(1.0), string("2")))]), JsValue::Boolean(true));
    // string comparison is lexicographic
    assert_eq!(eval(vec![expr(lt(string("10"), string("9")))]), JsValue::Boolean(true));
    assert_eq!(eval(vec![expr(lt(undefined(), num(1.0)))]), JsValue::Boolean(false));
}

#[test]
fn test_truthiness() {
    let not = |value| eval(vec![expr(unary(UnaryOp::Not, value))]);
    assert_eq!(not(string("")), JsValue::Boolean(true));
    assert_eq!(not(string("0")), JsValue::Boolean(false));
    assert_eq!(not(ident("NaN")), JsValue::Boolean(true));
    assert_eq!(not(object(vec![])), JsValue::Boolean(false));
}

#[test]
fn test_number_to_string_radix() {
    // (255).toString(16), (255).toString(1)
    assert_eq!(
        eval(vec![expr(method(num(255.0), "toString", vec![num(16.0)]))]),
        JsValue::from("ff")
    );
    assert_eq!(
        error_kind(vec![expr(method(num(255.0), "toString", vec![num(1.0)]))]),
        Some(ErrorKind::Range)
    );
}
