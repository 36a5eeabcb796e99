//! Basic expression tests

use super::build::*;
use super::{error_kind, eval, eval_json};
use jseval::ast::{BinaryOp, LogicalOp};
use jseval::{ErrorKind, JsValue};
use serde_json::json;

#[test]
fn test_string_number_concatenation() {
    // "1" + 2
    assert_eq!(eval(vec![expr(add(string("1"), num(2.0)))]), JsValue::from("12"));
    // 1 + "2"
    assert_eq!(eval(vec![expr(add(num(1.0), string("2")))]), JsValue::from("12"));
}

#[test]
fn test_value_of_drives_multiplication() {
    // ({ valueOf() { return 5 } }) * 2
    let operand = object_with(vec![method_prop("valueOf", vec![], vec![ret(num(5.0))])]);
    assert_eq!(eval(vec![expr(mul(operand, num(2.0)))]), JsValue::Number(10.0));
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval(vec![expr(bin(BinaryOp::Mod, num(7.0), num(3.0)))]), JsValue::Number(1.0));
    assert_eq!(eval(vec![expr(bin(BinaryOp::Exp, num(2.0), num(10.0)))]), JsValue::Number(1024.0));
    assert_eq!(eval(vec![expr(sub(num(1.0), num(3.0)))]), JsValue::Number(-2.0));
    assert_eq!(
        eval(vec![expr(bin(BinaryOp::Div, num(1.0), num(0.0)))]),
        JsValue::Number(f64::INFINITY)
    );
}

#[test]
fn test_bitwise() {
    // 5 & 3, -1 >>> 28, 1 << 4
    assert_eq!(eval(vec![expr(bin(BinaryOp::BitAnd, num(5.0), num(3.0)))]), JsValue::Number(1.0));
    assert_eq!(eval(vec![expr(bin(BinaryOp::URShift, num(-1.0), num(28.0)))]), JsValue::Number(15.0));
    assert_eq!(eval(vec![expr(bin(BinaryOp::LShift, num(1.0), num(4.0)))]), JsValue::Number(16.0));
}

#[test]
fn test_typeof() {
    assert_eq!(eval(vec![expr(type_of(ident("notDeclared")))]), JsValue::from("undefined"));
    assert_eq!(eval(vec![expr(type_of(null()))]), JsValue::from("object"));
    assert_eq!(eval(vec![expr(type_of(func_expr(vec![], vec![])))]), JsValue::from("function"));
    assert_eq!(eval(vec![expr(type_of(string("s")))]), JsValue::from("string"));
}

#[test]
fn test_nan_is_not_strictly_equal_to_itself() {
    assert_eq!(eval(vec![expr(strict_eq(ident("NaN"), ident("NaN")))]), JsValue::Boolean(false));
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(eval(vec![expr(logical(LogicalOp::Or, num(0.0), num(5.0)))]), JsValue::Number(5.0));
    assert_eq!(eval(vec![expr(logical(LogicalOp::And, num(0.0), num(5.0)))]), JsValue::Number(0.0));
    assert_eq!(
        eval(vec![expr(logical(LogicalOp::NullishCoalescing, null(), string("d")))]),
        JsValue::from("d")
    );
    assert_eq!(
        eval(vec![expr(logical(LogicalOp::NullishCoalescing, num(0.0), string("d")))]),
        JsValue::Number(0.0)
    );
}

#[test]
fn test_logical_short_circuit_skips_right_side() {
    // let hit = false; true || (hit = true); hit
    let result = eval(vec![
        let_("hit", boolean(false)),
        expr(logical(LogicalOp::Or, boolean(true), assign("hit", boolean(true)))),
        expr(ident("hit")),
    ]);
    assert_eq!(result, JsValue::Boolean(false));
}

#[test]
fn test_conditional_and_sequence() {
    assert_eq!(
        eval(vec![expr(conditional(num(0.0), string("yes"), string("no")))]),
        JsValue::from("no")
    );
    assert_eq!(eval(vec![expr(sequence(vec![num(1.0), num(2.0), num(3.0)]))]), JsValue::Number(3.0));
}

#[test]
fn test_completion_value_skips_declarations() {
    // let x = 1; x + 1; var y = 5;
    let result = eval(vec![
        let_("x", num(1.0)),
        expr(add(ident("x"), num(1.0))),
        var("y", num(5.0)),
    ]);
    assert_eq!(result, JsValue::Number(2.0));
    assert_eq!(eval(vec![var("z", num(1.0))]), JsValue::Undefined);
}

#[test]
fn test_update_expressions() {
    // let i = 1; i++
    assert_eq!(
        eval(vec![let_("i", num(1.0)), expr(increment(ident("i"), false))]),
        JsValue::Number(1.0)
    );
    // let i = 1; ++i
    assert_eq!(
        eval(vec![let_("i", num(1.0)), expr(increment(ident("i"), true))]),
        JsValue::Number(2.0)
    );
    // let s = "4"; s++; s
    assert_eq!(
        eval(vec![
            let_("s", string("4")),
            expr(increment(ident("s"), false)),
            expr(ident("s")),
        ]),
        JsValue::Number(5.0)
    );
}

#[test]
fn test_compound_assignment() {
    // let x = 5; x += 2; x
    assert_eq!(
        eval(vec![let_("x", num(5.0)), expr(add_assign("x", num(2.0))), expr(ident("x"))]),
        JsValue::Number(7.0)
    );
    // let s = "a"; s += 1
    assert_eq!(
        eval(vec![let_("s", string("a")), expr(add_assign("s", num(1.0)))]),
        JsValue::from("a1")
    );
}

#[test]
fn test_optional_member_on_nullish() {
    // let o = null; o?.a
    assert_eq!(
        eval(vec![let_("o", null()), expr(optional_member(ident("o"), "a"))]),
        JsValue::Undefined
    );
    // ({ a: 1 })?.a
    assert_eq!(
        eval(vec![expr(optional_member(object(vec![("a", num(1.0))]), "a"))]),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_property_read_on_nullish() {
    assert_eq!(error_kind(vec![expr(member(undefined(), "x"))]), Some(ErrorKind::Reference));
    assert_eq!(error_kind(vec![expr(member(null(), "x"))]), Some(ErrorKind::Type));
}

#[test]
fn test_array_and_object_literals() {
    // [1, "two", [true, null]]
    let value = array(vec![num(1.0), string("two"), array(vec![boolean(true), null()])]);
    assert_eq!(eval_json(vec![expr(value)]), json!([1, "two", [true, null]]));

    // ({ a: 1, [ "b" + "c" ]: 2 })
    let value = object_with(vec![
        prop("a", num(1.0)),
        computed_prop(add(string("b"), string("c")), num(2.0)),
    ]);
    assert_eq!(eval_json(vec![expr(value)]), json!({"a": 1, "bc": 2}));
}

#[test]
fn test_spread_into_array_and_call() {
    // function f(a, b, c) { return a + b + c } f(...[1, 2, 3])
    let result = eval(vec![
        func_decl(
            "f",
            params(&["a", "b", "c"]),
            vec![ret(add(add(ident("a"), ident("b")), ident("c")))],
        ),
        expr(call_spread(ident("f"), array(vec![num(1.0), num(2.0), num(3.0)]))),
    ]);
    assert_eq!(result, JsValue::Number(6.0));
}

#[test]
fn test_string_length_and_index() {
    assert_eq!(eval(vec![expr(member(string("abc"), "length"))]), JsValue::Number(3.0));
    assert_eq!(eval(vec![expr(index(string("abc"), num(1.0)))]), JsValue::from("b"));
    assert_eq!(eval(vec![expr(index(string("abc"), num(7.0)))]), JsValue::Undefined);
}
