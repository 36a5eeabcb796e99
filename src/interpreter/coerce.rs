//! Type coercion abstract operations and operator dispatch
//!
//! Every conversion that can reach an object may call user code
//! (`Symbol.toPrimitive`, `valueOf`, `toString`, getters), so those
//! operations are async and run through the normal call protocol.
//! Conversions of values already known to be primitive are synchronous.

use std::cmp::Ordering;

use crate::ast::BinaryOp;
use crate::error::JsError;
use crate::interpreter::Scope;
use crate::interpreter::function::{call_function, is_instance};
use crate::interpreter::property::{get_property, has_property};
use crate::prelude::math;
use crate::value::{
    CheapClone, JsObject, JsObjectRef, JsString, JsValue, ObjectKind, PropertyKey,
    number_to_string,
};

/// Hint passed to ToPrimitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

impl PreferredType {
    fn as_str(self) -> &'static str {
        match self {
            PreferredType::Default => "default",
            PreferredType::Number => "number",
            PreferredType::String => "string",
        }
    }
}

/// ToPrimitive
pub async fn to_primitive(
    scope: &Scope,
    value: &JsValue,
    hint: PreferredType,
) -> Result<JsValue, JsError> {
    let JsValue::Object(obj) = value else {
        return Ok(value.clone());
    };

    let exotic_key = PropertyKey::Symbol(scope.realm().symbol_to_primitive.clone());
    let exotic = get_property(scope, obj, &exotic_key, value).await?;
    if !exotic.is_null_or_undefined() {
        if !exotic.is_callable() {
            return Err(JsError::type_error("Symbol.toPrimitive is not a function"));
        }
        let result = call_function(
            scope,
            exotic,
            value.clone(),
            vec![JsValue::from(hint.as_str())],
        )
        .await?;
        if result.is_object() {
            return Err(JsError::type_error("Cannot convert object to primitive value"));
        }
        return Ok(result);
    }

    let order = match hint {
        PreferredType::String => ["toString", "valueOf"],
        PreferredType::Default | PreferredType::Number => ["valueOf", "toString"],
    };
    for name in order {
        let method = get_property(scope, obj, &PropertyKey::from(name), value).await?;
        if method.is_callable() {
            let result = call_function(scope, method, value.clone(), Vec::new()).await?;
            if !result.is_object() {
                return Ok(result);
            }
        }
    }
    Err(JsError::type_error("Cannot convert object to primitive value"))
}

/// ToNumber
pub async fn to_number(scope: &Scope, value: &JsValue) -> Result<f64, JsError> {
    if value.is_object() {
        let primitive = to_primitive(scope, value, PreferredType::Number).await?;
        return primitive_to_number(&primitive);
    }
    primitive_to_number(value)
}

/// ToString
pub async fn to_js_string(scope: &Scope, value: &JsValue) -> Result<JsString, JsError> {
    if value.is_object() {
        let primitive = to_primitive(scope, value, PreferredType::String).await?;
        return primitive_to_string(&primitive);
    }
    primitive_to_string(value)
}

/// ToPropertyKey
pub async fn to_property_key(scope: &Scope, value: &JsValue) -> Result<PropertyKey, JsError> {
    match value {
        JsValue::Object(_) => {
            let primitive = to_primitive(scope, value, PreferredType::String).await?;
            Ok(PropertyKey::from_primitive(&primitive))
        }
        _ => Ok(PropertyKey::from_primitive(value)),
    }
}

/// ToObject: wrap primitives, pass objects through
pub fn to_object(scope: &Scope, value: &JsValue) -> Result<JsObjectRef, JsError> {
    match value {
        JsValue::Object(obj) => Ok(obj.cheap_clone()),
        JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
            "Cannot convert {:?} to object",
            value
        ))),
        primitive => {
            let prototype = scope.realm().prototype_for_primitive(primitive).cloned();
            Ok(JsObject::with_prototype(prototype, ObjectKind::Primitive(primitive.clone())).into_ref())
        }
    }
}

/// ToNumber for a value that is already primitive
pub fn primitive_to_number(value: &JsValue) -> Result<f64, JsError> {
    Ok(match value {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(true) => 1.0,
        JsValue::Boolean(false) => 0.0,
        JsValue::Number(n) => *n,
        JsValue::String(s) => string_to_number(s.as_str()),
        JsValue::Symbol(_) => {
            return Err(JsError::type_error("Cannot convert a Symbol value to a number"));
        }
        JsValue::Object(_) => {
            return Err(JsError::internal_error("object passed as primitive"));
        }
    })
}

/// ToString for a value that is already primitive
pub fn primitive_to_string(value: &JsValue) -> Result<JsString, JsError> {
    Ok(match value {
        JsValue::Undefined => JsString::from("undefined"),
        JsValue::Null => JsString::from("null"),
        JsValue::Boolean(true) => JsString::from("true"),
        JsValue::Boolean(false) => JsString::from("false"),
        JsValue::Number(n) => JsString::from(number_to_string(*n)),
        JsValue::String(s) => s.cheap_clone(),
        JsValue::Symbol(_) => {
            return Err(JsError::type_error("Cannot convert a Symbol value to a string"));
        }
        JsValue::Object(_) => {
            return Err(JsError::internal_error("object passed as primitive"));
        }
    })
}

/// WhiteSpace and LineTerminator code points (NEL is not one of them)
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// StringToNumber: numeric literal grammar with surrounding whitespace.
///
/// Empty (or all-whitespace) input is 0; anything outside the grammar is
/// NaN.
pub fn string_to_number(input: &str) -> f64 {
    let s = input.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(s.get(2..).unwrap_or(""), radix);
    }

    if is_decimal_literal(s) {
        s.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut result = 0.0;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => result = result * radix as f64 + d as f64,
            None => return f64::NAN,
        }
    }
    result
}

/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let at = |i: usize| bytes.get(i).copied();

    if matches!(at(i), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while at(i).is_some_and(|b| b.is_ascii_digit()) {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if at(i) == Some(b'.') {
        i += 1;
        let frac_start = i;
        while at(i).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }
    if mantissa_digits == 0 {
        return false;
    }
    if matches!(at(i), Some(b'e') | Some(b'E')) {
        i += 1;
        if matches!(at(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while at(i).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Arithmetic
// ═══════════════════════════════════════════════════════════════════════════════

/// `+`: concatenation when either primitive is a string, else addition
pub async fn sum(scope: &Scope, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
    let lprim = to_primitive(scope, left, PreferredType::Default).await?;
    let rprim = to_primitive(scope, right, PreferredType::Default).await?;
    if lprim.is_string() || rprim.is_string() {
        let ls = primitive_to_string(&lprim)?;
        let rs = primitive_to_string(&rprim)?;
        return Ok(JsValue::String(ls + &rs));
    }
    Ok(JsValue::Number(
        primitive_to_number(&lprim)? + primitive_to_number(&rprim)?,
    ))
}

async fn numeric_operands(
    scope: &Scope,
    left: &JsValue,
    right: &JsValue,
) -> Result<(f64, f64), JsError> {
    let l = to_number(scope, left).await?;
    let r = to_number(scope, right).await?;
    Ok((l, r))
}

pub async fn sub(scope: &Scope, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
    let (l, r) = numeric_operands(scope, left, right).await?;
    Ok(JsValue::Number(l - r))
}

pub async fn mul(scope: &Scope, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
    let (l, r) = numeric_operands(scope, left, right).await?;
    Ok(JsValue::Number(l * r))
}

pub async fn div(scope: &Scope, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
    let (l, r) = numeric_operands(scope, left, right).await?;
    Ok(JsValue::Number(l / r))
}

pub async fn modulo(scope: &Scope, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
    let (l, r) = numeric_operands(scope, left, right).await?;
    Ok(JsValue::Number(math::remainder(l, r)))
}

pub async fn exponent(scope: &Scope, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
    let (l, r) = numeric_operands(scope, left, right).await?;
    Ok(JsValue::Number(math::pow(l, r)))
}

pub async fn neg(scope: &Scope, value: &JsValue) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(-to_number(scope, value).await?))
}

pub async fn pos(scope: &Scope, value: &JsValue) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(to_number(scope, value).await?))
}

pub async fn inc(scope: &Scope, value: &JsValue) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(to_number(scope, value).await? + 1.0))
}

pub async fn dec(scope: &Scope, value: &JsValue) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(to_number(scope, value).await? - 1.0))
}

pub async fn bit_not(scope: &Scope, value: &JsValue) -> Result<JsValue, JsError> {
    let n = to_number(scope, value).await?;
    Ok(JsValue::Number(!math::to_int32(n) as f64))
}

async fn bitwise(
    scope: &Scope,
    op: BinaryOp,
    left: &JsValue,
    right: &JsValue,
) -> Result<JsValue, JsError> {
    let (l, r) = numeric_operands(scope, left, right).await?;
    let shift = math::to_uint32(r) & 0x1f;
    let result = match op {
        BinaryOp::BitAnd => (math::to_int32(l) & math::to_int32(r)) as f64,
        BinaryOp::BitOr => (math::to_int32(l) | math::to_int32(r)) as f64,
        BinaryOp::BitXor => (math::to_int32(l) ^ math::to_int32(r)) as f64,
        BinaryOp::LShift => math::to_int32(l).wrapping_shl(shift) as f64,
        BinaryOp::RShift => math::to_int32(l).wrapping_shr(shift) as f64,
        BinaryOp::URShift => math::to_uint32(l).wrapping_shr(shift) as f64,
        _ => return Err(JsError::internal_error("not a bitwise operator")),
    };
    Ok(JsValue::Number(result))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Comparison
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether two primitives have an ordering relationship at all.
///
/// NaN is never comparable; a string and a number are compared only after
/// both have been converted to numbers.
pub fn is_comparable(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::String(_), JsValue::String(_)) => true,
        (JsValue::Number(l), JsValue::Number(r)) => !l.is_nan() && !r.is_nan(),
        _ => false,
    }
}

/// Order two comparable primitives.
///
/// Strings compare by UTF-16 code units. Must only be called after
/// [`is_comparable`] returned true.
pub fn compare(left: &JsValue, right: &JsValue) -> Result<Ordering, JsError> {
    match (left, right) {
        (JsValue::String(l), JsValue::String(r)) => {
            Ok(l.as_str().encode_utf16().cmp(r.as_str().encode_utf16()))
        }
        (JsValue::Number(l), JsValue::Number(r)) => l
            .partial_cmp(r)
            .ok_or_else(|| JsError::internal_error("compared NaN")),
        _ => Err(JsError::internal_error("compared incomparable values")),
    }
}

/// `<`, `<=`, `>`, `>=`
pub async fn relational(
    scope: &Scope,
    op: BinaryOp,
    left: &JsValue,
    right: &JsValue,
) -> Result<JsValue, JsError> {
    let lprim = to_primitive(scope, left, PreferredType::Number).await?;
    let rprim = to_primitive(scope, right, PreferredType::Number).await?;
    let (l, r) = if lprim.is_string() && rprim.is_string() {
        (lprim, rprim)
    } else {
        (
            JsValue::Number(primitive_to_number(&lprim)?),
            JsValue::Number(primitive_to_number(&rprim)?),
        )
    };
    if !is_comparable(&l, &r) {
        return Ok(JsValue::Boolean(false));
    }
    let ordering = compare(&l, &r)?;
    let result = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => return Err(JsError::internal_error("not a relational operator")),
    };
    Ok(JsValue::Boolean(result))
}

fn same_type(left: &JsValue, right: &JsValue) -> bool {
    std::mem::discriminant(left) == std::mem::discriminant(right)
}

/// Loose equality (`==`)
pub async fn loose_equals(scope: &Scope, left: &JsValue, right: &JsValue) -> Result<bool, JsError> {
    let mut x = left.clone();
    let mut y = right.clone();
    loop {
        if same_type(&x, &y) {
            return Ok(x.strict_equals(&y));
        }
        match (&x, &y) {
            (JsValue::Null | JsValue::Undefined, JsValue::Null | JsValue::Undefined) => {
                return Ok(true);
            }
            (JsValue::Null | JsValue::Undefined, _) | (_, JsValue::Null | JsValue::Undefined) => {
                return Ok(false);
            }
            (JsValue::Number(_), JsValue::String(s)) => {
                y = JsValue::Number(string_to_number(s.as_str()));
            }
            (JsValue::String(s), JsValue::Number(_)) => {
                x = JsValue::Number(string_to_number(s.as_str()));
            }
            (JsValue::Boolean(b), _) => x = JsValue::Number(if *b { 1.0 } else { 0.0 }),
            (_, JsValue::Boolean(b)) => y = JsValue::Number(if *b { 1.0 } else { 0.0 }),
            (JsValue::Number(_) | JsValue::String(_) | JsValue::Symbol(_), JsValue::Object(_)) => {
                y = to_primitive(scope, &y, PreferredType::Default).await?;
            }
            (JsValue::Object(_), JsValue::Number(_) | JsValue::String(_) | JsValue::Symbol(_)) => {
                x = to_primitive(scope, &x, PreferredType::Default).await?;
            }
            _ => return Ok(false),
        }
    }
}

/// Apply a binary operator to two evaluated operands
pub async fn binary_operator(
    scope: &Scope,
    op: BinaryOp,
    left: &JsValue,
    right: &JsValue,
) -> Result<JsValue, JsError> {
    match op {
        BinaryOp::Add => sum(scope, left, right).await,
        BinaryOp::Sub => sub(scope, left, right).await,
        BinaryOp::Mul => mul(scope, left, right).await,
        BinaryOp::Div => div(scope, left, right).await,
        BinaryOp::Mod => modulo(scope, left, right).await,
        BinaryOp::Exp => exponent(scope, left, right).await,

        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            relational(scope, op, left, right).await
        }

        BinaryOp::Eq => Ok(JsValue::Boolean(loose_equals(scope, left, right).await?)),
        BinaryOp::NotEq => Ok(JsValue::Boolean(!loose_equals(scope, left, right).await?)),
        BinaryOp::StrictEq => Ok(JsValue::Boolean(left.strict_equals(right))),
        BinaryOp::StrictNotEq => Ok(JsValue::Boolean(!left.strict_equals(right))),

        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LShift
        | BinaryOp::RShift
        | BinaryOp::URShift => bitwise(scope, op, left, right).await,

        BinaryOp::In => {
            let JsValue::Object(obj) = right else {
                return Err(JsError::type_error(format!(
                    "Cannot use 'in' operator to search for a key in {:?}",
                    right
                )));
            };
            let key = to_property_key(scope, left).await?;
            Ok(JsValue::Boolean(has_property(obj, &key)))
        }
        BinaryOp::Instanceof => {
            if !right.is_callable() {
                return Err(JsError::type_error(
                    "Right-hand side of 'instanceof' is not callable",
                ));
            }
            Ok(JsValue::Boolean(is_instance(scope, right, left).await?))
        }
    }
}
