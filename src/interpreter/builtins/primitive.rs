//! Wrapper prototypes for Boolean, Number, String and Symbol
//!
//! Each prototype carries `toString` and `valueOf`. The global functions
//! convert their argument and are not constructors; wrapper objects only
//! come from ToObject.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::JsError;
use crate::interpreter::builtins::{arg, link_constructor, register_async_method, register_method};
use crate::interpreter::coerce::{to_js_string, to_number};
use crate::interpreter::function::{async_native_function, native_function};
use crate::interpreter::{Realm, Scope};
use crate::prelude::math;
use crate::value::{
    CheapClone, JsObjectRef, JsString, JsSymbol, JsValue, ObjectKind, Property, PropertyKey,
    number_to_string,
};

/// Primitive carried by `this`, unwrapping wrapper objects
fn this_primitive(this: &JsValue) -> Option<JsValue> {
    match this {
        JsValue::Object(obj) => match &obj.borrow().kind {
            ObjectKind::Primitive(inner) => Some(inner.clone()),
            _ => None,
        },
        JsValue::Undefined | JsValue::Null => None,
        primitive => Some(primitive.clone()),
    }
}

fn incompatible_receiver(method: &str) -> JsError {
    JsError::type_error(format!("{} requires that 'this' be the matching primitive", method))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Boolean
// ═══════════════════════════════════════════════════════════════════════════════

pub fn init_boolean_prototype(realm: &Realm) {
    let proto = realm.boolean_prototype.cheap_clone();

    register_method(realm, &proto, "toString", boolean_to_string, 0);
    register_method(realm, &proto, "valueOf", boolean_value_of, 0);
}

/// `Boolean(value)` converts value to boolean
pub fn create_boolean_constructor(realm: &Realm) -> JsObjectRef {
    let constructor = native_function(realm, "Boolean", 1, |_scope, _this, args| {
        Ok(JsValue::Boolean(arg(args, 0).to_boolean()))
    });
    link_constructor(&constructor, &realm.boolean_prototype);
    constructor
}

fn this_boolean(this: &JsValue, method: &str) -> Result<bool, JsError> {
    match this_primitive(this) {
        Some(JsValue::Boolean(b)) => Ok(b),
        _ => Err(incompatible_receiver(method)),
    }
}

fn boolean_to_string(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let b = this_boolean(&this, "Boolean.prototype.toString")?;
    Ok(JsValue::from(if b { "true" } else { "false" }))
}

fn boolean_value_of(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    this_boolean(&this, "Boolean.prototype.valueOf").map(JsValue::Boolean)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Number
// ═══════════════════════════════════════════════════════════════════════════════

pub fn init_number_prototype(realm: &Realm) {
    let proto = realm.number_prototype.cheap_clone();

    register_async_method(realm, &proto, "toString", number_to_string_method, 1);
    register_method(realm, &proto, "valueOf", number_value_of, 0);
}

/// `Number(value)` converts value to a number; no argument gives `0`
pub fn create_number_constructor(realm: &Realm) -> JsObjectRef {
    let constructor = async_native_function(realm, "Number", 1, |scope, _this, args| {
        async move {
            if args.is_empty() {
                return Ok(JsValue::Number(0.0));
            }
            to_number(&scope, &arg(&args, 0)).await.map(JsValue::Number)
        }
        .boxed_local()
    });
    link_constructor(&constructor, &realm.number_prototype);
    constructor
}

fn this_number(this: &JsValue, method: &str) -> Result<f64, JsError> {
    match this_primitive(this) {
        Some(JsValue::Number(n)) => Ok(n),
        _ => Err(incompatible_receiver(method)),
    }
}

fn number_value_of(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    this_number(&this, "Number.prototype.valueOf").map(JsValue::Number)
}

/// `n.toString(radix)`
fn number_to_string_method(
    scope: Scope,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let n = this_number(&this, "Number.prototype.toString")?;
        let radix = match arg(&args, 0) {
            JsValue::Undefined => 10.0,
            radix => math::trunc(to_number(&scope, &radix).await?),
        };
        if !(2.0..=36.0).contains(&radix) {
            return Err(JsError::range_error(
                "toString() radix must be between 2 and 36",
            ));
        }
        let radix = radix as u32;
        if radix == 10 {
            return Ok(JsValue::from(number_to_string(n)));
        }
        Ok(JsValue::from(number_to_radix_string(n, radix)))
    })
}

/// Digits of `n` in a non-decimal radix, fraction cut after 52 digits
fn number_to_radix_string(n: f64, radix: u32) -> String {
    if !n.is_finite() || n == 0.0 {
        return number_to_string(n);
    }
    let base = radix as f64;
    let magnitude = n.abs();
    let mut int = math::trunc(magnitude);
    let mut frac = magnitude - int;

    let mut digits = Vec::new();
    while int >= 1.0 {
        let digit = libm::fmod(int, base) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        int = math::trunc(int / base);
    }
    if digits.is_empty() {
        digits.push('0');
    }

    let mut out = String::new();
    if n < 0.0 {
        out.push('-');
    }
    out.extend(digits.iter().rev());
    if frac > 0.0 {
        out.push('.');
        for _ in 0..52 {
            if frac <= 0.0 {
                break;
            }
            frac *= base;
            let digit = math::trunc(frac);
            frac -= digit;
            out.push(std::char::from_digit(digit as u32, radix).unwrap_or('0'));
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// String
// ═══════════════════════════════════════════════════════════════════════════════

pub fn init_string_prototype(realm: &Realm) {
    let proto = realm.string_prototype.cheap_clone();

    register_method(realm, &proto, "toString", string_value_of, 0);
    register_method(realm, &proto, "valueOf", string_value_of, 0);
}

/// `String(value)`; unlike ToString, symbols convert to their description
pub fn create_string_constructor(realm: &Realm) -> JsObjectRef {
    let constructor = async_native_function(realm, "String", 1, |scope, _this, args| {
        async move {
            match args.first() {
                None => Ok(JsValue::from("")),
                Some(JsValue::Symbol(sym)) => Ok(JsValue::from(sym.to_string())),
                Some(value) => to_js_string(&scope, value).await.map(JsValue::String),
            }
        }
        .boxed_local()
    });
    link_constructor(&constructor, &realm.string_prototype);
    constructor
}

fn string_value_of(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    match this_primitive(&this) {
        Some(JsValue::String(s)) => Ok(JsValue::String(s)),
        _ => Err(incompatible_receiver("String.prototype.valueOf")),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Symbol
// ═══════════════════════════════════════════════════════════════════════════════

pub fn init_symbol_prototype(realm: &Realm) {
    let proto = realm.symbol_prototype.cheap_clone();

    register_method(realm, &proto, "toString", symbol_to_string, 0);
    register_method(realm, &proto, "valueOf", symbol_value_of, 0);
}

/// `Symbol(description)` plus the well-known `Symbol.toPrimitive`
pub fn create_symbol_constructor(realm: &Realm) -> JsObjectRef {
    let constructor = async_native_function(realm, "Symbol", 0, |scope, _this, args| {
        async move {
            let description = match arg(&args, 0) {
                JsValue::Undefined => None,
                value => Some(to_js_string(&scope, &value).await?),
            };
            Ok(JsValue::Symbol(scope.realm().new_symbol(description)))
        }
        .boxed_local()
    });
    link_constructor(&constructor, &realm.symbol_prototype);
    constructor.borrow_mut().properties.insert(
        PropertyKey::from("toPrimitive"),
        Property::with_attributes(
            JsValue::Symbol(realm.symbol_to_primitive.clone()),
            false,
            false,
            false,
        ),
    );
    constructor
}

fn this_symbol(this: &JsValue, method: &str) -> Result<JsSymbol, JsError> {
    match this_primitive(this) {
        Some(JsValue::Symbol(sym)) => Ok(sym),
        _ => Err(incompatible_receiver(method)),
    }
}

fn symbol_to_string(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let sym = this_symbol(&this, "Symbol.prototype.toString")?;
    Ok(JsValue::String(JsString::from(sym.to_string())))
}

fn symbol_value_of(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    this_symbol(&this, "Symbol.prototype.valueOf").map(JsValue::Symbol)
}
