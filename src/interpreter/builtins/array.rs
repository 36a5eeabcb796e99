//! Array constructor and the Array.prototype methods used by coercion

use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::JsError;
use crate::interpreter::builtins::{
    arg, link_constructor, native_constructor, register_async_method, register_method,
};
use crate::interpreter::coerce::{to_js_string, to_number, to_object};
use crate::interpreter::property::get_property;
use crate::interpreter::{Realm, Scope};
use crate::value::{CheapClone, JsObjectRef, JsString, JsValue, PropertyKey, valid_array_length};

/// Longest string `join` will build
const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

/// Initialize Array.prototype
pub fn init_array_prototype(realm: &Realm) {
    let proto = realm.array_prototype.cheap_clone();

    register_async_method(realm, &proto, "join", array_join, 1);
    register_async_method(realm, &proto, "toString", array_to_string, 0);
    register_method(realm, &proto, "push", array_push, 1);
}

pub fn create_array_constructor(realm: &Realm) -> JsObjectRef {
    let constructor = native_constructor(realm, "Array", array_constructor_fn, 1);
    link_constructor(&constructor, &realm.array_prototype);
    constructor
}

/// `Array(n)` creates `n` holes; any other argument list becomes the
/// elements
fn array_constructor_fn(scope: &Scope, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let array = match args {
        [JsValue::Number(n)] => {
            let length =
                valid_array_length(*n).ok_or_else(|| JsError::range_error("Invalid array length"))?;
            scope.realm().create_array_with_length(length)
        }
        _ => scope.realm().create_array(args.to_vec()),
    };
    Ok(JsValue::Object(array))
}

/// Removes the array from the realm's join set when the join finishes
struct JoinGuard {
    realm: Rc<Realm>,
    id: usize,
}

impl Drop for JoinGuard {
    fn drop(&mut self) {
        self.realm.join_stack.borrow_mut().remove(&self.id);
    }
}

/// `arr.join(separator)`: works on any array-like `this`. An array that
/// (directly or indirectly) contains itself joins as the empty string at
/// the point of recursion.
fn array_join(
    scope: Scope,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let obj = to_object(&scope, &this)?;
        let id = Rc::as_ptr(&obj) as usize;
        let realm = scope.realm().cheap_clone();
        if !realm.join_stack.borrow_mut().insert(id) {
            return Ok(JsValue::from(""));
        }
        let _guard = JoinGuard { realm, id };

        let separator = match arg(&args, 0) {
            JsValue::Undefined => JsString::from(","),
            sep => to_js_string(&scope, &sep).await?,
        };
        let receiver = JsValue::Object(obj.cheap_clone());
        let length = get_property(&scope, &obj, &PropertyKey::from("length"), &receiver).await?;
        let length = to_number(&scope, &length).await?;
        let length = if length.is_finite() && length > 0.0 {
            length as u32
        } else {
            0
        };

        let separators = (length as usize).saturating_sub(1);
        if separators.saturating_mul(separator.len()) > MAX_STRING_LENGTH {
            return Err(JsError::range_error("Invalid string length"));
        }

        let mut out = String::new();
        for i in 0..length {
            if i > 0 {
                out.push_str(separator.as_str());
            }
            let element = get_property(&scope, &obj, &PropertyKey::Index(i), &receiver).await?;
            if !element.is_null_or_undefined() {
                out.push_str(to_js_string(&scope, &element).await?.as_str());
            }
            if out.len() > MAX_STRING_LENGTH {
                return Err(JsError::range_error("Invalid string length"));
            }
        }
        Ok(JsValue::from(out))
    })
}

fn array_to_string(
    scope: Scope,
    this: JsValue,
    _args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    array_join(scope, this, Vec::new())
}

/// `arr.push(...items)`; returns the new length
fn array_push(_scope: &Scope, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let JsValue::Object(obj) = &this else {
        return Err(JsError::type_error("Array.prototype.push called on non-array"));
    };
    let mut obj = obj.borrow_mut();
    let Some(length) = obj.array_length() else {
        return Err(JsError::type_error("Array.prototype.push called on non-array"));
    };
    if !obj.extensible {
        return Err(JsError::type_error("Cannot add property, object is not extensible"));
    }
    let new_length = u32::try_from(args.len())
        .ok()
        .and_then(|count| length.checked_add(count))
        .filter(|new_length| *new_length < u32::MAX)
        .ok_or_else(|| JsError::range_error("Invalid array length"))?;
    for (i, value) in (length..).zip(args) {
        obj.write_own_slot(PropertyKey::Index(i), value.clone());
    }
    Ok(JsValue::Number(new_length as f64))
}
