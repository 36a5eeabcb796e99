//! Conversion between script values and host-native values.
//!
//! Hosts exchange data with scripts as [`serde_json::Value`]. Conversion
//! out of the engine never runs script code: accessors are skipped rather
//! than invoked.
//!
//! # Example
//!
//! ```
//! use jseval::{Runtime, api};
//! use serde_json::json;
//!
//! let runtime = Runtime::new();
//! let value = api::from_json(&runtime, &json!({"name": "Alice", "tags": [1, 2]}));
//! assert_eq!(api::to_json(&value).unwrap(), json!({"name": "Alice", "tags": [1, 2]}));
//! ```

use std::rc::Rc;

use crate::Runtime;
use crate::error::JsError;
use crate::interpreter::Realm;
use crate::prelude::FxHashSet;
use crate::value::{
    HostObject, JsObject, JsObjectRef, JsString, JsValue, ObjectKind, PropertyKey, PropertyValue,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Engine → host
// ═══════════════════════════════════════════════════════════════════════════════

/// Convert a value to JSON.
///
/// Non-finite numbers become `null`; `undefined`, functions and symbols are
/// dropped from objects and become `null` inside arrays; a cycle is a
/// TypeError.
pub fn to_json(value: &JsValue) -> Result<serde_json::Value, JsError> {
    let mut visited = FxHashSet::default();
    to_json_with_visited(value, &mut visited)
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        serde_json::Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Values JSON has no representation for
fn is_unrepresentable(value: &JsValue) -> bool {
    matches!(value, JsValue::Undefined | JsValue::Symbol(_)) || value.is_callable()
}

fn to_json_with_visited(
    value: &JsValue,
    visited: &mut FxHashSet<usize>,
) -> Result<serde_json::Value, JsError> {
    let obj = match value {
        JsValue::Undefined | JsValue::Null | JsValue::Symbol(_) => {
            return Ok(serde_json::Value::Null);
        }
        JsValue::Boolean(b) => return Ok(serde_json::Value::Bool(*b)),
        JsValue::Number(n) => return Ok(number_to_json(*n)),
        JsValue::String(s) => return Ok(serde_json::Value::String(s.to_string())),
        JsValue::Object(obj) => obj,
    };

    let id = Rc::as_ptr(obj) as usize;
    if !visited.insert(id) {
        return Err(JsError::type_error("Converting circular structure to JSON"));
    }
    let result = object_to_json(obj, visited);
    visited.remove(&id);
    result
}

fn object_to_json(
    obj: &JsObjectRef,
    visited: &mut FxHashSet<usize>,
) -> Result<serde_json::Value, JsError> {
    // collect first so no borrow is held across recursion
    let (elements, entries) = {
        let obj_ref = obj.borrow();
        match &obj_ref.kind {
            ObjectKind::Array { length } => {
                (Some(obj_ref.collect_elements(*length)?), Vec::new())
            }
            ObjectKind::Primitive(inner) => return to_json_with_visited(inner, visited),
            ObjectKind::Function(_) | ObjectKind::Task(_) => return Ok(serde_json::Value::Null),
            ObjectKind::Ordinary | ObjectKind::Host(_) => {
                let entries = obj_ref
                    .own_keys()
                    .into_iter()
                    .filter(|key| !key.is_symbol())
                    .filter_map(|key| {
                        let prop = obj_ref.get_own_property(&key)?;
                        match prop.value {
                            PropertyValue::Value(value) if prop.enumerable() => {
                                Some((key.to_string(), value))
                            }
                            _ => None,
                        }
                    })
                    .collect();
                (None, entries)
            }
        }
    };

    if let Some(elements) = elements {
        let items = elements
            .iter()
            .map(|element| to_json_with_visited(element, visited))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(serde_json::Value::Array(items));
    }

    let mut map = serde_json::Map::new();
    for (key, value) in entries {
        if is_unrepresentable(&value) {
            continue;
        }
        map.insert(key, to_json_with_visited(&value, visited)?);
    }
    Ok(serde_json::Value::Object(map))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Host → engine
// ═══════════════════════════════════════════════════════════════════════════════

/// Build a script value from JSON in the runtime's current realm
pub fn from_json(runtime: &Runtime, json: &serde_json::Value) -> JsValue {
    json_to_value(&runtime.realm(), json)
}

/// Expose a host value to scripts. Property reads and writes go through
/// the [`HostObject`] capability first.
pub fn host_object(runtime: &Runtime, host: Rc<dyn HostObject>) -> JsValue {
    let prototype = runtime.realm().object_prototype.clone();
    JsValue::Object(JsObject::with_prototype(Some(prototype), ObjectKind::Host(host)).into_ref())
}

pub(crate) fn json_to_value(realm: &Realm, json: &serde_json::Value) -> JsValue {
    match json {
        serde_json::Value::Null => JsValue::Null,
        serde_json::Value::Bool(b) => JsValue::Boolean(*b),
        serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => JsValue::String(JsString::from(s.as_str())),
        serde_json::Value::Array(items) => {
            let elements = items.iter().map(|item| json_to_value(realm, item)).collect();
            JsValue::Object(realm.create_array(elements))
        }
        serde_json::Value::Object(map) => {
            let obj = realm.create_object();
            for (key, value) in map {
                let value = json_to_value(realm, value);
                obj.borrow_mut()
                    .write_own_slot(PropertyKey::from(key.as_str()), value);
            }
            JsValue::Object(obj)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Inspection
// ═══════════════════════════════════════════════════════════════════════════════

/// Own or inherited data property; accessors read as `undefined`
pub fn get_property(obj: &JsValue, key: &str) -> Result<JsValue, JsError> {
    let object = obj
        .as_object()
        .ok_or_else(|| JsError::type_error("Cannot get property of non-object"))?;
    Ok(crate::value::lookup_property(object, &PropertyKey::from(key))
        .map(|prop| prop.slot())
        .unwrap_or(JsValue::Undefined))
}

/// Outcome of a task returned by an async function.
///
/// `None` while the unit is still running, or when `value` is not a task.
pub fn task_result(value: &JsValue) -> Option<Result<JsValue, JsError>> {
    let object = value.as_object()?;
    let object = object.borrow();
    match &object.kind {
        ObjectKind::Task(handle) => handle.peek(),
        _ => None,
    }
}

/// Own enumerable string keys of an object
pub fn keys(obj: &JsValue) -> Vec<String> {
    let Some(object) = obj.as_object() else {
        return Vec::new();
    };
    let object = object.borrow();
    object
        .own_keys()
        .into_iter()
        .filter(|key| {
            !key.is_symbol()
                && object
                    .get_own_property(key)
                    .is_some_and(|prop| prop.enumerable())
        })
        .map(|key| key.to_string())
        .collect()
}
