//! Property access protocol: [[Get]], [[Set]], [[Delete]] and descriptors
//!
//! Storage lives on [`JsObject`](crate::value::JsObject); this module adds
//! the parts that need the scope: invoking accessors, honoring strict mode
//! and converting between descriptor objects and [`Property`].

use crate::error::JsError;
use crate::interpreter::Scope;
use crate::interpreter::coerce::to_number;
use crate::interpreter::function::call_function;
use crate::value::{
    CheapClone, JsObjectRef, JsValue, ObjectKind, Property, PropertyKey, PropertyValue,
    PrototypeWalk, lookup_property, valid_array_length,
};

/// [[Get]] on an object; getters run with `receiver` as `this`.
///
/// Absent keys read as `undefined`.
pub async fn get_property(
    scope: &Scope,
    obj: &JsObjectRef,
    key: &PropertyKey,
    receiver: &JsValue,
) -> Result<JsValue, JsError> {
    match lookup_property(obj, key) {
        None => Ok(JsValue::Undefined),
        Some(prop) => match prop.value {
            PropertyValue::Value(value) => Ok(value),
            PropertyValue::BackedField {
                getter: Some(getter),
                ..
            } => call_function(scope, getter, receiver.clone(), Vec::new()).await,
            PropertyValue::BackedField { getter: None, .. } => Ok(JsValue::Undefined),
        },
    }
}

/// Property read on an arbitrary value (member expressions).
///
/// Reading from `undefined` is a ReferenceError, from `null` a TypeError.
/// Primitives read through their wrapper prototype without allocating a
/// wrapper.
pub async fn get_value_property(
    scope: &Scope,
    base: &JsValue,
    key: &PropertyKey,
) -> Result<JsValue, JsError> {
    match base {
        JsValue::Undefined => Err(JsError::reference_error(format!(
            "Cannot read properties of undefined (reading '{}')",
            key
        ))),
        JsValue::Null => Err(JsError::type_error(format!(
            "Cannot read properties of null (reading '{}')",
            key
        ))),
        JsValue::Object(obj) => get_property(scope, obj, key, base).await,
        JsValue::String(s) if matches!(key, PropertyKey::Index(_)) || key.eq_str("length") => {
            Ok(match key {
                PropertyKey::Index(i) => s
                    .unit_at(*i as usize)
                    .map(JsValue::String)
                    .unwrap_or(JsValue::Undefined),
                _ => JsValue::Number(s.len() as f64),
            })
        }
        primitive => {
            let Some(prototype) = scope.realm().prototype_for_primitive(primitive).cloned() else {
                return Ok(JsValue::Undefined);
            };
            get_property(scope, &prototype, key, base).await
        }
    }
}

/// Outcome of looking for the slot a write should land in
enum WriteTarget {
    Setter(JsValue),
    /// Accessor without setter, or a non-writable data property
    Rejected(&'static str),
    /// Writable own or inherited data property, or no property at all
    Slot,
}

fn find_write_target(obj: &JsObjectRef, key: &PropertyKey) -> WriteTarget {
    match lookup_property(obj, key) {
        Some(Property {
            value: PropertyValue::BackedField { setter: Some(setter), .. },
            ..
        }) => WriteTarget::Setter(setter),
        Some(Property {
            value: PropertyValue::BackedField { setter: None, .. },
            ..
        }) => WriteTarget::Rejected("which has only a getter"),
        Some(prop) if !prop.writable() => WriteTarget::Rejected("which is read-only"),
        _ => WriteTarget::Slot,
    }
}

/// Apply the strict/non-strict write policy: TypeError or silent no-op
fn reject_write(scope: &Scope, message: String) -> Result<(), JsError> {
    if scope.is_strict() {
        Err(JsError::type_error(message))
    } else {
        Ok(())
    }
}

/// [[Set]] on an object; setters run with `receiver` as `this`.
///
/// Writes to getter-only or read-only properties and new keys on
/// non-extensible objects follow one policy: TypeError in strict scopes,
/// silent no-op otherwise.
pub async fn set_property(
    scope: &Scope,
    obj: &JsObjectRef,
    key: PropertyKey,
    value: JsValue,
    receiver: &JsValue,
) -> Result<(), JsError> {
    match find_write_target(obj, &key) {
        WriteTarget::Setter(setter) => {
            call_function(scope, setter, receiver.clone(), vec![value]).await?;
            Ok(())
        }
        WriteTarget::Rejected(reason) => {
            reject_write(scope, format!("Cannot assign to property '{}' {}", key, reason))
        }
        WriteTarget::Slot => {
            let value = if is_array_length(obj, &key) {
                coerce_array_length(scope, &value).await?
            } else {
                value
            };
            let mut target = obj.borrow_mut();
            if !target.extensible && !target.has_own_property(&key) {
                drop(target);
                return reject_write(
                    scope,
                    format!("Cannot add property {}, object is not extensible", key),
                );
            }
            target.write_own_slot(key, value);
            Ok(())
        }
    }
}

fn is_array_length(obj: &JsObjectRef, key: &PropertyKey) -> bool {
    key.eq_str("length") && obj.borrow().array_length().is_some()
}

/// ToNumber on a new array length; only exact uint32 values are accepted
async fn coerce_array_length(scope: &Scope, value: &JsValue) -> Result<JsValue, JsError> {
    let n = to_number(scope, value).await?;
    let length = valid_array_length(n).ok_or_else(|| JsError::range_error("Invalid array length"))?;
    Ok(JsValue::Number(length as f64))
}

/// Property write on an arbitrary value (assignment targets)
pub async fn set_value_property(
    scope: &Scope,
    base: &JsValue,
    key: PropertyKey,
    value: JsValue,
) -> Result<(), JsError> {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
            "Cannot set properties of {:?} (setting '{}')",
            base, key
        ))),
        JsValue::Object(obj) => set_property(scope, obj, key, value, base).await,
        primitive => {
            let prototype = scope.realm().prototype_for_primitive(primitive).cloned();
            if let Some(prototype) = prototype {
                if let WriteTarget::Setter(setter) = find_write_target(&prototype, &key) {
                    call_function(scope, setter, base.clone(), vec![value]).await?;
                    return Ok(());
                }
            }
            reject_write(
                scope,
                format!("Cannot create property '{}' on {}", key, primitive.type_of()),
            )
        }
    }
}

/// [[Delete]]; a non-configurable property is kept, and strict scopes
/// report that as a TypeError
pub fn delete_property(scope: &Scope, obj: &JsObjectRef, key: &PropertyKey) -> Result<bool, JsError> {
    let deleted = obj.borrow_mut().delete_property(key, false);
    if !deleted && scope.is_strict() {
        return Err(JsError::type_error(format!("Cannot delete property '{}'", key)));
    }
    Ok(deleted)
}

/// `in` operator: own or inherited
pub fn has_property(obj: &JsObjectRef, key: &PropertyKey) -> bool {
    PrototypeWalk::new(obj.cheap_clone()).any(|o| o.borrow().has_own_property(key))
}

/// Own and enumerable. Intrinsic slots without an explicit descriptor count
/// as enumerable.
pub fn property_is_enumerable(obj: &JsObjectRef, key: &PropertyKey) -> bool {
    obj.borrow()
        .get_own_property(key)
        .is_some_and(|prop| prop.enumerable())
}

/// Enumerable string keys for `for-in`: own first, then each prototype,
/// skipping keys already seen (shadowed keys included)
pub fn enumerable_keys(obj: &JsObjectRef) -> Vec<PropertyKey> {
    let mut seen = crate::prelude::index_set_new::<PropertyKey>();
    let mut keys = Vec::new();
    for current in PrototypeWalk::new(obj.cheap_clone()) {
        let current = current.borrow();
        for key in current.own_keys() {
            if key.is_symbol() || !seen.insert(key.clone()) {
                continue;
            }
            let enumerable = current
                .get_own_property(&key)
                .is_some_and(|prop| prop.enumerable());
            if enumerable {
                keys.push(key);
            }
        }
    }
    keys
}

/// Own property as a descriptor object, or `null` when absent
pub fn own_property_descriptor(scope: &Scope, obj: &JsObjectRef, key: &PropertyKey) -> JsValue {
    let Some(prop) = obj.borrow().get_own_property(key) else {
        return JsValue::Null;
    };
    let desc = scope.realm().create_object();
    {
        let mut d = desc.borrow_mut();
        match &prop.value {
            PropertyValue::Value(value) => {
                d.write_own_slot(PropertyKey::from("value"), value.clone());
                d.write_own_slot(PropertyKey::from("writable"), JsValue::Boolean(prop.writable()));
            }
            PropertyValue::BackedField { getter, setter } => {
                d.write_own_slot(
                    PropertyKey::from("get"),
                    getter.clone().unwrap_or(JsValue::Undefined),
                );
                d.write_own_slot(
                    PropertyKey::from("set"),
                    setter.clone().unwrap_or(JsValue::Undefined),
                );
            }
        }
        d.write_own_slot(PropertyKey::from("enumerable"), JsValue::Boolean(prop.enumerable()));
        d.write_own_slot(
            PropertyKey::from("configurable"),
            JsValue::Boolean(prop.configurable()),
        );
    }
    JsValue::Object(desc)
}

/// Fields read from a descriptor object; absent fields stay `None`
#[derive(Debug, Default)]
pub struct DescriptorFields {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<JsValue>,
    pub set: Option<JsValue>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl DescriptorFields {
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// Build the property to store, keeping unspecified parts of `current`
    pub fn into_property(self, current: Option<&Property>) -> Property {
        let enumerable = self.enumerable.or(current.and_then(|c| c.enumerable));
        let configurable = self.configurable.or(current.and_then(|c| c.configurable));

        if self.is_accessor() {
            let (old_getter, old_setter) = match current.map(|c| &c.value) {
                Some(PropertyValue::BackedField { getter, setter }) => {
                    (getter.clone(), setter.clone())
                }
                _ => (None, None),
            };
            let pick = |new: Option<JsValue>, old: Option<JsValue>| match new {
                Some(JsValue::Undefined) => None,
                Some(f) => Some(f),
                None => old,
            };
            return Property {
                value: PropertyValue::BackedField {
                    getter: pick(self.get, old_getter),
                    setter: pick(self.set, old_setter),
                },
                writable: None,
                enumerable,
                configurable,
            };
        }

        let current_data = current.filter(|c| !c.is_accessor());
        let value = self
            .value
            .or_else(|| current_data.map(Property::slot))
            .unwrap_or(JsValue::Undefined);
        Property {
            value: PropertyValue::Value(value),
            writable: self.writable.or(current_data.and_then(|c| c.writable)),
            enumerable,
            configurable,
        }
    }
}

async fn read_field(
    scope: &Scope,
    obj: &JsObjectRef,
    desc: &JsValue,
    name: &str,
) -> Result<Option<JsValue>, JsError> {
    let key = PropertyKey::from(name);
    if !has_property(obj, &key) {
        return Ok(None);
    }
    get_property(scope, obj, &key, desc).await.map(Some)
}

/// ToPropertyDescriptor
pub async fn to_property_descriptor(
    scope: &Scope,
    desc: &JsValue,
) -> Result<DescriptorFields, JsError> {
    let JsValue::Object(obj) = desc else {
        return Err(JsError::type_error(format!(
            "Property description must be an object: {:?}",
            desc
        )));
    };

    let fields = DescriptorFields {
        enumerable: read_field(scope, obj, desc, "enumerable")
            .await?
            .map(|v| v.to_boolean()),
        configurable: read_field(scope, obj, desc, "configurable")
            .await?
            .map(|v| v.to_boolean()),
        value: read_field(scope, obj, desc, "value").await?,
        writable: read_field(scope, obj, desc, "writable")
            .await?
            .map(|v| v.to_boolean()),
        get: read_field(scope, obj, desc, "get").await?,
        set: read_field(scope, obj, desc, "set").await?,
    };

    for accessor in [&fields.get, &fields.set].into_iter().flatten() {
        if !accessor.is_callable() && !matches!(accessor, JsValue::Undefined) {
            return Err(JsError::type_error(format!(
                "Getter/setter must be a function: {:?}",
                accessor
            )));
        }
    }
    if fields.is_accessor() && (fields.value.is_some() || fields.writable.is_some()) {
        return Err(JsError::type_error(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }
    Ok(fields)
}

/// `Object.defineProperty` core: merge with the current descriptor and
/// store; a refused redefinition is a TypeError
pub fn define_own_property(
    obj: &JsObjectRef,
    key: PropertyKey,
    fields: DescriptorFields,
) -> Result<(), JsError> {
    let current = obj.borrow().get_own_property(&key);
    let prop = fields.into_property(current.as_ref());
    if obj.borrow_mut().define_property(key.clone(), prop) {
        Ok(())
    } else {
        Err(JsError::type_error(format!("Cannot redefine property: {}", key)))
    }
}

/// Prototype of an object as a script value
pub fn prototype_of(obj: &JsObjectRef) -> JsValue {
    match &obj.borrow().prototype {
        Some(proto) => JsValue::Object(proto.cheap_clone()),
        None => JsValue::Null,
    }
}

/// `[[Class]]`-style tag used by `Object.prototype.toString`
pub fn class_tag(value: &JsValue) -> String {
    let tag = match value {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
        JsValue::Symbol(_) => "Symbol",
        JsValue::Object(obj) => match &obj.borrow().kind {
            ObjectKind::Array { .. } => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Primitive(inner) => return class_tag(inner),
            ObjectKind::Host(host) => return format!("[object {}]", host.class_name()),
            ObjectKind::Ordinary | ObjectKind::Task(_) => "Object",
        },
    };
    format!("[object {}]", tag)
}
