//! Object constructor and Object.prototype methods

use futures::future::LocalBoxFuture;

use crate::error::JsError;
use crate::interpreter::builtins::{
    arg, link_constructor, native_constructor, register_async_method, register_method,
};
use crate::interpreter::coerce::{to_object, to_property_key};
use crate::interpreter::property::{
    class_tag, define_own_property, get_property, own_property_descriptor, prototype_of,
    to_property_descriptor,
};
use crate::interpreter::{Realm, Scope};
use crate::value::{CheapClone, JsObject, JsObjectRef, JsValue, ObjectKind, PrototypeWalk};

/// Initialize Object.prototype
pub fn init_object_prototype(realm: &Realm) {
    let proto = realm.object_prototype.cheap_clone();

    register_async_method(realm, &proto, "hasOwnProperty", object_has_own_property, 1);
    register_async_method(
        realm,
        &proto,
        "propertyIsEnumerable",
        object_property_is_enumerable,
        1,
    );
    register_method(realm, &proto, "isPrototypeOf", object_is_prototype_of, 1);
    register_method(realm, &proto, "toString", object_to_string, 0);
    register_method(realm, &proto, "valueOf", object_value_of, 0);
}

/// Create the global Object constructor with its static methods
pub fn create_object_constructor(realm: &Realm) -> JsObjectRef {
    let constructor = native_constructor(realm, "Object", object_constructor_fn, 1);
    link_constructor(&constructor, &realm.object_prototype);

    register_async_method(
        realm,
        &constructor,
        "getOwnPropertyDescriptor",
        object_get_own_property_descriptor,
        2,
    );
    register_async_method(realm, &constructor, "defineProperty", object_define_property, 3);
    register_method(realm, &constructor, "preventExtensions", object_prevent_extensions, 1);
    register_method(realm, &constructor, "isExtensible", object_is_extensible, 1);
    register_method(realm, &constructor, "keys", object_keys, 1);
    register_method(realm, &constructor, "getPrototypeOf", object_get_prototype_of, 1);
    register_async_method(realm, &constructor, "create", object_create, 2);
    constructor
}

/// `Object(value)`: objects pass through, primitives are wrapped, nullish
/// values produce a fresh object
fn object_constructor_fn(scope: &Scope, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    match arg(args, 0) {
        JsValue::Undefined | JsValue::Null => Ok(JsValue::Object(scope.realm().create_object())),
        value => to_object(scope, &value).map(JsValue::Object),
    }
}

fn object_has_own_property(
    scope: Scope,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let key = to_property_key(&scope, &arg(&args, 0)).await?;
        let obj = to_object(&scope, &this)?;
        let has = obj.borrow().has_own_property(&key);
        Ok(JsValue::Boolean(has))
    })
}

fn object_property_is_enumerable(
    scope: Scope,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let key = to_property_key(&scope, &arg(&args, 0)).await?;
        let obj = to_object(&scope, &this)?;
        let enumerable = crate::interpreter::property::property_is_enumerable(&obj, &key);
        Ok(JsValue::Boolean(enumerable))
    })
}

fn object_is_prototype_of(scope: &Scope, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let JsValue::Object(value) = arg(args, 0) else {
        return Ok(JsValue::Boolean(false));
    };
    let proto = to_object(scope, &this)?;
    let found = PrototypeWalk::prototypes_of(&value).any(|p| std::rc::Rc::ptr_eq(&p, &proto));
    Ok(JsValue::Boolean(found))
}

fn object_to_string(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(class_tag(&this)))
}

fn object_value_of(scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    to_object(scope, &this).map(JsValue::Object)
}

fn object_get_own_property_descriptor(
    scope: Scope,
    _this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let obj = to_object(&scope, &arg(&args, 0))?;
        let key = to_property_key(&scope, &arg(&args, 1)).await?;
        Ok(own_property_descriptor(&scope, &obj, &key))
    })
}

fn object_define_property(
    scope: Scope,
    _this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let target = arg(&args, 0);
        let JsValue::Object(obj) = &target else {
            return Err(JsError::type_error("Object.defineProperty called on non-object"));
        };
        let key = to_property_key(&scope, &arg(&args, 1)).await?;
        let fields = to_property_descriptor(&scope, &arg(&args, 2)).await?;
        define_own_property(obj, key, fields)?;
        Ok(target)
    })
}

fn object_prevent_extensions(
    _scope: &Scope,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = arg(args, 0);
    if let JsValue::Object(obj) = &target {
        obj.borrow_mut().extensible = false;
    }
    Ok(target)
}

fn object_is_extensible(_scope: &Scope, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let extensible = match arg(args, 0) {
        JsValue::Object(obj) => obj.borrow().extensible,
        _ => false,
    };
    Ok(JsValue::Boolean(extensible))
}

fn object_keys(scope: &Scope, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = to_object(scope, &arg(args, 0))?;
    let keys: Vec<JsValue> = {
        let obj = obj.borrow();
        obj.own_keys()
            .into_iter()
            .filter(|key| {
                !key.is_symbol()
                    && obj
                        .get_own_property(key)
                        .is_some_and(|prop| prop.enumerable())
            })
            .map(|key| key.to_value())
            .collect()
    };
    Ok(JsValue::Object(scope.realm().create_array(keys)))
}

fn object_get_prototype_of(scope: &Scope, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = to_object(scope, &arg(args, 0))?;
    Ok(prototype_of(&obj))
}

/// `Object.create(proto, properties?)`
fn object_create(
    scope: Scope,
    _this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let prototype = match arg(&args, 0) {
            JsValue::Object(proto) => Some(proto),
            JsValue::Null => None,
            other => {
                return Err(JsError::type_error(format!(
                    "Object prototype may only be an Object or null: {:?}",
                    other
                )));
            }
        };
        let obj = JsObject::with_prototype(prototype, ObjectKind::Ordinary).into_ref();

        let properties = arg(&args, 1);
        if !matches!(properties, JsValue::Undefined) {
            let props = to_object(&scope, &properties)?;
            let keys: Vec<_> = {
                let props = props.borrow();
                props
                    .own_keys()
                    .into_iter()
                    .filter(|key| {
                        props
                            .get_own_property(key)
                            .is_some_and(|prop| prop.enumerable())
                    })
                    .collect()
            };
            let receiver = JsValue::Object(props.cheap_clone());
            for key in keys {
                let desc = get_property(&scope, &props, &key, &receiver).await?;
                let fields = to_property_descriptor(&scope, &desc).await?;
                define_own_property(&obj, key, fields)?;
            }
        }
        Ok(JsValue::Object(obj))
    })
}
