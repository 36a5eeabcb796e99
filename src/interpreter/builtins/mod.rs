//! Intrinsic objects the operator and property protocol relies on
//!
//! Prototypes are populated once per realm by [`init_prototypes`]; the
//! global bindings that expose them are installed on a root scope by
//! [`install_globals`].

pub mod array;
pub mod function;
pub mod object;
pub mod primitive;

use futures::future::LocalBoxFuture;

use crate::error::JsError;
use crate::interpreter::function::{
    JsFunction, NativeFunction, async_native_function, create_function, native_function,
};
use crate::interpreter::{Realm, Scope, VariableKind};
use crate::value::{CheapClone, JsObjectRef, JsString, JsValue, Property, PropertyKey};

/// Signature of a synchronous builtin
pub type BuiltinFn = fn(&Scope, JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// Signature of a builtin that may call back into scripts
pub type AsyncBuiltinFn =
    fn(Scope, JsValue, Vec<JsValue>) -> LocalBoxFuture<'static, Result<JsValue, JsError>>;

/// Populate every intrinsic prototype of a fresh realm
pub fn init_prototypes(realm: &Realm) {
    object::init_object_prototype(realm);
    function::init_function_prototype(realm);
    array::init_array_prototype(realm);
    primitive::init_boolean_prototype(realm);
    primitive::init_number_prototype(realm);
    primitive::init_string_prototype(realm);
    primitive::init_symbol_prototype(realm);
}

/// Bind the global constructors and constants on a root scope
pub fn install_globals(scope: &Scope) {
    let realm = scope.realm().cheap_clone();

    for (name, value) in [
        ("undefined", JsValue::Undefined),
        ("NaN", JsValue::Number(f64::NAN)),
        ("Infinity", JsValue::Number(f64::INFINITY)),
    ] {
        scope.define(name, VariableKind::Const, value);
    }

    let constructors = [
        ("Object", object::create_object_constructor(&realm)),
        ("Function", function::create_function_constructor(&realm)),
        ("Array", array::create_array_constructor(&realm)),
        ("Boolean", primitive::create_boolean_constructor(&realm)),
        ("Number", primitive::create_number_constructor(&realm)),
        ("String", primitive::create_string_constructor(&realm)),
        ("Symbol", primitive::create_symbol_constructor(&realm)),
    ];
    for (name, constructor) in constructors {
        scope.define(name, VariableKind::Global, JsValue::Object(constructor));
    }
}

/// Install a synchronous method as a non-enumerable property
pub fn register_method(
    realm: &Realm,
    target: &JsObjectRef,
    name: &str,
    func: BuiltinFn,
    arity: usize,
) {
    let method = native_function(realm, name, arity, func);
    define_hidden(target, name, JsValue::Object(method));
}

/// Install a method that may call back into scripts
pub fn register_async_method(
    realm: &Realm,
    target: &JsObjectRef,
    name: &str,
    func: AsyncBuiltinFn,
    arity: usize,
) {
    let method = async_native_function(realm, name, arity, func);
    define_hidden(target, name, JsValue::Object(method));
}

/// Native function object that `new` may target
pub fn native_constructor(realm: &Realm, name: &str, func: BuiltinFn, arity: usize) -> JsObjectRef {
    create_function(
        realm,
        JsFunction::Native(NativeFunction {
            name: JsString::from(name),
            func: std::rc::Rc::new(func),
            arity,
            constructor: true,
        }),
    )
}

/// Link `constructor.prototype` and `prototype.constructor`
pub fn link_constructor(constructor: &JsObjectRef, prototype: &JsObjectRef) {
    constructor.borrow_mut().properties.insert(
        PropertyKey::from("prototype"),
        Property::with_attributes(JsValue::Object(prototype.cheap_clone()), false, false, false),
    );
    define_hidden(prototype, "constructor", JsValue::Object(constructor.cheap_clone()));
}

fn define_hidden(target: &JsObjectRef, name: &str, value: JsValue) {
    target
        .borrow_mut()
        .properties
        .insert(PropertyKey::from(name), Property::hidden(value));
}

/// Argument `index`, `undefined` when missing
pub fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}
