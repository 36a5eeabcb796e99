//! Function.prototype built-in methods (call, apply, bind, toString)

use futures::future::LocalBoxFuture;

use crate::error::JsError;
use crate::interpreter::builtins::{
    arg, link_constructor, register_async_method, register_method,
};
use crate::interpreter::function::{JsFunction, bind, call_function, function_of, native_function};
use crate::interpreter::{Realm, Scope};
use crate::value::{CheapClone, JsObjectRef, JsValue, ObjectKind};

/// Initialize Function.prototype with call, apply, bind methods
pub fn init_function_prototype(realm: &Realm) {
    let proto = realm.function_prototype.cheap_clone();

    register_async_method(realm, &proto, "call", function_call, 1);
    register_async_method(realm, &proto, "apply", function_apply, 2);
    register_method(realm, &proto, "bind", function_bind, 1);
    register_method(realm, &proto, "toString", function_to_string, 0);
}

/// Global `Function`: exposes Function.prototype for `instanceof`; source
/// text cannot be compiled from inside a script
pub fn create_function_constructor(realm: &Realm) -> JsObjectRef {
    let constructor = native_function(realm, "Function", 1, |_scope, _this, _args| {
        Err(JsError::type_error(
            "Function constructor is not supported: scripts cannot compile source text",
        ))
    });
    link_constructor(&constructor, &realm.function_prototype);
    constructor
}

/// `f.call(thisArg, ...args)`
fn function_call(
    scope: Scope,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let mut args = args.into_iter();
        let this_arg = args.next().unwrap_or(JsValue::Undefined);
        call_function(&scope, this, this_arg, args.collect()).await
    })
}

/// `f.apply(thisArg, argsArray)`
fn function_apply(
    scope: Scope,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, Result<JsValue, JsError>> {
    Box::pin(async move {
        let this_arg = arg(&args, 0);
        let call_args = match arg(&args, 1) {
            JsValue::Undefined | JsValue::Null => Vec::new(),
            JsValue::Object(obj) => {
                let obj = obj.borrow();
                match obj.kind {
                    ObjectKind::Array { length } => obj.collect_elements(length)?,
                    _ => {
                        return Err(JsError::type_error(
                            "Function.prototype.apply: arguments list must be an array",
                        ));
                    }
                }
            }
            _ => {
                return Err(JsError::type_error(
                    "CreateListFromArrayLike called on non-object",
                ));
            }
        };
        call_function(&scope, this, this_arg, call_args).await
    })
}

/// `f.bind(thisArg, ...args)`
fn function_bind(scope: &Scope, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let this_arg = arg(args, 0);
    let bound_args = args.get(1..).map(<[JsValue]>::to_vec).unwrap_or_default();
    bind(scope.realm(), &this, this_arg, bound_args).map(JsValue::Object)
}

fn function_to_string(_scope: &Scope, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let func = function_of(&this)
        .map_err(|_| JsError::type_error("Function.prototype.toString requires that 'this' be a Function"))?;
    let name = func.name().unwrap_or("").to_string();
    let text = match func {
        JsFunction::Interpreted(closure) if closure.def.arrow => {
            let params: Vec<&str> = closure.def.params.iter().map(|p| p.name.as_str()).collect();
            format!("({}) => {{ [code] }}", params.join(", "))
        }
        JsFunction::Interpreted(closure) => {
            let params: Vec<&str> = closure.def.params.iter().map(|p| p.name.as_str()).collect();
            let prefix = if closure.def.async_ { "async function" } else { "function" };
            format!("{} {}({}) {{ [code] }}", prefix, name, params.join(", "))
        }
        _ => format!("function {}() {{ [native code] }}", name),
    };
    Ok(JsValue::from(text))
}
