//! Callable and constructor protocol
//!
//! Every call runs against a fresh frame whose parent is the defining
//! scope of the callee, never the caller. The caller only contributes the
//! call depth and the suspension policy.

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use log::trace;

use crate::ast::{FunctionBody, FunctionDef};
use crate::error::JsError;
use crate::interpreter::completion::Completion;
use crate::interpreter::eval::evaluate;
use crate::interpreter::exec::{execute_statements, hoist_declarations};
use crate::interpreter::property::get_property;
use crate::interpreter::tasks::suspension_point;
use crate::interpreter::{Realm, Scope, VariableKind};
use crate::value::{
    CheapClone, JsObject, JsObjectRef, JsString, JsValue, ObjectKind, Property, PropertyKey,
    PrototypeWalk,
};

/// Synchronous native: cannot call back into scripts
pub type NativeFn = Rc<dyn Fn(&Scope, JsValue, &[JsValue]) -> Result<JsValue, JsError>>;

/// Future-returning native: may call back into scripts or wait on the host
pub type AsyncNativeFn =
    Rc<dyn Fn(Scope, JsValue, Vec<JsValue>) -> LocalBoxFuture<'static, Result<JsValue, JsError>>>;

/// Function representation
#[derive(Clone)]
pub enum JsFunction {
    /// Script function closing over its defining scope
    Interpreted(Closure),
    Native(NativeFunction),
    /// Native whose result may not be ready yet; calling it is a
    /// suspension point
    NativeAsync(AsyncNativeFunction),
    /// Bound function (created by Function.prototype.bind)
    Bound(Box<BoundFunctionData>),
}

#[derive(Clone)]
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub scope: Scope,
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub func: NativeFn,
    pub arity: usize,
    pub constructor: bool,
}

#[derive(Clone)]
pub struct AsyncNativeFunction {
    pub name: JsString,
    pub func: AsyncNativeFn,
    pub arity: usize,
}

/// Data for a bound function
#[derive(Debug, Clone)]
pub struct BoundFunctionData {
    /// The target function to call (never itself bound)
    pub target: JsObjectRef,
    /// The bound this value
    pub this_arg: JsValue,
    /// Pre-filled arguments
    pub bound_args: Vec<JsValue>,
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsFunction::Interpreted(c) => write!(
                f,
                "Interpreted({})",
                c.def.name.as_deref().unwrap_or("anonymous")
            ),
            JsFunction::Native(n) => write!(f, "Native({})", n.name),
            JsFunction::NativeAsync(n) => write!(f, "NativeAsync({})", n.name),
            JsFunction::Bound(b) => write!(f, "Bound({:?})", b.this_arg),
        }
    }
}

impl JsFunction {
    pub fn name(&self) -> Option<&str> {
        match self {
            JsFunction::Interpreted(c) => c.def.name.as_deref(),
            JsFunction::Native(n) => Some(n.name.as_str()),
            JsFunction::NativeAsync(n) => Some(n.name.as_str()),
            JsFunction::Bound(_) => Some("bound"),
        }
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            JsFunction::Interpreted(c) => !c.def.arrow && !c.def.async_,
            JsFunction::Native(n) => n.constructor,
            JsFunction::NativeAsync(_) => false,
            JsFunction::Bound(b) => b
                .target
                .borrow()
                .as_function()
                .is_some_and(JsFunction::is_constructor),
        }
    }

    /// Declared parameter count used for the `length` property
    pub fn arity(&self) -> usize {
        match self {
            JsFunction::Interpreted(c) => c
                .def
                .params
                .iter()
                .take_while(|p| !p.rest && p.default.is_none())
                .count(),
            JsFunction::Native(n) => n.arity,
            JsFunction::NativeAsync(n) => n.arity,
            JsFunction::Bound(b) => {
                let target = b
                    .target
                    .borrow()
                    .as_function()
                    .map(JsFunction::arity)
                    .unwrap_or(0);
                target.saturating_sub(b.bound_args.len())
            }
        }
    }
}

/// Clone the function stored in a callable value
pub fn function_of(value: &JsValue) -> Result<JsFunction, JsError> {
    if let JsValue::Object(obj) = value {
        if let Some(func) = obj.borrow().as_function() {
            return Ok(func.clone());
        }
    }
    Err(JsError::type_error(format!("{:?} is not a function", value)))
}

/// Reject malformed parameter lists at definition time
pub fn validate_params(def: &FunctionDef) -> Result<(), JsError> {
    let rest_count = def.params.iter().filter(|p| p.rest).count();
    if rest_count > 1 {
        return Err(JsError::syntax_error("Only one rest parameter is allowed"));
    }
    if let Some(pos) = def.params.iter().position(|p| p.rest) {
        if pos + 1 != def.params.len() {
            return Err(JsError::syntax_error(
                "Rest parameter must be last formal parameter",
            ));
        }
        if def.params.get(pos).is_some_and(|p| p.default.is_some()) {
            return Err(JsError::syntax_error(
                "Rest parameter may not have a default initializer",
            ));
        }
    }
    Ok(())
}

/// Wrap a function in an object linked to Function.prototype.
///
/// Constructible script functions also get a fresh `prototype` object.
pub fn create_function(realm: &Realm, func: JsFunction) -> JsObjectRef {
    let name = JsString::from(func.name().unwrap_or(""));
    let length = func.arity() as f64;
    let with_prototype = matches!(func, JsFunction::Interpreted(_)) && func.is_constructor();

    let mut obj = JsObject::with_prototype(
        Some(realm.function_prototype.cheap_clone()),
        ObjectKind::Function(func),
    );
    obj.properties.insert(
        PropertyKey::from("name"),
        Property::with_attributes(JsValue::String(name), false, false, true),
    );
    obj.properties.insert(
        PropertyKey::from("length"),
        Property::with_attributes(JsValue::Number(length), false, false, true),
    );
    if with_prototype {
        obj.properties.insert(
            PropertyKey::from("prototype"),
            Property::with_attributes(JsValue::Object(realm.create_object()), true, false, false),
        );
    }
    obj.into_ref()
}

/// Create a closure value for a definition evaluated in `scope`
pub fn make_closure(scope: &Scope, def: &Rc<FunctionDef>) -> Result<JsValue, JsError> {
    validate_params(def)?;
    let closure = Closure {
        def: def.cheap_clone(),
        scope: scope.cheap_clone(),
    };
    Ok(JsValue::Object(create_function(
        scope.realm(),
        JsFunction::Interpreted(closure),
    )))
}

/// Create a synchronous native function object
pub fn native_function<F>(realm: &Realm, name: &str, arity: usize, func: F) -> JsObjectRef
where
    F: Fn(&Scope, JsValue, &[JsValue]) -> Result<JsValue, JsError> + 'static,
{
    create_function(
        realm,
        JsFunction::Native(NativeFunction {
            name: JsString::from(name),
            func: Rc::new(func),
            arity,
            constructor: false,
        }),
    )
}

/// Create a future-returning native function object
pub fn async_native_function<F>(realm: &Realm, name: &str, arity: usize, func: F) -> JsObjectRef
where
    F: Fn(Scope, JsValue, Vec<JsValue>) -> LocalBoxFuture<'static, Result<JsValue, JsError>>
        + 'static,
{
    create_function(
        realm,
        JsFunction::NativeAsync(AsyncNativeFunction {
            name: JsString::from(name),
            func: Rc::new(func),
            arity,
        }),
    )
}

/// Call `callee` with an explicit `this`.
///
/// Never mutates the callee; `this` overrides only live in the transient
/// call frame.
pub fn call_function<'a>(
    scope: &'a Scope,
    callee: JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'a, Result<JsValue, JsError>> {
    Box::pin(async move {
        match function_of(&callee)? {
            JsFunction::Interpreted(closure) => invoke_closure(scope, &closure, this, args).await,
            JsFunction::Native(native) => (native.func)(scope, this, &args),
            JsFunction::NativeAsync(native) => {
                let pending = (native.func)(scope.cheap_clone(), this, args);
                suspension_point(scope, pending, native.name.as_str()).await
            }
            JsFunction::Bound(bound) => {
                let BoundFunctionData {
                    target,
                    this_arg,
                    mut bound_args,
                } = *bound;
                bound_args.extend(args);
                call_function(scope, JsValue::Object(target), this_arg, bound_args).await
            }
        }
    })
}

fn function_frame(
    caller: &Scope,
    closure: &Closure,
    this: JsValue,
    suspend_allowed: bool,
) -> Result<Scope, JsError> {
    let def = &closure.def;
    // arrows keep the `this` of their defining scope
    let this = (!def.arrow).then_some(this);
    let mut options = Scope::function_options(this, caller.depth() + 1);
    options.suspend_allowed = Some(suspend_allowed);
    if def.strict {
        options.strict = Some(true);
    }
    trace!(
        "call {} at depth {}",
        def.name.as_deref().unwrap_or("<anonymous>"),
        caller.depth() + 1
    );
    closure.scope.child(options)
}

async fn invoke_closure(
    caller: &Scope,
    closure: &Closure,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JsError> {
    if closure.def.async_ {
        return spawn_async_call(caller, closure, this, args);
    }
    let frame = function_frame(caller, closure, this, caller.is_suspend_allowed())?;
    run_body(frame, closure.def.cheap_clone(), args).await
}

/// Start an async function body as a detached unit and return its task.
///
/// The body always runs with suspension allowed; whoever awaits the task
/// is subject to its own scope's policy.
fn spawn_async_call(
    caller: &Scope,
    closure: &Closure,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JsError> {
    let frame = function_frame(caller, closure, this, true)?;
    let realm = frame.realm().cheap_clone();
    let def = closure.def.cheap_clone();
    let handle = realm
        .tasks
        .spawn(Box::pin(async move { run_body(frame, def, args).await }))?;
    Ok(JsValue::Object(realm.create_task(handle)))
}

async fn bind_params(frame: &Scope, def: &FunctionDef, args: Vec<JsValue>) -> Result<(), JsError> {
    if !def.arrow {
        let arguments = frame.realm().create_array(args.clone());
        frame.set(
            &JsString::from("arguments"),
            JsValue::Object(arguments),
            Some(VariableKind::Local),
        )?;
    }
    let mut remaining = args.into_iter();
    for param in &def.params {
        let value = if param.rest {
            JsValue::Object(frame.realm().create_array(remaining.by_ref().collect()))
        } else {
            match (remaining.next(), &param.default) {
                (Some(value), _) if !matches!(value, JsValue::Undefined) => value,
                (_, Some(default)) => evaluate(frame, default).await?,
                (value, None) => value.unwrap_or(JsValue::Undefined),
            }
        };
        frame.set(&JsString::from(param.name.as_str()), value, Some(VariableKind::Local))?;
    }
    Ok(())
}

async fn run_body(frame: Scope, def: Rc<FunctionDef>, args: Vec<JsValue>) -> Result<JsValue, JsError> {
    bind_params(&frame, &def, args).await?;
    match &def.body {
        FunctionBody::Expression(expr) => evaluate(&frame, expr).await,
        FunctionBody::Block(body) => {
            hoist_declarations(&frame, body)?;
            match execute_statements(&frame, body).await? {
                Completion::Return(value) => Ok(value),
                Completion::Normal(_) => Ok(JsValue::Undefined),
                Completion::Break | Completion::Continue => Err(JsError::syntax_error(
                    "Illegal break or continue statement in function body",
                )),
            }
        }
    }
}

/// `new callee(...args)`
pub async fn construct(
    scope: &Scope,
    callee: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JsError> {
    let func = function_of(callee)
        .map_err(|_| JsError::type_error(format!("{:?} is not a constructor", callee)))?;
    if !func.is_constructor() {
        return Err(JsError::type_error(format!("{:?} is not a constructor", callee)));
    }
    if let JsFunction::Bound(bound) = func {
        let BoundFunctionData {
            target,
            mut bound_args,
            ..
        } = *bound;
        bound_args.extend(args);
        return Box::pin(construct(scope, &JsValue::Object(target), bound_args)).await;
    }

    let JsValue::Object(ctor) = callee else {
        return Err(JsError::type_error("constructor is not an object"));
    };
    let prototype = match get_property(scope, ctor, &PropertyKey::from("prototype"), callee).await? {
        JsValue::Object(proto) => proto,
        _ => scope.realm().object_prototype.cheap_clone(),
    };
    let instance = JsObject::with_prototype(Some(prototype), ObjectKind::Ordinary).into_ref();
    let result = call_function(
        scope,
        callee.clone(),
        JsValue::Object(instance.cheap_clone()),
        args,
    )
    .await?;
    if result.is_object() {
        Ok(result)
    } else {
        Ok(JsValue::Object(instance))
    }
}

/// `value instanceof constructor`: walk the prototype chain of `value`
/// looking for `constructor.prototype`
pub async fn is_instance(
    scope: &Scope,
    constructor: &JsValue,
    value: &JsValue,
) -> Result<bool, JsError> {
    if let JsFunction::Bound(bound) = function_of(constructor)? {
        let target = JsValue::Object(bound.target);
        return Box::pin(is_instance(scope, &target, value)).await;
    }
    let JsValue::Object(ctor) = constructor else {
        return Ok(false);
    };
    let JsValue::Object(instance) = value else {
        return Ok(false);
    };
    let JsValue::Object(prototype) =
        get_property(scope, ctor, &PropertyKey::from("prototype"), constructor).await?
    else {
        return Err(JsError::type_error(
            "Function has non-object prototype in instanceof check",
        ));
    };
    Ok(PrototypeWalk::prototypes_of(instance).any(|p| Rc::ptr_eq(&p, &prototype)))
}

/// Function.prototype.bind.
///
/// Binding a bound function flattens onto the original target: argument
/// prefixes concatenate in bind order and the first bound `this` wins.
pub fn bind(
    realm: &Realm,
    target: &JsValue,
    this_arg: JsValue,
    args: Vec<JsValue>,
) -> Result<JsObjectRef, JsError> {
    let data = match function_of(target)? {
        JsFunction::Bound(inner) => {
            let BoundFunctionData {
                target,
                this_arg,
                mut bound_args,
            } = *inner;
            bound_args.extend(args);
            BoundFunctionData {
                target,
                this_arg,
                bound_args,
            }
        }
        _ => {
            let JsValue::Object(obj) = target else {
                return Err(JsError::type_error("Bind must be called on a function"));
            };
            BoundFunctionData {
                target: obj.cheap_clone(),
                this_arg,
                bound_args: args,
            }
        }
    };
    let target_name = data
        .target
        .borrow()
        .as_function()
        .and_then(|f| f.name().map(str::to_string))
        .unwrap_or_default();
    let bound = create_function(realm, JsFunction::Bound(Box::new(data)));
    bound.borrow_mut().properties.insert(
        PropertyKey::from("name"),
        Property::with_attributes(
            JsValue::from(format!("bound {}", target_name)),
            false,
            false,
            true,
        ),
    );
    Ok(bound)
}
