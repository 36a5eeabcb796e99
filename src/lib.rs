//! Embeddable ECMAScript evaluation engine
//!
//! The engine executes finished program trees under a host-controlled
//! suspension policy. Source text reaches it through a pluggable
//! [`Parser`]; the default [`TreeParser`] reads JSON-encoded trees.
//!
//! # Example
//!
//! ```
//! use jseval::Runtime;
//! use serde_json::json;
//!
//! let runtime = Runtime::new();
//! // "1" + 2
//! let result = runtime
//!     .evaluate(
//!         r#"{"body": [{"Expression": {"Binary": {
//!             "operator": "Add",
//!             "left": {"Literal": {"String": "1"}},
//!             "right": {"Literal": {"Number": 2.0}}
//!         }}}]}"#,
//!     )
//!     .unwrap();
//! assert_eq!(result, json!("12"));
//! ```

pub mod api;
pub mod ast;
pub mod config;
pub mod error;
pub mod frontend;
pub mod interpreter;
pub mod prelude;
pub mod value;

pub use ast::Program;
pub use config::RuntimeConfig;
pub use error::{ErrorKind, JsError};
pub use frontend::{Parser, TreeParser};
pub use interpreter::{Realm, Scope, ScopeOptions, VariableKind};
pub use value::{CheapClone, HostObject, JsObjectRef, JsString, JsSymbol, JsValue};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::lock::Mutex;
use log::{debug, trace};

use interpreter::Completion;
use interpreter::builtins::install_globals;
use interpreter::exec::{execute_statements, hoist_declarations};
use interpreter::function::{
    AsyncNativeFn, AsyncNativeFunction, JsFunction, NativeFn, NativeFunction, call_function,
    create_function,
};
use interpreter::validate::validate_program;

/// A validated program ready to run on the runtime that compiled it.
///
/// Clones share one lock: at most one invocation of the same compiled unit
/// is in flight at a time.
#[derive(Clone)]
pub struct CompiledScript {
    program: Rc<Program>,
    name: Option<String>,
    lock: Rc<Mutex<()>>,
}

impl fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledScript")
            .field("name", &self.name)
            .field("statements", &self.program.body.len())
            .finish()
    }
}

impl CompiledScript {
    /// Module name; `None` for plain scripts
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}

/// Native installed by the host; reinstalled after every reset
#[derive(Clone)]
enum HostFunction {
    Sync(NativeFn),
    Async(AsyncNativeFn),
}

#[derive(Clone)]
struct HostBinding {
    name: String,
    arity: usize,
    func: HostFunction,
}

/// Realm and root frame; replaced wholesale on reset
struct RuntimeState {
    realm: Rc<Realm>,
    root: Scope,
}

/// An engine instance owned by the host.
///
/// Everything a script can observe lives here: the root scope, the
/// intrinsic objects and the detached units started by async functions.
/// [`Runtime::reset`] discards all of it.
pub struct Runtime {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    state: RefCell<RuntimeState>,
    hosts: RefCell<Vec<HostBinding>>,
    parser: Box<dyn Parser>,
    config: RuntimeConfig,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("pending", &self.state.borrow().realm.tasks.pending())
            .finish()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let state = RuntimeState::create(&spawner, &config);
        Self {
            pool: RefCell::new(pool),
            spawner,
            state: RefCell::new(state),
            hosts: RefCell::new(Vec::new()),
            parser: Box::new(TreeParser),
            config,
        }
    }

    /// Replace the front end used by [`Runtime::compile`]
    pub fn with_parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Intrinsics of the current state
    pub fn realm(&self) -> Rc<Realm> {
        self.state.borrow().realm.cheap_clone()
    }

    /// The root (global) frame
    pub fn global_scope(&self) -> Scope {
        self.state.borrow().root.cheap_clone()
    }

    /// Read a global binding
    pub fn get_global(&self, name: &str) -> Option<JsValue> {
        self.global_scope().lookup(name)
    }

    /// Names bound in the root frame, sorted
    pub fn global_names(&self) -> Vec<JsString> {
        self.global_scope().own_names()
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Compilation
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Parse and validate `source`.
    ///
    /// A `module_name` makes the script a module: it runs in its own
    /// isolated frame instead of the root frame.
    pub fn compile(&self, source: &str, module_name: Option<&str>) -> Result<CompiledScript, JsError> {
        let program = self.parser.parse(source, module_name)?;
        self.compile_program(program, module_name)
    }

    /// Validate a finished tree
    pub fn compile_program(
        &self,
        program: Program,
        module_name: Option<&str>,
    ) -> Result<CompiledScript, JsError> {
        validate_program(&program)?;
        debug!(
            "compiled {} ({} statements)",
            module_name.unwrap_or("<script>"),
            program.body.len()
        );
        Ok(CompiledScript {
            program: Rc::new(program),
            name: module_name.map(str::to_string),
            lock: Rc::new(Mutex::new(())),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Execution
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Compile, run and convert the result to a host value
    pub fn evaluate(&self, source: &str) -> Result<serde_json::Value, JsError> {
        let value = self.evaluate_value(source)?;
        api::to_json(&value)
    }

    /// Compile and run, returning the raw completion value
    pub fn evaluate_value(&self, source: &str) -> Result<JsValue, JsError> {
        let script = self.compile(source, None)?;
        self.invoke(&script)
    }

    /// Run a compiled script.
    ///
    /// With suspension allowed this drives the runtime's executor until the
    /// script finishes; otherwise it goes through [`Runtime::invoke_sync`].
    pub fn invoke(&self, script: &CompiledScript) -> Result<JsValue, JsError> {
        if !self.config.suspend_allowed {
            return self.invoke_sync(script);
        }
        trace!("invoking {}", script.name().unwrap_or("<script>"));
        let root = self.global_scope();
        let script = script.clone();
        self.drive(async move {
            let _running = script.lock.lock().await;
            run_program(&root, &script).await
        })
    }

    /// Run a compiled script to completion without ever suspending.
    ///
    /// Only available when the runtime forbids suspension. Fails with
    /// `SuspendNotAllowed` if the script tries to suspend or the same
    /// script is already running.
    pub fn invoke_sync(&self, script: &CompiledScript) -> Result<JsValue, JsError> {
        if self.config.suspend_allowed {
            return Err(JsError::type_error(
                "invoke_sync requires a runtime configured without suspension",
            ));
        }
        let Some(_running) = script.lock.try_lock() else {
            return Err(JsError::suspend_not_allowed(
                "script is already running; waiting for it would suspend",
            ));
        };
        let root = self.global_scope();
        match run_program(&root, script).now_or_never() {
            Some(result) => result,
            None => Err(JsError::suspend_not_allowed(
                "script did not complete synchronously",
            )),
        }
    }

    /// Start a compiled script as a detached unit and return its task.
    ///
    /// The unit runs until its first suspension before this returns and is
    /// advanced by [`Runtime::run_pending`] or any later `invoke`. While it
    /// is in flight, an `invoke` of the same script waits for it to finish.
    pub fn invoke_detached(&self, script: &CompiledScript) -> Result<JsValue, JsError> {
        if !self.config.suspend_allowed {
            return Err(JsError::type_error(
                "invoke_detached requires a runtime that allows suspension",
            ));
        }
        trace!("starting {} detached", script.name().unwrap_or("<script>"));
        let realm = self.realm();
        let root = self.global_scope();
        let script = script.clone();
        let handle = realm.tasks.spawn(Box::pin(async move {
            let _running = script.lock.lock().await;
            run_program(&root, &script).await
        }))?;
        Ok(JsValue::Object(realm.create_task(handle)))
    }

    /// Call a script function from the host
    pub fn call(&self, callee: &JsValue, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JsError> {
        let root = self.global_scope();
        let callee = callee.clone();
        let call = async move { call_function(&root, callee, this, args).await };
        if self.config.suspend_allowed {
            self.drive(call)
        } else {
            call.now_or_never().unwrap_or_else(|| {
                Err(JsError::suspend_not_allowed(
                    "call did not complete synchronously",
                ))
            })
        }
    }

    /// Run detached units until none can make progress
    pub fn run_pending(&self) -> Result<(), JsError> {
        let mut pool = self.pool.try_borrow_mut().map_err(|_| reentrant())?;
        pool.run_until_stalled();
        Ok(())
    }

    fn drive<F>(&self, future: F) -> Result<JsValue, JsError>
    where
        F: std::future::Future<Output = Result<JsValue, JsError>>,
    {
        let mut pool = self.pool.try_borrow_mut().map_err(|_| reentrant())?;
        pool.run_until(future)
    }

    /// Cancel every detached unit and discard all scope state.
    ///
    /// Host functions registered before the reset are installed again.
    pub fn reset(&self) {
        let old = {
            let mut state = self.state.borrow_mut();
            let fresh = RuntimeState::create(&self.spawner, &self.config);
            std::mem::replace(&mut *state, fresh)
        };
        let cancelled = old.realm.tasks.cancel_all();
        // let aborted units observe the cancellation; skipped when reset is
        // called from inside a running script
        if let Ok(mut pool) = self.pool.try_borrow_mut() {
            pool.run_until_stalled();
        }
        old.root.clear();

        let root = self.global_scope();
        for host in self.hosts.borrow().iter() {
            install_host(&root, host);
        }
        debug!("runtime reset: {} pending units cancelled", cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Host functions
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Install a synchronous host function as a global constant
    pub fn register_function<F>(&self, name: &str, arity: usize, func: F)
    where
        F: Fn(&Scope, JsValue, &[JsValue]) -> Result<JsValue, JsError> + 'static,
    {
        self.register(HostBinding {
            name: name.to_string(),
            arity,
            func: HostFunction::Sync(Rc::new(func)),
        });
    }

    /// Install a future-returning host function as a global constant.
    ///
    /// Calling it is a suspension point: in a scope that forbids
    /// suspension, a call whose future is not immediately ready fails with
    /// `SuspendNotAllowed`.
    pub fn register_async_function<F>(&self, name: &str, arity: usize, func: F)
    where
        F: Fn(Scope, JsValue, Vec<JsValue>) -> LocalBoxFuture<'static, Result<JsValue, JsError>>
            + 'static,
    {
        self.register(HostBinding {
            name: name.to_string(),
            arity,
            func: HostFunction::Async(Rc::new(func)),
        });
    }

    fn register(&self, host: HostBinding) {
        install_host(&self.global_scope(), &host);
        let mut hosts = self.hosts.borrow_mut();
        hosts.retain(|existing| existing.name != host.name);
        hosts.push(host);
    }
}

impl RuntimeState {
    fn create(spawner: &LocalSpawner, config: &RuntimeConfig) -> Self {
        let realm = Rc::new(Realm::new(spawner.clone(), config));
        let root = Scope::root(realm.cheap_clone(), config.strict, config.suspend_allowed);
        install_globals(&root);
        Self { realm, root }
    }
}

fn install_host(root: &Scope, host: &HostBinding) {
    let name = JsString::from(host.name.as_str());
    let func = match &host.func {
        HostFunction::Sync(func) => JsFunction::Native(NativeFunction {
            name,
            func: func.cheap_clone(),
            arity: host.arity,
            constructor: false,
        }),
        HostFunction::Async(func) => JsFunction::NativeAsync(AsyncNativeFunction {
            name,
            func: func.cheap_clone(),
            arity: host.arity,
        }),
    };
    let obj = create_function(root.realm(), func);
    root.define(&host.name, VariableKind::Const, JsValue::Object(obj));
}

fn reentrant() -> JsError {
    JsError::internal_error("runtime is already running a script on this thread")
}

/// Hoist and execute a program against the root frame (scripts) or a
/// fresh isolated frame (modules)
async fn run_program(root: &Scope, script: &CompiledScript) -> Result<JsValue, JsError> {
    let program = &script.program;
    let scope = if script.name.is_some() {
        root.child(
            ScopeOptions::new()
                .isolated(true)
                .strict(program.strict || root.is_strict()),
        )?
    } else if program.strict && !root.is_strict() {
        root.child(ScopeOptions::new().strict(true))?
    } else {
        root.cheap_clone()
    };

    hoist_declarations(&scope, &program.body)?;
    match execute_statements(&scope, &program.body).await? {
        Completion::Normal(value) | Completion::Return(value) => Ok(value),
        Completion::Break | Completion::Continue => Err(JsError::syntax_error(
            "Illegal break or continue statement at top level",
        )),
    }
}
