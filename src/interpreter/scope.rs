//! Runtime environment frames
//!
//! A [`Scope`] is one frame of the environment chain: its own bindings, a
//! `this` value, a parent link and the flags that govern evaluation inside
//! it (strictness, suspension policy, isolation). Frames are reference
//! counted; a frame normally dies when the block or call that created it
//! finishes, and lives on only while a closure still captures it.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::Realm;
use crate::prelude::FxHashMap;
use crate::value::{CheapClone, JsString, JsValue};

/// Where a write through [`Scope::set`] lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Bind or update in the root frame
    Global,
    /// Bind in the current frame, shadowing outer bindings
    Local,
    /// Bind in the current frame; later plain assignments are rejected
    Const,
}

/// Variable binding
#[derive(Debug, Clone)]
pub struct Binding {
    pub kind: VariableKind,
    pub value: JsValue,
}

#[derive(Debug, Clone, Copy)]
struct ScopeFlags {
    strict: bool,
    suspend_allowed: bool,
    isolated: bool,
    /// Function call frame (target of `var` declarations)
    function_boundary: bool,
}

struct Frame {
    this: JsValue,
    parent: Option<Scope>,
    flags: ScopeFlags,
    /// Nesting of function calls that led to this frame
    depth: usize,
    bindings: RefCell<FxHashMap<JsString, Binding>>,
    realm: Rc<Realm>,
}

/// Handle to an environment frame. Cloning is cheap.
#[derive(Clone)]
pub struct Scope(Rc<Frame>);

impl CheapClone for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("bindings", &self.0.bindings.borrow().len())
            .field("strict", &self.0.flags.strict)
            .field("suspend_allowed", &self.0.flags.suspend_allowed)
            .field("isolated", &self.0.flags.isolated)
            .field("depth", &self.0.depth)
            .finish()
    }
}

/// Parameters for creating a child frame
#[derive(Debug, Clone, Default)]
pub struct ScopeOptions {
    /// Override `this`; inherited from the parent when `None`
    pub this: Option<JsValue>,
    /// Bindings created in the new frame before anything runs
    pub bindings: Vec<(JsString, VariableKind, JsValue)>,
    /// Override the suspension policy; inherited when `None`
    pub suspend_allowed: Option<bool>,
    /// Sever lookup fallback to caller frames
    pub isolated: bool,
    /// Override strictness; inherited when `None`
    pub strict: Option<bool>,
    pub(crate) function_boundary: bool,
    pub(crate) depth: Option<usize>,
}

impl ScopeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn this(mut self, this: JsValue) -> Self {
        self.this = Some(this);
        self
    }

    pub fn binding(mut self, name: impl Into<JsString>, kind: VariableKind, value: JsValue) -> Self {
        self.bindings.push((name.into(), kind, value));
        self
    }

    pub fn suspend_allowed(mut self, allowed: bool) -> Self {
        self.suspend_allowed = Some(allowed);
        self
    }

    pub fn isolated(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

impl Scope {
    /// Create the root frame of a runtime
    pub fn root(realm: Rc<Realm>, strict: bool, suspend_allowed: bool) -> Self {
        Scope(Rc::new(Frame {
            this: JsValue::Undefined,
            parent: None,
            flags: ScopeFlags {
                strict,
                suspend_allowed,
                isolated: false,
                function_boundary: true,
            },
            depth: 0,
            bindings: RefCell::new(FxHashMap::default()),
            realm,
        }))
    }

    pub fn realm(&self) -> &Rc<Realm> {
        &self.0.realm
    }

    pub fn this(&self) -> JsValue {
        self.0.this.clone()
    }

    pub fn is_strict(&self) -> bool {
        self.0.flags.strict
    }

    pub fn is_suspend_allowed(&self) -> bool {
        self.0.flags.suspend_allowed
    }

    pub fn is_isolated(&self) -> bool {
        self.0.flags.isolated
    }

    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The root frame, reached through parent links regardless of isolation
    pub fn root_frame(&self) -> Scope {
        let mut current = self.cheap_clone();
        while let Some(parent) = current.parent().map(CheapClone::cheap_clone) {
            current = parent;
        }
        current
    }

    /// Next frame consulted by name resolution.
    ///
    /// Isolated frames skip every caller frame and fall back to the root.
    fn resolution_parent(&self) -> Option<Scope> {
        let parent = self.0.parent.as_ref()?;
        if self.0.flags.isolated {
            Some(parent.root_frame())
        } else {
            Some(parent.cheap_clone())
        }
    }

    /// Create a child frame
    pub fn child(&self, options: ScopeOptions) -> Result<Scope, JsError> {
        let flags = ScopeFlags {
            strict: options.strict.unwrap_or(self.0.flags.strict),
            suspend_allowed: options
                .suspend_allowed
                .unwrap_or(self.0.flags.suspend_allowed),
            isolated: options.isolated,
            function_boundary: options.function_boundary || options.isolated,
        };
        let depth = options.depth.unwrap_or(self.0.depth);
        if depth > self.0.realm.max_call_depth {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        let child = Scope(Rc::new(Frame {
            this: options.this.unwrap_or_else(|| self.this()),
            parent: Some(self.cheap_clone()),
            flags,
            depth,
            bindings: RefCell::new(FxHashMap::default()),
            realm: self.0.realm.cheap_clone(),
        }));
        for (name, kind, value) in options.bindings {
            child.set(&name, value, Some(kind))?;
        }
        Ok(child)
    }

    /// Run `body` against a new child frame that is discarded afterwards.
    ///
    /// Bindings created inside the frame are not visible to the caller.
    pub async fn with_scope<F, Fut, T>(&self, options: ScopeOptions, body: F) -> Result<T, JsError>
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = Result<T, JsError>>,
    {
        let child = self.child(options)?;
        body(child).await
    }

    /// Resolve a name, walking outward
    pub fn lookup(&self, name: &str) -> Option<JsValue> {
        let mut current = Some(self.cheap_clone());
        while let Some(scope) = current.take() {
            if let Some(binding) = scope.0.bindings.borrow().get(name) {
                return Some(binding.value.clone());
            }
            current = scope.resolution_parent();
        }
        None
    }

    /// Resolve a name; unresolvable names are a ReferenceError
    pub fn get(&self, name: &str) -> Result<JsValue, JsError> {
        self.lookup(name).ok_or_else(|| JsError::not_defined(name))
    }

    /// Check if a binding exists anywhere in the resolution chain
    pub fn contains(&self, name: &str) -> bool {
        let mut current = Some(self.cheap_clone());
        while let Some(scope) = current.take() {
            if scope.0.bindings.borrow().contains_key(name) {
                return true;
            }
            current = scope.resolution_parent();
        }
        false
    }

    /// Check if a binding exists only in this frame
    pub fn contains_own(&self, name: &str) -> bool {
        self.0.bindings.borrow().contains_key(name)
    }

    pub fn binding_kind(&self, name: &str) -> Option<VariableKind> {
        let mut current = Some(self.cheap_clone());
        while let Some(scope) = current.take() {
            if let Some(binding) = scope.0.bindings.borrow().get(name) {
                return Some(binding.kind);
            }
            current = scope.resolution_parent();
        }
        None
    }

    /// Bind or assign a name.
    ///
    /// - `Some(Global)` binds/updates in the root frame.
    /// - `Some(Local)` binds in this frame, shadowing outer bindings.
    /// - `Some(Const)` declares an immutable binding in this frame.
    /// - `None` is plain assignment: the nearest existing binding is
    ///   updated in place; no binding anywhere is a ReferenceError.
    pub fn set(
        &self,
        name: &JsString,
        value: JsValue,
        kind: Option<VariableKind>,
    ) -> Result<(), JsError> {
        match kind {
            Some(VariableKind::Global) => {
                let root = self.root_frame();
                root.bind_own(name, value, VariableKind::Global)
            }
            Some(kind) => self.bind_own(name, value, kind),
            None => self.assign(name, value),
        }
    }

    fn bind_own(&self, name: &JsString, value: JsValue, kind: VariableKind) -> Result<(), JsError> {
        let mut bindings = self.0.bindings.borrow_mut();
        if let Some(existing) = bindings.get(name.as_str()) {
            if existing.kind == VariableKind::Const {
                return Err(match kind {
                    VariableKind::Const => JsError::syntax_error(format!(
                        "Identifier '{}' has already been declared",
                        name
                    )),
                    _ => const_assignment(name),
                });
            }
        }
        let kind = if kind == VariableKind::Global && self.0.parent.is_some() {
            VariableKind::Local
        } else {
            kind
        };
        bindings.insert(name.cheap_clone(), Binding { kind, value });
        Ok(())
    }

    fn assign(&self, name: &JsString, value: JsValue) -> Result<(), JsError> {
        let mut current = Some(self.cheap_clone());
        while let Some(scope) = current.take() {
            {
                let mut bindings = scope.0.bindings.borrow_mut();
                if let Some(binding) = bindings.get_mut(name.as_str()) {
                    if binding.kind == VariableKind::Const {
                        return Err(const_assignment(name));
                    }
                    binding.value = value;
                    return Ok(());
                }
            }
            current = scope.resolution_parent();
        }
        Err(JsError::not_defined(name.as_str()))
    }

    /// Remove the nearest binding of `name`.
    ///
    /// Const bindings cannot be deleted. Unresolvable names report `true`.
    pub fn delete(&self, name: &str) -> bool {
        let mut current = Some(self.cheap_clone());
        while let Some(scope) = current.take() {
            {
                let mut bindings = scope.0.bindings.borrow_mut();
                if let Some(binding) = bindings.get(name) {
                    if binding.kind == VariableKind::Const {
                        return false;
                    }
                    bindings.remove(name);
                    return true;
                }
            }
            current = scope.resolution_parent();
        }
        true
    }

    /// Nearest frame that receives `var` declarations
    pub fn var_frame(&self) -> Scope {
        let mut current = self.cheap_clone();
        while !current.0.flags.function_boundary {
            match current.parent() {
                Some(parent) => current = parent.cheap_clone(),
                None => break,
            }
        }
        current
    }

    /// Declare a `var` name in the nearest function frame if absent
    pub fn declare_var(&self, name: &JsString) -> Result<(), JsError> {
        let frame = self.var_frame();
        if frame.contains_own(name.as_str()) {
            return Ok(());
        }
        let kind = if frame.parent().is_none() {
            VariableKind::Global
        } else {
            VariableKind::Local
        };
        frame.bind_own(name, JsValue::Undefined, kind)
    }

    /// Initialize a `var` binding declared by [`Scope::declare_var`]
    pub fn assign_var(&self, name: &JsString, value: JsValue) -> Result<(), JsError> {
        let frame = self.var_frame();
        if !frame.contains_own(name.as_str()) {
            self.declare_var(name)?;
        }
        let kind = if frame.parent().is_none() {
            VariableKind::Global
        } else {
            VariableKind::Local
        };
        frame.bind_own(name, value, kind)
    }

    /// New sibling frame under `parent` carrying copies of this frame's
    /// bindings for `names`. Used for per-iteration loop environments.
    pub fn fork_bindings(&self, parent: &Scope, names: &[JsString]) -> Result<Scope, JsError> {
        let mut options = ScopeOptions::new();
        {
            let bindings = self.0.bindings.borrow();
            for name in names {
                if let Some(binding) = bindings.get(name.as_str()) {
                    options
                        .bindings
                        .push((name.cheap_clone(), binding.kind, binding.value.clone()));
                }
            }
        }
        parent.child(options)
    }

    /// Insert a binding in this frame, replacing any existing one
    pub(crate) fn define(&self, name: &str, kind: VariableKind, value: JsValue) {
        self.0
            .bindings
            .borrow_mut()
            .insert(JsString::from(name), Binding { kind, value });
    }

    /// Drop every binding of this frame
    pub(crate) fn clear(&self) {
        self.0.bindings.borrow_mut().clear();
    }

    /// Names bound in this frame
    pub fn own_names(&self) -> Vec<JsString> {
        let mut names: Vec<JsString> = self.0.bindings.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn function_options(this: Option<JsValue>, depth: usize) -> ScopeOptions {
        ScopeOptions {
            this,
            function_boundary: true,
            depth: Some(depth),
            ..ScopeOptions::default()
        }
    }
}

fn const_assignment(name: &JsString) -> JsError {
    JsError::type_error(format!("Assignment to constant variable '{}'", name))
}
