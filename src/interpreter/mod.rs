//! Evaluation engine: scopes, coercion, callables and the tree-walking
//! dispatcher

pub mod builtins;
pub mod coerce;
pub mod completion;
pub mod eval;
pub mod exec;
pub mod function;
pub mod property;
pub mod scope;
pub mod tasks;
pub mod validate;

use std::cell::{Cell, RefCell};

use futures::executor::LocalSpawner;

use crate::config::RuntimeConfig;
use crate::prelude::FxHashSet;
use crate::value::{JsObject, JsObjectRef, JsString, JsSymbol, JsValue, ObjectKind, PropertyKey};

pub use completion::Completion;
pub use function::JsFunction;
pub use scope::{Scope, ScopeOptions, VariableKind};
pub use tasks::{TaskHandle, TaskSet};

/// Intrinsics and bookkeeping shared by every scope of one runtime.
///
/// A fresh realm is built on every reset, so objects created before the
/// reset keep pointing at the old prototypes and never leak into the new
/// state.
pub struct Realm {
    /// Object.prototype for all objects
    pub object_prototype: JsObjectRef,
    /// Function.prototype for function methods (call, apply, bind)
    pub function_prototype: JsObjectRef,
    /// Array.prototype for all array instances
    pub array_prototype: JsObjectRef,
    pub boolean_prototype: JsObjectRef,
    pub number_prototype: JsObjectRef,
    pub string_prototype: JsObjectRef,
    pub symbol_prototype: JsObjectRef,
    /// Prototype of task objects returned by async functions
    pub task_prototype: JsObjectRef,
    /// Well-known `Symbol.toPrimitive`
    pub symbol_to_primitive: JsSymbol,
    /// Detached asynchronous units owned by this realm
    pub tasks: TaskSet,
    pub max_call_depth: usize,
    /// Arrays currently being joined, for cycle detection
    pub(crate) join_stack: RefCell<FxHashSet<usize>>,
    next_symbol_id: Cell<u64>,
}

impl Realm {
    pub fn new(spawner: LocalSpawner, config: &RuntimeConfig) -> Self {
        let object_prototype = JsObject::new(ObjectKind::Ordinary).into_ref();
        let derived = || {
            JsObject::with_prototype(Some(object_prototype.clone()), ObjectKind::Ordinary).into_ref()
        };
        let realm = Self {
            function_prototype: derived(),
            array_prototype: derived(),
            boolean_prototype: derived(),
            number_prototype: derived(),
            string_prototype: derived(),
            symbol_prototype: derived(),
            task_prototype: derived(),
            object_prototype: object_prototype.clone(),
            symbol_to_primitive: JsSymbol::new(0, Some(JsString::from("Symbol.toPrimitive"))),
            tasks: TaskSet::new(spawner),
            max_call_depth: config.max_call_depth,
            join_stack: RefCell::new(FxHashSet::default()),
            next_symbol_id: Cell::new(1),
        };
        builtins::init_prototypes(&realm);
        realm
    }

    pub fn new_symbol(&self, description: Option<JsString>) -> JsSymbol {
        let id = self.next_symbol_id.get();
        self.next_symbol_id.set(id + 1);
        JsSymbol::new(id, description)
    }

    /// Create an ordinary object linked to Object.prototype
    pub fn create_object(&self) -> JsObjectRef {
        JsObject::with_prototype(Some(self.object_prototype.clone()), ObjectKind::Ordinary)
            .into_ref()
    }

    /// Create an array linked to Array.prototype
    pub fn create_array(&self, elements: Vec<JsValue>) -> JsObjectRef {
        let array = self.create_array_with_length(0);
        {
            let mut array = array.borrow_mut();
            for (i, element) in (0u32..).zip(elements) {
                array.write_own_slot(PropertyKey::Index(i), element);
            }
        }
        array
    }

    /// Create an array of `length` holes
    pub fn create_array_with_length(&self, length: u32) -> JsObjectRef {
        JsObject::with_prototype(Some(self.array_prototype.clone()), ObjectKind::Array { length })
            .into_ref()
    }

    /// Wrap a detached unit in a task object
    pub fn create_task(&self, handle: TaskHandle) -> JsObjectRef {
        JsObject::with_prototype(Some(self.task_prototype.clone()), ObjectKind::Task(handle))
            .into_ref()
    }

    /// Prototype used for property lookups on a primitive value
    pub fn prototype_for_primitive(&self, value: &JsValue) -> Option<&JsObjectRef> {
        match value {
            JsValue::Boolean(_) => Some(&self.boolean_prototype),
            JsValue::Number(_) => Some(&self.number_prototype),
            JsValue::String(_) => Some(&self.string_prototype),
            JsValue::Symbol(_) => Some(&self.symbol_prototype),
            _ => None,
        }
    }
}
