//! Detached asynchronous units
//!
//! Async function calls and host async natives produce units that run
//! outside the expression that started them. Each unit is polled eagerly
//! until its first suspension and then handed to the runtime's local
//! executor. The realm keeps an abort handle for every unit still running
//! so a reset can cancel all of them at once.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::executor::LocalSpawner;
use futures::future::{AbortHandle, Aborted, LocalBoxFuture, Shared, abortable};
use futures::task::LocalSpawnExt;
use log::{debug, trace};

use crate::error::JsError;
use crate::interpreter::Scope;
use crate::value::JsValue;

pub type TaskResult = Result<JsValue, JsError>;

type SharedResult = Shared<LocalBoxFuture<'static, TaskResult>>;

/// Handle to the eventual result of a detached unit.
///
/// Every clone observes the same result.
#[derive(Clone)]
pub struct TaskHandle {
    result: SharedResult,
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(Ok(value)) => write!(f, "Task(fulfilled: {:?})", value),
            Some(Err(err)) => write!(f, "Task(rejected: {})", err),
            None => write!(f, "Task(pending)"),
        }
    }
}

impl TaskHandle {
    /// Result if the unit already finished
    pub fn peek(&self) -> Option<TaskResult> {
        self.result.peek().cloned()
    }

    /// Wait for the unit to finish
    pub async fn join(&self) -> TaskResult {
        self.result.clone().await
    }

    /// Poll once without waiting; `None` while the unit is still pending
    pub fn try_join(&self) -> Option<TaskResult> {
        self.result.clone().now_or_never()
    }
}

struct TaskEntry {
    abort: AbortHandle,
    done: Rc<Cell<bool>>,
}

/// Units owned by one realm
pub struct TaskSet {
    spawner: LocalSpawner,
    entries: RefCell<Vec<TaskEntry>>,
}

impl TaskSet {
    pub fn new(spawner: LocalSpawner) -> Self {
        Self {
            spawner,
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Start a detached unit.
    ///
    /// The unit runs synchronously up to its first suspension point before
    /// this returns; a unit that never suspends is never scheduled.
    pub fn spawn(&self, future: LocalBoxFuture<'static, TaskResult>) -> Result<TaskHandle, JsError> {
        let (future, abort) = abortable(future);
        let done = Rc::new(Cell::new(false));
        let finished = done.clone();
        let result: SharedResult = async move {
            let result = match future.await {
                Ok(result) => result,
                Err(Aborted) => Err(JsError::Cancelled),
            };
            finished.set(true);
            result
        }
        .boxed_local()
        .shared();

        let handle = TaskHandle {
            result: result.clone(),
        };
        if result.clone().now_or_never().is_some() {
            return Ok(handle);
        }

        trace!("spawning detached unit");
        self.spawner
            .spawn_local(result.map(|_| ()))
            .map_err(|e| JsError::internal_error(format!("failed to spawn task: {}", e)))?;

        let mut entries = self.entries.borrow_mut();
        entries.retain(|entry| !entry.done.get());
        entries.push(TaskEntry { abort, done });
        Ok(handle)
    }

    /// Abort every unit still running. Returns how many were aborted.
    pub fn cancel_all(&self) -> usize {
        let entries: Vec<TaskEntry> = self.entries.borrow_mut().drain(..).collect();
        let mut cancelled = 0;
        for entry in entries {
            if !entry.done.get() {
                entry.abort.abort();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Number of units that have not finished
    pub fn pending(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| !entry.done.get())
            .count()
    }
}

/// Wait on `pending` at a suspension point.
///
/// Suspend-allowed scopes simply await. Elsewhere the future gets exactly
/// one poll: a ready result is returned, anything still pending fails with
/// `SuspendNotAllowed` instead of blocking.
pub async fn suspension_point<F>(scope: &Scope, pending: F, what: &str) -> TaskResult
where
    F: Future<Output = TaskResult>,
{
    if scope.is_suspend_allowed() {
        return pending.await;
    }
    match pending.now_or_never() {
        Some(result) => result,
        None => {
            debug!("refusing to suspend at {} in a synchronous scope", what);
            Err(JsError::suspend_not_allowed(format!(
                "'{}' would suspend, but suspension is not allowed in this scope",
                what
            )))
        }
    }
}
