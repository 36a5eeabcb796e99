//! Runtime configuration

use serde::{Deserialize, Serialize};

/// Options fixed when a [`crate::Runtime`] is created.
///
/// Deserializable so hosts can keep it next to their own settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Start the root scope in strict mode
    pub strict: bool,
    /// Allow evaluation to suspend at call/await boundaries.
    ///
    /// When `false`, every script completes synchronously and any attempt
    /// to suspend fails with [`crate::JsError::SuspendNotAllowed`].
    pub suspend_allowed: bool,
    /// Maximum nesting of function calls before a RangeError
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strict: false,
            suspend_allowed: true,
            max_call_depth: 256,
        }
    }
}

impl RuntimeConfig {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_suspend_allowed(mut self, suspend_allowed: bool) -> Self {
        self.suspend_allowed = suspend_allowed;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}
