//! Statement completion records

use crate::value::JsValue;

/// Result of executing a statement.
///
/// `Return`, `Break` and `Continue` are unwind signals, not errors: each is
/// consumed only by the construct that owns it (function body, loop,
/// switch) and never reaches a user `catch`.
#[derive(Debug, Clone)]
pub enum Completion {
    Normal(JsValue),
    Return(JsValue),
    Break,
    Continue,
}

impl Completion {
    pub fn empty() -> Self {
        Completion::Normal(JsValue::Undefined)
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    /// Value carried by a normal or return completion
    pub fn value(&self) -> JsValue {
        match self {
            Completion::Normal(value) | Completion::Return(value) => value.clone(),
            Completion::Break | Completion::Continue => JsValue::Undefined,
        }
    }
}
