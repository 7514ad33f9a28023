//! Core types for the evaluation engine.

use crate::runner::ds::error::JsRuntimeError;
use crate::runner::ds::value::JsValue;

/// Completion record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionType {
    /// Execution continues with the next statement.
    Normal,
    /// A `return` is unwinding to the enclosing activation.
    Return,
}

/// Completion record.
/// Every statement evaluation returns one.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_type: CompletionType,
    /// Value of the last expression statement, or the returned value.
    pub value: Option<JsValue>,
}

impl Completion {
    /// Create a normal completion with no value.
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
        }
    }

    /// Create a normal completion with a value.
    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
        }
    }

    /// Create a return completion.
    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
        }
    }

    pub fn is_abrupt(&self) -> bool {
        self.completion_type != CompletionType::Normal
    }

    /// The carried value, `undefined` when there is none.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }
}

/// Result of executing a statement.
pub type EvalResult = Result<Completion, JsRuntimeError>;

/// Result of evaluating an expression.
pub type ValueResult = Result<JsValue, JsRuntimeError>;
