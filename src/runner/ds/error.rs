use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Every way an evaluation can fail. All of them are terminal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JErrorType {
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("TDZError: Cannot access '{0}' before initialization")]
    TdzError(String),
    #[error("ReferenceUndeclaredError: {0} is not defined")]
    ReferenceUndeclaredError(String),
    #[error("StackOverflowError: Maximum call stack size exceeded (depth {0})")]
    StackOverflowError(usize),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("TaskLimitError: task queue still busy after {0} callbacks")]
    TaskLimitError(usize),
}

impl JErrorType {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JErrorType::SyntaxError(_) => ErrorKind::SyntaxError,
            JErrorType::TdzError(_) => ErrorKind::TdzError,
            JErrorType::ReferenceUndeclaredError(_) => ErrorKind::ReferenceUndeclaredError,
            JErrorType::StackOverflowError(_) => ErrorKind::StackOverflowError,
            JErrorType::TypeError(_) => ErrorKind::TypeError,
            JErrorType::TaskLimitError(_) => ErrorKind::TaskLimitError,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> String {
        let full = self.to_string();
        match full.split_once(": ") {
            Some((_, rest)) => rest.to_string(),
            None => full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    SyntaxError,
    #[serde(rename = "TDZError")]
    TdzError,
    ReferenceUndeclaredError,
    StackOverflowError,
    TypeError,
    TaskLimitError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TdzError => "TDZError",
            ErrorKind::ReferenceUndeclaredError => "ReferenceUndeclaredError",
            ErrorKind::StackOverflowError => "StackOverflowError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::TaskLimitError => "TaskLimitError",
        })
    }
}

/// An engine error together with the call stack at the point it was raised,
/// innermost activation first and `<global>` last.
///
/// The trace starts empty and is filled by the first activation boundary the
/// error crosses, which is always the activation that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct JsRuntimeError {
    pub error: JErrorType,
    pub stack_trace: Vec<String>,
}

impl JsRuntimeError {
    pub fn new(error: JErrorType, stack_trace: Vec<String>) -> Self {
        JsRuntimeError { error, stack_trace }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn has_trace(&self) -> bool {
        !self.stack_trace.is_empty()
    }

    /// Renders the error and its trace the way an uncaught error is reported.
    pub fn report(&self) -> String {
        let mut lines = vec![format!("Uncaught {}", self.error)];
        for frame in &self.stack_trace {
            lines.push(format!("    at {}", frame));
        }
        lines.join("\n")
    }
}

impl From<JErrorType> for JsRuntimeError {
    fn from(error: JErrorType) -> Self {
        JsRuntimeError {
            error,
            stack_trace: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_drops_the_kind_prefix() {
        let err = JErrorType::TdzError("x".to_string());
        assert_eq!(err.to_string(), "TDZError: Cannot access 'x' before initialization");
        assert_eq!(err.message(), "Cannot access 'x' before initialization");
        assert_eq!(err.kind(), ErrorKind::TdzError);
    }

    #[test]
    fn report_lists_frames_innermost_first() {
        let err = JsRuntimeError::new(
            JErrorType::ReferenceUndeclaredError("y".to_string()),
            vec!["inner".to_string(), "<global>".to_string()],
        );
        assert_eq!(
            err.report(),
            "Uncaught ReferenceUndeclaredError: y is not defined\n    at inner\n    at <global>"
        );
    }
}
