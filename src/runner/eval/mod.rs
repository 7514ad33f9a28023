//! Evaluation module for executing the AST.
//!
//! A synchronous, depth-first tree walk over scope instances, driven by the
//! explicit call stack in [`crate::runner::ds::execution_context`].

pub mod expression;
pub mod function;
pub mod hoisting;
pub mod statement;
pub mod types;

pub use types::{Completion, CompletionType, EvalResult, ValueResult};
