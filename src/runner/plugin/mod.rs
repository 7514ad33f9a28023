//! Host-provided natives and the super-global layer.
//!
//! Natives are resolved only after the whole lexical chain, global scope
//! included, misses:
//!
//! ```text
//! 1. Local scope (function/block)
//! 2. Outer scopes (captured chain)
//! 3. Global scope
//! 4. Super-global scope: console.log, log, print, setTimeout, ...
//! ```
//!
//! User code can shadow a native by declaring the same name, but can never
//! write into the super-global layer itself.

pub mod registry;
pub mod super_global;
pub mod types;

pub use registry::BuiltInRegistry;
pub use super_global::SuperGlobalEnvironment;
pub use types::{BuiltInObject, EvalContext, LogLevel, LogLine, NativeFn};
