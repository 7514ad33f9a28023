//! Host natives: console output and the virtual-time task queue.

pub mod console;
pub mod core;
pub mod timers;

pub use self::core::register_core_builtins;
