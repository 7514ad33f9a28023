//! Core natives registration.

use crate::runner::plugin::registry::BuiltInRegistry;

use super::console;
use super::timers;

/// Register all core natives with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    console::register(registry);
    timers::register(registry);
}
