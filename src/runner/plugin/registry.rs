//! Registry of natives.

use std::collections::HashMap;

use crate::runner::plugin::types::{BuiltInObject, NativeFn};
use crate::runner::std_lib::register_core_builtins;

lazy_static! {
    /// Core natives, built once and cloned into every context.
    static ref CORE_REGISTRY: BuiltInRegistry = {
        let mut registry = BuiltInRegistry::new();
        register_core_builtins(&mut registry);
        registry
    };
}

/// Natives by name: bare globals (`log`, `setTimeout`) and namespaces
/// (`console`) whose methods are reached with dotted paths.
#[derive(Clone, Default)]
pub struct BuiltInRegistry {
    objects: HashMap<String, BuiltInObject>,
    globals: HashMap<String, NativeFn>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: HashMap::new(),
            globals: HashMap::new(),
        }
    }

    /// Create a registry with the core natives.
    pub fn with_core() -> Self {
        CORE_REGISTRY.clone()
    }

    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.to_string(), obj);
    }

    pub fn register_global(&mut self, name: impl Into<String>, func: NativeFn) {
        self.globals.insert(name.into(), func);
    }

    pub fn get_method(&self, object: &str, method: &str) -> Option<NativeFn> {
        self.objects
            .get(object)
            .and_then(|obj| obj.methods.get(method))
            .copied()
    }

    pub fn get_global(&self, name: &str) -> Option<NativeFn> {
        self.globals.get(name).copied()
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.get_method(object, method).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_has_console_and_timers() {
        let registry = BuiltInRegistry::with_core();
        assert!(registry.has_method("console", "log"));
        assert!(registry.has_method("console", "error"));
        assert!(!registry.has_method("console", "table"));
        for name in ["log", "print", "setTimeout", "schedule", "clearTimeout"] {
            assert!(registry.get_global(name).is_some(), "missing {}", name);
        }
    }
}
