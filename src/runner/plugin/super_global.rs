//! Super-global environment, the bottom of the scope chain.
//!
//! Natives are materialized into function values on first access and cached,
//! so `log === log` holds and each name is built at most once.

use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::function_object::{FunctionRef, NativeFunction};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::NativeFn;

pub struct SuperGlobalEnvironment {
    registry: BuiltInRegistry,
    cache: HashMap<String, JsValue>,
}

impl SuperGlobalEnvironment {
    pub fn new(registry: BuiltInRegistry) -> Self {
        SuperGlobalEnvironment {
            registry,
            cache: HashMap::new(),
        }
    }

    /// A bare native such as `log`.
    pub fn resolve_global(&mut self, name: &str) -> Option<JsValue> {
        let func = self.registry.get_global(name)?;
        Some(self.materialize(name.to_string(), name, func))
    }

    /// `object.method` on a host namespace. `None` when there is no such
    /// namespace; `Some(Undefined)` when the namespace lacks the method.
    pub fn resolve_member(&mut self, object: &str, method: &str) -> Option<JsValue> {
        if !self.registry.has_object(object) {
            return None;
        }
        match self.registry.get_method(object, method) {
            Some(func) => Some(self.materialize(format!("{}.{}", object, method), method, func)),
            None => Some(JsValue::Undefined),
        }
    }

    fn materialize(&mut self, key: String, name: &str, func: NativeFn) -> JsValue {
        self.cache
            .entry(key)
            .or_insert_with(|| {
                JsValue::Function(FunctionRef::Native(Rc::new(NativeFunction {
                    name: name.to_string(),
                    func,
                })))
            })
            .clone()
    }
}
