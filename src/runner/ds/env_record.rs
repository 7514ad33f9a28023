use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::parser::scope::DeclarationKind;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::{JsValue, ValueSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BindingState {
    Uninitialized,
    Initialized,
}

/// One binding. `value` is `None` while a `let`/`const` sits in its TDZ.
#[derive(Debug, Clone)]
pub struct BindingRecord {
    pub kind: DeclarationKind,
    pub value: Option<JsValue>,
}

impl BindingRecord {
    pub fn state(&self) -> BindingState {
        match self.value {
            Some(_) => BindingState::Initialized,
            None => BindingState::Uninitialized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingSnapshot {
    pub kind: DeclarationKind,
    pub state: BindingState,
    pub value: Option<ValueSnapshot>,
}

/// Identifier to binding map owned by one scope instance.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: HashMap<String, BindingRecord>,
}

impl BindingTable {
    pub fn new() -> Self {
        BindingTable {
            bindings: HashMap::new(),
        }
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&BindingRecord> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Hoists a `var`: `undefined` on first declaration, no-op afterwards.
    pub fn declare_var(&mut self, name: &str) {
        if !self.has_binding(name) {
            self.bindings.insert(
                name.to_string(),
                BindingRecord {
                    kind: DeclarationKind::Var,
                    value: Some(JsValue::Undefined),
                },
            );
        }
    }

    /// Creates an uninitialized `let` binding.
    pub fn create_mutable_binding(&mut self, name: String) {
        self.bindings.insert(
            name,
            BindingRecord {
                kind: DeclarationKind::Let,
                value: None,
            },
        );
    }

    /// Creates an uninitialized `const` binding.
    pub fn create_immutable_binding(&mut self, name: String) {
        self.bindings.insert(
            name,
            BindingRecord {
                kind: DeclarationKind::Const,
                value: None,
            },
        );
    }

    /// Creates or overwrites an initialized binding of `kind`.
    pub fn create_initialized_binding(&mut self, name: String, kind: DeclarationKind, value: JsValue) {
        self.bindings.insert(
            name,
            BindingRecord {
                kind,
                value: Some(value),
            },
        );
    }

    /// Ends the TDZ of a lexical binding, or re-sets an already initialized one.
    pub fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            Some(record) => {
                record.value = Some(value);
                Ok(())
            }
            None => Err(JErrorType::ReferenceUndeclaredError(name.to_string())),
        }
    }

    pub fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            Some(record) => {
                if record.value.is_none() {
                    Err(JErrorType::TdzError(name.to_string()))
                } else if record.kind == DeclarationKind::Const {
                    Err(JErrorType::TypeError(format!(
                        "Assignment to constant variable '{}'",
                        name
                    )))
                } else {
                    record.value = Some(value);
                    Ok(())
                }
            }
            None => Err(JErrorType::ReferenceUndeclaredError(name.to_string())),
        }
    }

    pub fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            Some(BindingRecord { value: Some(v), .. }) => Ok(v.clone()),
            Some(BindingRecord { value: None, .. }) => Err(JErrorType::TdzError(name.to_string())),
            None => Err(JErrorType::ReferenceUndeclaredError(name.to_string())),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, BindingSnapshot> {
        self.bindings
            .iter()
            .map(|(name, record)| {
                (
                    name.to_string(),
                    BindingSnapshot {
                        kind: record.kind,
                        state: record.state(),
                        value: record.value.as_ref().map(|v| v.snapshot()),
                    },
                )
            })
            .collect()
    }
}
