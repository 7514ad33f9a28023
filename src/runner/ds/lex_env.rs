use std::cell::RefCell;
use std::rc::Rc;

use crate::parser::scope::{ScopeId, ScopeKind};
use crate::runner::ds::env_record::BindingTable;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

pub type JsLexEnvironmentType = Rc<RefCell<LexEnvironment>>;

/// A runtime scope instance: one entry of a static scope node.
pub struct LexEnvironment {
    /// Static node this instance was created from. `None` for the extra
    /// environment that binds a named function expression's own name.
    pub scope: Option<ScopeId>,
    pub kind: ScopeKind,
    pub inner: BindingTable,
    pub outer: Option<JsLexEnvironmentType>,
}

impl LexEnvironment {
    pub fn new_global_environment() -> JsLexEnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            scope: None,
            kind: ScopeKind::Global,
            inner: BindingTable::new(),
            outer: None,
        }))
    }

    pub fn new_function_environment(scope: ScopeId, outer: JsLexEnvironmentType) -> JsLexEnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            scope: Some(scope),
            kind: ScopeKind::Function,
            inner: BindingTable::new(),
            outer: Some(outer),
        }))
    }

    pub fn new_declarative_environment(
        scope: Option<ScopeId>,
        outer: JsLexEnvironmentType,
    ) -> JsLexEnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            scope,
            kind: ScopeKind::Block,
            inner: BindingTable::new(),
            outer: Some(outer),
        }))
    }

    /// Fresh instance of the same node with the same bindings and outer link.
    /// Used to give each `for (let ...)` iteration its own loop variables.
    pub fn copy_for_iteration(&self) -> JsLexEnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            scope: self.scope,
            kind: self.kind,
            inner: self.inner.clone(),
            outer: self.outer.clone(),
        }))
    }
}

/// Nearest environment on the chain that binds `name`.
pub fn get_identifier_reference(env: &JsLexEnvironmentType, name: &str) -> Option<JsLexEnvironmentType> {
    let mut current = Some(env.clone());
    while let Some(e) = current {
        if e.borrow().inner.has_binding(name) {
            return Some(e);
        }
        current = e.borrow().outer.clone();
    }
    None
}

/// Reads `name` through the chain; `Ok(None)` when no environment binds it.
pub fn get_binding_value(env: &JsLexEnvironmentType, name: &str) -> Result<Option<JsValue>, JErrorType> {
    match get_identifier_reference(env, name) {
        Some(e) => {
            let value = e.borrow().inner.get_binding_value(name)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Writes `name` through the chain; `Ok(false)` when no environment binds it.
pub fn set_binding_value(env: &JsLexEnvironmentType, name: &str, value: JsValue) -> Result<bool, JErrorType> {
    match get_identifier_reference(env, name) {
        Some(e) => {
            e.borrow_mut().inner.set_mutable_binding(name, value)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
