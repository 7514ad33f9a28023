use std::fmt;
use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::parser::scope::ScopeTree;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::NativeFn;

/// A user-defined function value.
///
/// `environment` is the scope instance that was running when the function
/// value was created. It is shared, never copied, so every closure created in
/// one scope instance observes the writes of the others.
pub struct FunctionObject {
    pub name: String,
    pub data: Rc<FunctionData>,
    /// Scope tree the body's `ScopeId`s index into.
    pub code: Rc<ScopeTree>,
    pub environment: JsLexEnvironmentType,
    /// Arrow functions close over `this` instead of receiving one.
    pub lexical_this: Option<JsValue>,
}

impl FunctionObject {
    pub fn is_arrow(&self) -> bool {
        self.data.is_arrow
    }
}

pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
}

#[derive(Clone)]
pub enum FunctionRef {
    Script(Rc<FunctionObject>),
    Native(Rc<NativeFunction>),
}

impl FunctionRef {
    pub fn name(&self) -> &str {
        match self {
            FunctionRef::Script(f) => &f.name,
            FunctionRef::Native(f) => &f.name,
        }
    }

    pub fn ptr_eq(&self, other: &FunctionRef) -> bool {
        match (self, other) {
            (FunctionRef::Script(a), FunctionRef::Script(b)) => Rc::ptr_eq(a, b),
            (FunctionRef::Native(a), FunctionRef::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionRef::Script(func) => write!(f, "FunctionRef::Script({:?})", func.name),
            FunctionRef::Native(func) => write!(f, "FunctionRef::Native({:?})", func.name),
        }
    }
}
