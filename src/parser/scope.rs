//! Static lexical scope tree.
//!
//! The tree is an arena: nodes own nothing but indices, children are listed by
//! id and the parent link is a plain id used only for chain lookups. Runtime
//! scope instances point back at their node through [`ScopeId`].

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::parser::ast::{FunctionData, Meta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

impl ScopeKind {
    /// Global and function scopes are where `var` declarations land.
    pub fn is_var_scope(&self) -> bool {
        !matches!(self, ScopeKind::Block)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
    Function,
    Param,
}

impl DeclarationKind {
    pub fn is_lexical(&self) -> bool {
        matches!(self, DeclarationKind::Let | DeclarationKind::Const)
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
            DeclarationKind::Function => "function",
            DeclarationKind::Param => "param",
        })
    }
}

/// A declaration exactly as written, recorded on the node it appeared in.
#[derive(Debug)]
pub struct DeclarationData {
    pub name: String,
    pub kind: DeclarationKind,
    pub meta: Meta,
    pub function: Option<Rc<FunctionData>>,
}

/// What to register on entry to a scope, in order: vars, functions, lexicals.
#[derive(Debug, Default)]
pub struct HoistPlan {
    pub params: Vec<String>,
    pub var_names: Vec<String>,
    pub functions: Vec<Rc<FunctionData>>,
    pub lexicals: Vec<(String, DeclarationKind)>,
}

impl HoistPlan {
    pub fn is_empty(&self) -> bool {
        self.var_names.is_empty() && self.functions.is_empty() && self.lexicals.is_empty()
    }
}

#[derive(Debug)]
pub struct ScopeNode {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub declarations: Vec<DeclarationData>,
    pub plan: HoistPlan,
}

#[derive(Debug)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl ScopeTree {
    pub fn new() -> Self {
        ScopeTree { nodes: Vec::new() }
    }

    pub fn add_node(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            id,
            kind,
            parent,
            children: Vec::new(),
            declarations: Vec::new(),
            plan: HoistPlan::default(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopeNode> {
        self.nodes.iter()
    }

    pub fn declare(&mut self, scope: ScopeId, declaration: DeclarationData) {
        self.nodes[scope.0].declarations.push(declaration);
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
