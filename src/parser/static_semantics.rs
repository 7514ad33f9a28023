use std::collections::HashSet;

use crate::parser::ast::Meta;
use crate::parser::scope::{DeclarationKind, HoistPlan, ScopeId, ScopeKind, ScopeTree};
use crate::runner::ds::error::JErrorType;

/// Var-declared names collected for one node: its own `var`s plus those of
/// nested blocks, but never those of nested functions.
struct VarDeclaredNames {
    names: Vec<(String, Meta)>,
}

/// Computes the hoisting plan of every node in the tree.
///
/// Bottom-up: `var` names bubble from blocks to their function or global
/// node. Top-down: each node's lexical names are checked against everything
/// else it binds, raising the early errors a redeclaration would cause.
pub(crate) fn compute_hoist_plans(tree: &mut ScopeTree) -> Result<(), JErrorType> {
    let var_declared = collect_var_declared_names(tree);

    let mut plans = Vec::with_capacity(tree.len());
    for node in tree.iter() {
        check_lexical_conflicts(tree, node.id, &var_declared[node.id.0])?;
        plans.push(build_plan(tree, node.id, &var_declared[node.id.0]));
    }
    for (index, plan) in plans.into_iter().enumerate() {
        tree.node_mut(ScopeId(index)).plan = plan;
    }
    Ok(())
}

fn collect_var_declared_names(tree: &ScopeTree) -> Vec<VarDeclaredNames> {
    let mut collected: Vec<VarDeclaredNames> = (0..tree.len())
        .map(|_| VarDeclaredNames { names: vec![] })
        .collect();
    // Children always get larger ids than their parent.
    for index in (0..tree.len()).rev() {
        let node = tree.node(ScopeId(index));
        let mut names: Vec<(String, Meta)> = node
            .declarations
            .iter()
            .filter(|d| d.kind == DeclarationKind::Var)
            .map(|d| (d.name.to_string(), d.meta.clone()))
            .collect();
        for child in &node.children {
            if tree.node(*child).kind == ScopeKind::Block {
                names.extend(collected[child.0].names.iter().cloned());
            }
        }
        collected[index].names = names;
    }
    collected
}

fn check_lexical_conflicts(
    tree: &ScopeTree,
    id: ScopeId,
    var_declared: &VarDeclaredNames,
) -> Result<(), JErrorType> {
    let node = tree.node(id);
    let mut bound: HashSet<&str> = HashSet::new();
    for declaration in node.declarations.iter().filter(|d| d.kind.is_lexical()) {
        if !bound.insert(&declaration.name) {
            return Err(already_declared(&declaration.name, &declaration.meta));
        }
    }
    for declaration in &node.declarations {
        match declaration.kind {
            DeclarationKind::Function | DeclarationKind::Param => {
                if bound.contains(declaration.name.as_str()) {
                    return Err(already_declared(&declaration.name, &declaration.meta));
                }
            }
            _ => {}
        }
    }
    // Block-level functions are lexical, so a var bubbling through collides.
    if node.kind == ScopeKind::Block {
        bound.extend(
            node.declarations
                .iter()
                .filter(|d| d.kind == DeclarationKind::Function)
                .map(|d| d.name.as_str()),
        );
    }
    for (name, meta) in &var_declared.names {
        if bound.contains(name.as_str()) {
            return Err(already_declared(name, meta));
        }
    }
    Ok(())
}

fn build_plan(tree: &ScopeTree, id: ScopeId, var_declared: &VarDeclaredNames) -> HoistPlan {
    let node = tree.node(id);
    let mut plan = HoistPlan::default();
    for declaration in &node.declarations {
        match declaration.kind {
            DeclarationKind::Param => plan.params.push(declaration.name.to_string()),
            DeclarationKind::Function => {
                if let Some(function) = &declaration.function {
                    plan.functions.push(function.clone());
                }
            }
            DeclarationKind::Let | DeclarationKind::Const => plan
                .lexicals
                .push((declaration.name.to_string(), declaration.kind)),
            DeclarationKind::Var => {}
        }
    }
    if node.kind.is_var_scope() {
        let mut seen = HashSet::new();
        for (name, _) in &var_declared.names {
            if seen.insert(name.as_str()) {
                plan.var_names.push(name.to_string());
            }
        }
    }
    plan
}

fn already_declared(name: &str, meta: &Meta) -> JErrorType {
    JErrorType::SyntaxError(format!(
        "Identifier '{}' has already been declared at {}",
        name,
        meta.location()
    ))
}
