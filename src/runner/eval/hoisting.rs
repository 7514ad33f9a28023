//! Runtime half of hoisting.
//!
//! The parser already computed, for every scope node, which names it hoists.
//! Entering a scope instantiates that plan into the new instance before any
//! statement of the node runs: `var`s as `undefined`, function declarations
//! as closures over the new instance, `let`/`const` uninitialized.

use tracing::trace;

use crate::parser::scope::{DeclarationKind, HoistPlan, ScopeId, ScopeKind};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::eval::function::instantiate_function_object;
use crate::runner::plugin::types::EvalContext;

/// Instantiates the plan of node `scope` into `env`.
pub fn instantiate_declarations(
    scope: ScopeId,
    env: &JsLexEnvironmentType,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let code = ctx.running_execution_ctx().code.clone();
    let plan = &code.node(scope).plan;
    if env.borrow().kind == ScopeKind::Global {
        check_global_redeclarations(plan, env)?;
    }

    {
        let mut e = env.borrow_mut();
        // A parameter of the same name is already bound; declare_var leaves it alone.
        for name in &plan.var_names {
            e.inner.declare_var(name);
        }
    }
    for function in &plan.functions {
        let value = instantiate_function_object(function, None, env.clone(), code.clone(), ctx);
        env.borrow_mut().inner.create_initialized_binding(
            function.name().to_string(),
            DeclarationKind::Function,
            value,
        );
    }
    {
        let mut e = env.borrow_mut();
        for (name, kind) in &plan.lexicals {
            if *kind == DeclarationKind::Const {
                e.inner.create_immutable_binding(name.to_string());
            } else {
                e.inner.create_mutable_binding(name.to_string());
            }
        }
    }

    trace!(
        scope = scope.0,
        vars = plan.var_names.len(),
        functions = plan.functions.len(),
        lexicals = plan.lexicals.len(),
        "hoisted declarations"
    );
    Ok(())
}

/// The global instance outlives a single script when an interpreter runs
/// several in a row; a later script may not redeclare an earlier lexical, nor
/// declare a lexical over an earlier name.
fn check_global_redeclarations(plan: &HoistPlan, env: &JsLexEnvironmentType) -> Result<(), JErrorType> {
    let e = env.borrow();
    for (name, _) in &plan.lexicals {
        if e.inner.has_binding(name) {
            return Err(already_declared(name));
        }
    }
    let hoisted = plan
        .var_names
        .iter()
        .map(|n| n.as_str())
        .chain(plan.functions.iter().map(|f| f.name()));
    for name in hoisted {
        if let Some(record) = e.inner.get(name) {
            if record.kind.is_lexical() {
                return Err(already_declared(name));
            }
        }
    }
    Ok(())
}

fn already_declared(name: &str) -> JErrorType {
    JErrorType::SyntaxError(format!("Identifier '{}' has already been declared", name))
}
