//! Statement execution.

use crate::parser::ast::{
    BlockStatementData, ExpressionType, ForInitType, StatementType, VariableDeclarationData,
    VariableDeclarationKind,
};
use crate::parser::scope::ScopeId;
use crate::runner::ds::error::JsRuntimeError;
use crate::runner::ds::lex_env::LexEnvironment;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::{assign_identifier, evaluate_expression, evaluate_named_expression};
use super::hoisting::instantiate_declarations;
use super::types::{Completion, CompletionType, EvalResult};

/// Execute statements in order, stopping at the first abrupt completion.
/// A normal completion carries the value of the last valued statement.
pub fn execute_statements(statements: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last = None;
    for statement in statements {
        let completion = execute_statement(statement, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        if completion.value.is_some() {
            last = completion.value;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}

/// Execute a statement and return its completion.
pub fn execute_statement(statement: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match statement {
        StatementType::EmptyStatement { .. } => Ok(Completion::normal()),
        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }
        StatementType::BlockStatement(block) => execute_block_statement(block, ctx),
        StatementType::VariableDeclaration(declaration) => {
            execute_variable_declaration(declaration, ctx)?;
            Ok(Completion::normal())
        }
        // Bound when the enclosing scope was entered.
        StatementType::FunctionDeclaration(_) => Ok(Completion::normal()),
        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            if evaluate_expression(test, ctx)?.to_boolean() {
                execute_statement(consequent, ctx)
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, ctx)
            } else {
                Ok(Completion::normal())
            }
        }
        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            scope,
            ..
        } => execute_for_statement(init.as_ref(), test.as_deref(), update.as_deref(), body, *scope, ctx),
        StatementType::WhileStatement { test, body, .. } => execute_while_statement(test, body, ctx),
        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(argument) => evaluate_expression(argument, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }
    }
}

/// Execute a block statement, in a fresh scope instance when the block
/// declares anything block-scoped.
fn execute_block_statement(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    let scope = match block.scope {
        Some(scope) => scope,
        None => return execute_statements(&block.body, ctx),
    };
    let outer = ctx.lex_env();
    let env = LexEnvironment::new_declarative_environment(Some(scope), outer.clone());
    instantiate_declarations(scope, &env, ctx)?;
    ctx.set_lex_env(env);
    let result = execute_statements(&block.body, ctx);
    ctx.set_lex_env(outer);
    result
}

/// Execute a variable declaration.
///
/// `var` declarators without an initializer do nothing: the binding already
/// exists. `let`/`const` leave their TDZ here, `undefined` when bare.
pub fn execute_variable_declaration(
    declaration: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> Result<(), JsRuntimeError> {
    for declarator in &declaration.declarations {
        let name = declarator.id.name.as_str();
        match declaration.kind {
            VariableDeclarationKind::Var => {
                if let Some(init) = &declarator.init {
                    let value = evaluate_named_expression(init, name, ctx)?;
                    assign_identifier(name, value, ctx)?;
                }
            }
            VariableDeclarationKind::Let | VariableDeclarationKind::Const => {
                let value = match &declarator.init {
                    Some(init) => evaluate_named_expression(init, name, ctx)?,
                    None => JsValue::Undefined,
                };
                ctx.lex_env().borrow_mut().inner.initialize_binding(name, value)?;
            }
        }
    }
    Ok(())
}

fn execute_for_statement(
    init: Option<&ForInitType>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    scope: Option<ScopeId>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let scope = match scope {
        Some(scope) => scope,
        None => return run_for_loop(init, test, update, body, false, ctx),
    };
    let outer = ctx.lex_env();
    let head = LexEnvironment::new_declarative_environment(Some(scope), outer.clone());
    instantiate_declarations(scope, &head, ctx)?;
    ctx.set_lex_env(head);
    let result = run_for_loop(init, test, update, body, true, ctx);
    ctx.set_lex_env(outer);
    result
}

/// The loop proper. With `per_iteration` set, each iteration runs in its own
/// copy of the loop-head instance, so closures created by the body keep the
/// value of that iteration.
fn run_for_loop(
    init: Option<&ForInitType>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    per_iteration: bool,
    ctx: &mut EvalContext,
) -> EvalResult {
    match init {
        Some(ForInitType::VariableDeclaration(declaration)) => {
            execute_variable_declaration(declaration, ctx)?;
        }
        Some(ForInitType::Expression(expression)) => {
            evaluate_expression(expression, ctx)?;
        }
        None => {}
    }
    if per_iteration {
        create_per_iteration_environment(ctx);
    }
    let mut last = None;
    loop {
        if let Some(test) = test {
            if !evaluate_expression(test, ctx)?.to_boolean() {
                break;
            }
        }
        let completion = execute_statement(body, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        if completion.value.is_some() {
            last = completion.value;
        }
        if per_iteration {
            create_per_iteration_environment(ctx);
        }
        if let Some(update) = update {
            evaluate_expression(update, ctx)?;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}

fn create_per_iteration_environment(ctx: &mut EvalContext) {
    let next = ctx.lex_env().borrow().copy_for_iteration();
    ctx.set_lex_env(next);
}

fn execute_while_statement(test: &ExpressionType, body: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    let mut last = None;
    while evaluate_expression(test, ctx)?.to_boolean() {
        let completion = execute_statement(body, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        if completion.value.is_some() {
            last = completion.value;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}
