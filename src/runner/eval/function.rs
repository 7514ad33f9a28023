//! Function values and calls.

use std::rc::Rc;

use tracing::debug;
use uuid::Uuid;

use crate::parser::ast::{FunctionBodyType, FunctionData};
use crate::parser::scope::{DeclarationKind, ScopeTree};
use crate::runner::ds::error::JsRuntimeError;
use crate::runner::ds::execution_context::{ActivationState, ExecutionContext};
use crate::runner::ds::function_object::{FunctionObject, FunctionRef};
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::hoisting::instantiate_declarations;
use super::statement::execute_statements;
use super::expression::evaluate_expression;
use super::types::{CompletionType, ValueResult};

/// Remaining host stack below which a call body moves to a fresh segment.
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each segment added when the red zone is reached.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Creates a closure over `env`. Anonymous functions take `name_hint`
/// (the variable they are being assigned to) as their name.
pub fn instantiate_function_object(
    data: &Rc<FunctionData>,
    name_hint: Option<&str>,
    env: JsLexEnvironmentType,
    code: Rc<ScopeTree>,
    ctx: &EvalContext,
) -> JsValue {
    let name = match (&data.id, name_hint) {
        (Some(id), _) => id.name.to_string(),
        (None, Some(hint)) => hint.to_string(),
        (None, None) => String::new(),
    };
    let lexical_this = if data.is_arrow {
        Some(ctx.this_value())
    } else {
        None
    };
    JsValue::Function(FunctionRef::Script(Rc::new(FunctionObject {
        name,
        data: data.clone(),
        code,
        environment: env,
        lexical_this,
    })))
}

/// Call a function with the given arguments.
pub fn call_function(
    function: &FunctionRef,
    this: JsValue,
    args: Vec<JsValue>,
    ctx: &mut EvalContext,
) -> ValueResult {
    match function {
        FunctionRef::Native(native) => (native.func)(ctx, this, args).map_err(JsRuntimeError::from),
        FunctionRef::Script(object) => call_script_function(object, this, args, ctx),
    }
}

fn call_script_function(
    object: &Rc<FunctionObject>,
    this: JsValue,
    args: Vec<JsValue>,
    ctx: &mut EvalContext,
) -> ValueResult {
    let env = LexEnvironment::new_function_environment(object.data.scope, object.environment.clone());
    let this_value = match &object.lexical_this {
        Some(captured) => captured.clone(),
        None => this,
    };
    let activation = ExecutionContext {
        id: Uuid::new_v4(),
        function_name: object.name.to_string(),
        state: ActivationState::Created,
        function: Some(FunctionRef::Script(object.clone())),
        code: object.code.clone(),
        var_env: env.clone(),
        lex_env: env.clone(),
        lexical_parent: Some(object.environment.clone()),
        this_value,
    };
    if let Err(error) = ctx.ctx_stack.push_execution_ctx(activation) {
        // The trace of an overflow is the full stack at the failed push.
        let trace = ctx.ctx_stack.stack_trace();
        debug!(depth = trace.len(), function = %object.name, "call stack overflow");
        return Err(JsRuntimeError::new(error, trace));
    }

    let result = match stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
        run_function_body(object, args, &env, ctx)
    }) {
        Ok(value) => {
            ctx.ctx_stack.get_running_execution_ctx_mut().state = ActivationState::Returned;
            Ok(value)
        }
        Err(mut error) => {
            ctx.ctx_stack.get_running_execution_ctx_mut().state = ActivationState::Failed;
            if !error.has_trace() {
                error.stack_trace = ctx.ctx_stack.stack_trace();
                debug!(error = %error.error, function = %object.name, "raised");
            }
            Err(error)
        }
    };
    ctx.ctx_stack.pop_running_execution_ctx();
    result
}

fn run_function_body(
    object: &FunctionObject,
    args: Vec<JsValue>,
    env: &JsLexEnvironmentType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let data = &object.data;
    {
        let mut e = env.borrow_mut();
        let mut args = args.into_iter();
        for param in &data.params {
            let value = args.next().unwrap_or(JsValue::Undefined);
            e.inner
                .create_initialized_binding(param.name.to_string(), DeclarationKind::Param, value);
        }
    }
    instantiate_declarations(data.scope, env, ctx)?;
    match &data.body {
        FunctionBodyType::Block(statements) => {
            let completion = execute_statements(statements, ctx)?;
            Ok(match completion.completion_type {
                CompletionType::Return => completion.get_value(),
                CompletionType::Normal => JsValue::Undefined,
            })
        }
        FunctionBodyType::Expression(expression) => evaluate_expression(expression, ctx),
    }
}
