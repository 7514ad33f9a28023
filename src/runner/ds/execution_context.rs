use std::rc::Rc;

use serde::Serialize;
use tracing::trace;
use uuid::Uuid;

use crate::parser::scope::ScopeTree;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionRef;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::value::JsValue;

pub const GLOBAL_FRAME_NAME: &str = "<global>";
pub const ANONYMOUS_FRAME_NAME: &str = "<anonymous>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivationState {
    Created,
    Running,
    SuspendedOnCall,
    Returned,
    Failed,
}

/// One live call, or the global activation at the bottom of the stack.
pub struct ExecutionContext {
    pub id: Uuid,
    pub function_name: String,
    pub state: ActivationState,
    /// `None` for the global activation.
    pub function: Option<FunctionRef>,
    /// Tree the running code's scope ids index into.
    pub code: Rc<ScopeTree>,
    /// The function (or global) scope instance; `var`s live here.
    pub var_env: JsLexEnvironmentType,
    /// Innermost scope instance, moved in and out as blocks are entered.
    pub lex_env: JsLexEnvironmentType,
    /// Scope captured when the function value was created.
    pub lexical_parent: Option<JsLexEnvironmentType>,
    pub this_value: JsValue,
}

impl ExecutionContext {
    pub fn new_global(code: Rc<ScopeTree>, global_env: JsLexEnvironmentType) -> Self {
        ExecutionContext {
            id: Uuid::new_v4(),
            function_name: GLOBAL_FRAME_NAME.to_string(),
            state: ActivationState::Running,
            function: None,
            code,
            var_env: global_env.clone(),
            lex_env: global_env,
            lexical_parent: None,
            this_value: JsValue::Undefined,
        }
    }

    pub fn frame_name(&self) -> &str {
        if self.function_name.is_empty() {
            ANONYMOUS_FRAME_NAME
        } else {
            &self.function_name
        }
    }
}

/// The call stack. The global activation sits at index 0 and is never
/// popped; `max_depth` counts it.
pub struct ExecutionContextStack {
    stack: Vec<ExecutionContext>,
    max_depth: usize,
}

impl ExecutionContextStack {
    pub fn new(global: ExecutionContext, max_depth: usize) -> Self {
        ExecutionContextStack {
            stack: vec![global],
            max_depth: max_depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn get_running_execution_ctx(&self) -> &ExecutionContext {
        &self.stack[self.stack.len() - 1]
    }

    pub fn get_running_execution_ctx_mut(&mut self) -> &mut ExecutionContext {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    pub fn get_global_execution_ctx(&self) -> &ExecutionContext {
        &self.stack[0]
    }

    pub fn get_global_execution_ctx_mut(&mut self) -> &mut ExecutionContext {
        &mut self.stack[0]
    }

    /// Pushes a new activation, suspending the caller. Fails without pushing
    /// when the stack is already at its bound.
    pub fn push_execution_ctx(&mut self, mut ctx: ExecutionContext) -> Result<(), JErrorType> {
        if self.stack.len() >= self.max_depth {
            return Err(JErrorType::StackOverflowError(self.max_depth));
        }
        self.get_running_execution_ctx_mut().state = ActivationState::SuspendedOnCall;
        ctx.state = ActivationState::Running;
        trace!(id = %ctx.id, function = ctx.frame_name(), depth = self.stack.len() + 1, "push activation");
        self.stack.push(ctx);
        Ok(())
    }

    /// Pops the running activation and resumes its caller. The global
    /// activation stays put.
    pub fn pop_running_execution_ctx(&mut self) -> Option<ExecutionContext> {
        if self.stack.len() <= 1 {
            return None;
        }
        let ctx = self.stack.pop();
        if let Some(popped) = &ctx {
            trace!(id = %popped.id, function = popped.frame_name(), state = ?popped.state, "pop activation");
        }
        self.get_running_execution_ctx_mut().state = ActivationState::Running;
        ctx
    }

    /// Frame names from the running activation down to `<global>`.
    pub fn stack_trace(&self) -> Vec<String> {
        self.stack
            .iter()
            .rev()
            .map(|ctx| ctx.frame_name().to_string())
            .collect()
    }
}
