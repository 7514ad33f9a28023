//! Core types shared by the evaluator and the natives.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::parser::scope::ScopeTree;
use crate::runner::config::EngineConfig;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::{ExecutionContext, ExecutionContextStack};
use crate::runner::ds::lex_env::{get_binding_value, JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::super_global::SuperGlobalEnvironment;
use crate::runner::std_lib::timers::TaskQueue;

/// Function signature for natives.
/// Natives receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

/// A host namespace such as `console`, reachable only through dotted paths.
#[derive(Clone)]
pub struct BuiltInObject {
    pub name: String,
    pub methods: HashMap<String, NativeFn>,
}

impl BuiltInObject {
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.insert(name.into(), func);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Everything one evaluation (or one REPL session) runs against.
pub struct EvalContext {
    pub config: EngineConfig,
    /// The single global scope instance.
    pub global_env: JsLexEnvironmentType,
    pub ctx_stack: ExecutionContextStack,
    pub super_global: SuperGlobalEnvironment,
    /// Captured console output, in emission order.
    pub output: Vec<LogLine>,
    pub task_queue: TaskQueue,
}

impl EvalContext {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, BuiltInRegistry::with_core())
    }

    pub fn with_registry(config: EngineConfig, registry: BuiltInRegistry) -> Self {
        let global_env = LexEnvironment::new_global_environment();
        let global = ExecutionContext::new_global(Rc::new(ScopeTree::new()), global_env.clone());
        EvalContext {
            ctx_stack: ExecutionContextStack::new(global, config.max_stack_depth),
            config,
            global_env,
            super_global: SuperGlobalEnvironment::new(registry),
            output: vec![],
            task_queue: TaskQueue::new(),
        }
    }

    pub fn running_execution_ctx(&self) -> &ExecutionContext {
        self.ctx_stack.get_running_execution_ctx()
    }

    /// Innermost scope instance of the running activation.
    pub fn lex_env(&self) -> JsLexEnvironmentType {
        self.ctx_stack.get_running_execution_ctx().lex_env.clone()
    }

    pub fn set_lex_env(&mut self, env: JsLexEnvironmentType) {
        self.ctx_stack.get_running_execution_ctx_mut().lex_env = env;
    }

    pub fn this_value(&self) -> JsValue {
        self.ctx_stack.get_running_execution_ctx().this_value.clone()
    }

    /// Resolves `name` from the running scope outward, natives last.
    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        match get_binding_value(&self.lex_env(), name)? {
            Some(value) => Ok(value),
            None => self
                .super_global
                .resolve_global(name)
                .ok_or_else(|| JErrorType::ReferenceUndeclaredError(name.to_string())),
        }
    }

    pub fn write_log(&mut self, level: LogLevel, text: String) {
        tracing::debug!(level = ?level, text = %text, "console output");
        self.output.push(LogLine { level, text });
    }

    /// Texts of everything logged so far.
    pub fn printed(&self) -> Vec<String> {
        self.output.iter().map(|line| line.text.to_string()).collect()
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
