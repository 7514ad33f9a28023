//! Entry points: parse, evaluate, and an [`Interpreter`] that keeps its
//! global scope between scripts.

use std::collections::BTreeMap;
use std::io;
use std::thread;

use serde::Serialize;
use tracing::{debug, warn};

use crate::parser::ast::ProgramData;
use crate::parser::JsParser;
use crate::runner::config::EngineConfig;
use crate::runner::ds::env_record::BindingSnapshot;
use crate::runner::ds::error::{ErrorKind, JErrorType, JsRuntimeError};
use crate::runner::ds::execution_context::ActivationState;
use crate::runner::ds::value::{JsValue, ValueSnapshot};
use crate::runner::eval::hoisting::instantiate_declarations;
use crate::runner::eval::statement::execute_statements;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{EvalContext, LogLine};
use crate::runner::std_lib::timers::run_pending_tasks;

/// Parses source text into a program ready to evaluate.
pub fn parse(source: &str) -> Result<ProgramData, JErrorType> {
    JsParser::parse_to_ast_from_str(source)
}

/// What one evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Console output of this evaluation, in order.
    pub log: Vec<LogLine>,
    /// Completion value of the script, or the error that halted it.
    pub result: Result<ValueSnapshot, JsRuntimeError>,
    /// Global bindings once evaluation stopped.
    pub globals: BTreeMap<String, BindingSnapshot>,
}

impl Outcome {
    pub fn printed(&self) -> Vec<String> {
        self.log.iter().map(|line| line.text.to_string()).collect()
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&JsRuntimeError> {
        self.result.as_ref().err()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.kind())
    }

    pub fn report(&self) -> OutcomeReport {
        let (value, error) = match &self.result {
            Ok(value) => (Some(value.clone()), None),
            Err(e) => (
                None,
                Some(ErrorReport {
                    kind: e.kind(),
                    message: e.error.message(),
                    stack_trace: e.stack_trace.clone(),
                }),
            ),
        };
        OutcomeReport {
            log: self.log.clone(),
            value,
            error,
            globals: self.globals.clone(),
        }
    }
}

/// Serializable form of an [`Outcome`].
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReport {
    pub log: Vec<LogLine>,
    pub value: Option<ValueSnapshot>,
    pub error: Option<ErrorReport>,
    pub globals: BTreeMap<String, BindingSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub stack_trace: Vec<String>,
}

/// Evaluates `program` against a fresh global scope with the default config.
pub fn evaluate(program: &ProgramData) -> Outcome {
    evaluate_with_config(program, &EngineConfig::default())
}

pub fn evaluate_with_config(program: &ProgramData, config: &EngineConfig) -> Outcome {
    Interpreter::new(config.clone()).run(program)
}

/// Parses and evaluates `source` on a thread whose stack is
/// `config.host_stack_bytes`.
pub fn run_source(source: &str, config: &EngineConfig) -> io::Result<Outcome> {
    let source = source.to_string();
    let config = config.clone();
    with_evaluation_stack(config.host_stack_bytes, move || {
        Interpreter::new(config).run_source(&source)
    })
}

/// Runs `f` on a dedicated thread with a `stack_bytes` stack and waits for it.
pub fn with_evaluation_stack<F, T>(stack_bytes: usize, f: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = thread::Builder::new()
        .name("jssim-eval".to_string())
        .stack_size(stack_bytes)
        .spawn(f)?;
    handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "evaluation thread panicked"))
}

/// Evaluates scripts one after another against one global scope.
pub struct Interpreter {
    ctx: EvalContext,
}

impl Interpreter {
    pub fn new(config: EngineConfig) -> Self {
        Interpreter {
            ctx: EvalContext::new(config),
        }
    }

    /// An interpreter whose natives come from `registry` instead of the core set.
    pub fn with_registry(config: EngineConfig, registry: BuiltInRegistry) -> Self {
        Interpreter {
            ctx: EvalContext::with_registry(config, registry),
        }
    }

    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    pub fn run(&mut self, program: &ProgramData) -> Outcome {
        let first_line = self.ctx.output.len();
        let result = run_program(program, &mut self.ctx);
        match &result {
            Ok(_) => debug!(log_lines = self.ctx.output.len() - first_line, "evaluation finished"),
            Err(e) => warn!(error = %e.error, trace = ?e.stack_trace, "evaluation failed"),
        }
        Outcome {
            log: self.ctx.output[first_line..].to_vec(),
            result: result.map(|value| value.snapshot()),
            globals: self.ctx.global_env.borrow().inner.snapshot(),
        }
    }

    /// Parses and runs `source`; a parse failure is reported as the outcome.
    pub fn run_source(&mut self, source: &str) -> Outcome {
        match parse(source) {
            Ok(program) => self.run(&program),
            Err(error) => Outcome {
                log: vec![],
                result: Err(error.into()),
                globals: self.ctx.global_env.borrow().inner.snapshot(),
            },
        }
    }

    /// Reads a global (or native) the way script code would.
    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        self.ctx.get_binding(name)
    }
}

fn run_program(program: &ProgramData, ctx: &mut EvalContext) -> Result<JsValue, JsRuntimeError> {
    {
        let global_env = ctx.global_env.clone();
        let global = ctx.ctx_stack.get_global_execution_ctx_mut();
        global.code = program.scope_tree.clone();
        global.lex_env = global_env;
        global.state = ActivationState::Running;
    }
    let global_env = ctx.global_env.clone();
    let result = instantiate_declarations(program.scope, &global_env, ctx)
        .map_err(JsRuntimeError::from)
        .and_then(|_| execute_statements(&program.body, ctx))
        .and_then(|completion| {
            run_pending_tasks(ctx)?;
            Ok(completion.get_value())
        });
    result.map_err(|mut error| {
        ctx.task_queue.clear();
        if !error.has_trace() {
            error.stack_trace = ctx.ctx_stack.stack_trace();
        }
        error
    })
}
