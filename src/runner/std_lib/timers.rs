//! `setTimeout`, `schedule` and `clearTimeout` over a virtual clock.
//!
//! Nothing runs concurrently: callbacks wait in the queue until the main
//! program has finished, then run one at a time in (due time, enqueue order).
//! Running a callback advances the clock to its due time, so a callback that
//! schedules another with delay `d` lands `d` after itself.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::runner::ds::error::{JErrorType, JsRuntimeError};
use crate::runner::ds::function_object::FunctionRef;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

pub struct Task {
    pub id: u64,
    pub due: u64,
    pub callback: FunctionRef,
    pub args: Vec<JsValue>,
}

#[derive(Default)]
pub struct TaskQueue {
    clock: u64,
    next_seq: u64,
    next_id: u64,
    pending: BTreeMap<(u64, u64), Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        TaskQueue::default()
    }

    pub fn now(&self) -> u64 {
        self.clock
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queues `callback` to run `delay` ticks from now; returns its id.
    pub fn enqueue(&mut self, callback: FunctionRef, delay: u64, args: Vec<JsValue>) -> u64 {
        self.next_id += 1;
        self.next_seq += 1;
        let due = self.clock.saturating_add(delay);
        let id = self.next_id;
        self.pending.insert(
            (due, self.next_seq),
            Task {
                id,
                due,
                callback,
                args,
            },
        );
        id
    }

    /// Drops a pending task; returns whether one was removed.
    pub fn cancel(&mut self, id: u64) -> bool {
        let key = self
            .pending
            .iter()
            .find(|(_, task)| task.id == id)
            .map(|(key, _)| *key);
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Takes the earliest task and advances the clock to it.
    pub fn next_task(&mut self) -> Option<Task> {
        let (_, task) = self.pending.pop_first()?;
        self.clock = task.due;
        Some(task)
    }
}

/// Register the timer natives.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_global("setTimeout", set_timeout);
    registry.register_global("schedule", schedule);
    registry.register_global("clearTimeout", clear_timeout);
}

fn callback_arg(args: &[JsValue], native: &str) -> Result<FunctionRef, JErrorType> {
    match args.first() {
        Some(JsValue::Function(f)) => Ok(f.clone()),
        Some(other) => Err(JErrorType::TypeError(format!(
            "{}: callback must be a function, got {}",
            native,
            other.type_of()
        ))),
        None => Err(JErrorType::TypeError(format!(
            "{}: callback must be a function, got undefined",
            native
        ))),
    }
}

fn to_delay(value: Option<&JsValue>) -> u64 {
    let delay = value.map(|v| v.to_number()).unwrap_or(0.0);
    if delay.is_nan() || delay <= 0.0 {
        0
    } else {
        delay.floor() as u64
    }
}

fn set_timeout(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "setTimeout")?;
    let delay = to_delay(args.get(1));
    let extra = args.iter().skip(2).cloned().collect();
    let id = ctx.task_queue.enqueue(callback, delay, extra);
    debug!(id, delay, "setTimeout");
    Ok(JsValue::Number(id as f64))
}

fn schedule(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "schedule")?;
    let id = ctx.task_queue.enqueue(callback, 0, vec![]);
    debug!(id, "schedule");
    Ok(JsValue::Number(id as f64))
}

fn clear_timeout(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    if let Some(JsValue::Number(n)) = args.first() {
        if *n >= 0.0 && n.fract() == 0.0 {
            ctx.task_queue.cancel(*n as u64);
        }
    }
    Ok(JsValue::Undefined)
}

/// Runs queued callbacks until the queue is empty, each as a fresh call from
/// the global activation. The first failing callback stops the drain, and so
/// does a queue that is still non-empty after `max_tasks` callbacks.
pub fn run_pending_tasks(ctx: &mut EvalContext) -> Result<(), JsRuntimeError> {
    let limit = ctx.config.max_tasks;
    let mut ran = 0;
    while let Some(task) = ctx.task_queue.next_task() {
        if ran == limit {
            warn!(limit, pending = ctx.task_queue.len() + 1, "task limit reached");
            return Err(JErrorType::TaskLimitError(limit).into());
        }
        ran += 1;
        debug!(id = task.id, due = task.due, callback = task.callback.name(), "run task");
        call_function(&task.callback, JsValue::Undefined, task.args, ctx)?;
    }
    Ok(())
}
