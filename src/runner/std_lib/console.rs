//! Console natives.
//!
//! Provides console.log, console.info, console.warn and console.error, plus
//! the bare `log` and `print` shorthands. Output is captured on the context
//! instead of being written to stdout.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, LogLevel};

/// Register the console namespace and the bare logging globals.
pub fn register(registry: &mut BuiltInRegistry) {
    let console = BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("info", console_info)
        .add_method("warn", console_warn)
        .add_method("error", console_error);

    registry.register_object(console);
    registry.register_global("log", console_log);
    registry.register_global("print", console_log);
}

/// Format all arguments for console output.
fn format_args(args: &[JsValue]) -> String {
    args.iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn console_log(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.write_log(LogLevel::Log, format_args(&args));
    Ok(JsValue::Undefined)
}

fn console_info(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.write_log(LogLevel::Info, format_args(&args));
    Ok(JsValue::Undefined)
}

fn console_warn(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.write_log(LogLevel::Warn, format_args(&args));
    Ok(JsValue::Undefined)
}

fn console_error(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    ctx.write_log(LogLevel::Error, format_args(&args));
    Ok(JsValue::Undefined)
}
