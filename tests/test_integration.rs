//! End-to-end tests: interpreter sessions, reports and configuration.

extern crate jssim;

use std::io::Write;

use jssim::runner::api::{parse, run_source, with_evaluation_stack, Interpreter};
use jssim::runner::config::EngineConfig;
use jssim::runner::ds::error::ErrorKind;
use jssim::runner::ds::value::{JsValue, ValueSnapshot};
use jssim::runner::plugin::types::LogLevel;
use serde_json::json;

// ============================================================================
// Completion values and output
// ============================================================================

#[test]
fn test_completion_value_is_last_expression() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    assert_eq!(interpreter.run_source("1 + 2").result, Ok(ValueSnapshot::Number(3.0)));
    assert_eq!(interpreter.run_source("var x = 5;").result, Ok(ValueSnapshot::Undefined));
    assert_eq!(
        interpreter.run_source("'a' + 1").result,
        Ok(ValueSnapshot::String("a1".to_string()))
    );
    assert_eq!(
        interpreter.run_source("function named() {} named").result,
        Ok(ValueSnapshot::Function("named".to_string()))
    );
}

#[test]
fn test_console_levels_are_kept() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let outcome = interpreter.run_source("console.log('a', 1, true); console.warn('w'); console.error(null);");
    let levels: Vec<LogLevel> = outcome.log.iter().map(|line| line.level).collect();
    assert_eq!(levels, vec![LogLevel::Log, LogLevel::Warn, LogLevel::Error]);
    assert_eq!(outcome.printed(), vec!["a 1 true", "w", "null"]);
}

#[test]
fn test_console_can_be_shadowed_but_not_replaced() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let outcome = interpreter.run_source("var console = 1; console.log('x');");
    assert_eq!(outcome.error_kind(), Some(ErrorKind::TypeError));
    assert!(outcome.printed().is_empty());
}

#[test]
fn test_unknown_namespace_is_undeclared() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let outcome = interpreter.run_source("Math.abs(1);");
    assert_eq!(outcome.error_kind(), Some(ErrorKind::ReferenceUndeclaredError));
}

// ============================================================================
// Interpreter sessions
// ============================================================================

#[test]
fn test_globals_persist_across_runs() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    assert!(interpreter.run_source("let a = 1; function twice(n) { return n * 2; }").is_ok());
    let outcome = interpreter.run_source("console.log(twice(a));");
    assert_eq!(outcome.printed(), vec!["2"]);
    assert_eq!(interpreter.get_binding("a").unwrap(), JsValue::Number(1.0));
}

#[test]
fn test_lexical_redeclaration_across_runs_is_rejected() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    assert!(interpreter.run_source("let a = 1;").is_ok());
    let outcome = interpreter.run_source("console.log('runs?'); let a = 2;");
    assert_eq!(outcome.error_kind(), Some(ErrorKind::SyntaxError));
    assert!(outcome.printed().is_empty());
    assert_eq!(interpreter.get_binding("a").unwrap(), JsValue::Number(1.0));

    let outcome = interpreter.run_source("var a;");
    assert_eq!(outcome.error_kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_session_recovers_after_errors() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    assert!(!interpreter.run_source("function f() { { let b = 1; missing(); } } f();").is_ok());
    assert!(!interpreter.run_source("let = ;").is_ok());
    let outcome = interpreter.run_source("var ok = 'fine'; console.log(ok);");
    assert_eq!(outcome.printed(), vec!["fine"]);
    assert_eq!(interpreter.context().ctx_stack.depth(), 1);
}

#[test]
fn test_log_is_per_run() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    interpreter.run_source("console.log('one');");
    let outcome = interpreter.run_source("console.log('two');");
    assert_eq!(outcome.printed(), vec!["two"]);
    assert_eq!(interpreter.context().printed(), vec!["one", "two"]);
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_json_report_of_tdz_failure() {
    let outcome = run_source("console.log('start'); x; let x = 1;", &EngineConfig::default()).unwrap();
    let report = serde_json::to_value(outcome.report()).unwrap();
    assert_eq!(
        report,
        json!({
            "log": [{ "level": "log", "text": "start" }],
            "value": null,
            "error": {
                "kind": "TDZError",
                "message": "Cannot access 'x' before initialization",
                "stack_trace": ["<global>"]
            },
            "globals": {
                "x": { "kind": "let", "state": "Uninitialized", "value": null }
            }
        })
    );
}

#[test]
fn test_json_report_of_success() {
    let outcome = run_source("var n = 2; n * 21", &EngineConfig::default()).unwrap();
    let report = serde_json::to_value(outcome.report()).unwrap();
    assert_eq!(report["value"], json!({ "type": "number", "value": 42.0 }));
    assert_eq!(report["error"], json!(null));
    assert_eq!(
        report["globals"]["n"],
        json!({ "kind": "var", "state": "Initialized", "value": { "type": "number", "value": 2.0 } })
    );
}

#[test]
fn test_parse_errors_become_outcomes() {
    let outcome = run_source("let x = ;", &EngineConfig::default()).unwrap();
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::SyntaxError);
    assert!(error.stack_trace.is_empty());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_drives_engine() {
    let path = std::env::temp_dir().join(format!("jssim-config-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "max_stack_depth = 4").unwrap();
        writeln!(file, "legacy_implicit_globals = true").unwrap();
    }
    let config = EngineConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.max_stack_depth, 4);

    let outcome = run_source("function r() { r(); } leaked = 1; r();", &config).unwrap();
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::StackOverflowError);
    assert_eq!(error.stack_trace.len(), 4);
    assert!(outcome.globals.contains_key("leaked"));
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(EngineConfig::from_toml_str("max_stack_depth = \"deep\"").is_err());
    assert!(EngineConfig::from_toml_str("unknown_key = 1").is_err());
    assert!(EngineConfig::default().with_max_stack_depth(0).validate().is_err());
}

#[test]
fn test_evaluation_stack_runs_interpreter_on_worker() {
    let printed = with_evaluation_stack(16 * 1024 * 1024, || {
        let mut interpreter = Interpreter::new(EngineConfig::default().with_max_stack_depth(50));
        let program = parse("function down(n) { if (n > 0) { down(n - 1); } else { console.log('bottom'); } } down(40);")
            .unwrap();
        interpreter.run(&program).printed()
    })
    .unwrap();
    assert_eq!(printed, vec!["bottom"]);
}
