//! Call stack, stack trace and task queue tests.

extern crate jssim;

use jssim::runner::api::{evaluate, evaluate_with_config, parse, run_source, Interpreter, Outcome};
use jssim::runner::config::EngineConfig;
use jssim::runner::ds::error::{ErrorKind, JErrorType};
use jssim::runner::ds::value::ValueSnapshot;

fn run(code: &str) -> Outcome {
    let program = parse(code).unwrap_or_else(|e| panic!("parse failed: {}", e));
    evaluate(&program)
}

fn run_with_depth(code: &str, depth: usize) -> Outcome {
    let program = parse(code).unwrap_or_else(|e| panic!("parse failed: {}", e));
    evaluate_with_config(&program, &EngineConfig::default().with_max_stack_depth(depth))
}

// ============================================================================
// Stack traces
// ============================================================================

#[test]
fn test_trace_lists_frames_innermost_first() {
    let outcome = run(
        "function a() { b(); }
         function b() { c(); }
         function c() { return missing; }
         a();",
    );
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::ReferenceUndeclaredError);
    assert_eq!(error.stack_trace, vec!["c", "b", "a", "<global>"]);
}

#[test]
fn test_anonymous_frames_are_marked() {
    let outcome = run("(function () { return nothing; })();");
    assert_eq!(outcome.error().unwrap().stack_trace, vec!["<anonymous>", "<global>"]);
}

#[test]
fn test_assigned_function_frames_use_variable_name() {
    let outcome = run("var handler = function () { return nothing; }; handler();");
    assert_eq!(outcome.error().unwrap().stack_trace, vec!["handler", "<global>"]);
}

#[test]
fn test_calling_non_function_is_type_error() {
    let outcome = run("var n = 3; function f() { n(); } f();");
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::TypeError);
    assert_eq!(error.error.message(), "n is not a function (got number)");
    assert_eq!(error.stack_trace, vec!["f", "<global>"]);
}

#[test]
fn test_report_renders_uncaught_error() {
    let outcome = run("function boom() { return y; } boom();");
    assert_eq!(
        outcome.error().unwrap().report(),
        "Uncaught ReferenceUndeclaredError: y is not defined\n    at boom\n    at <global>"
    );
}

#[test]
fn test_error_stops_execution() {
    let outcome = run("console.log('before'); oops(); console.log('after');");
    assert_eq!(outcome.printed(), vec!["before"]);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::ReferenceUndeclaredError));
}

// ============================================================================
// Depth bound
// ============================================================================

#[test]
fn test_depth_bound_counts_global_activation() {
    let code = "function a() { return b(); } function b() { return 1; } console.log(a());";
    let outcome = run_with_depth(code, 3);
    assert_eq!(outcome.printed(), vec!["1"]);

    let outcome = run_with_depth(code, 2);
    let error = outcome.error().unwrap();
    assert_eq!(error.error, JErrorType::StackOverflowError(2));
    assert_eq!(error.stack_trace, vec!["a", "<global>"]);
}

#[test]
fn test_small_bound_overflow_trace_is_full_stack() {
    let outcome = run_with_depth("function r(n) { return r(n + 1); } r(0);", 5);
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::StackOverflowError);
    assert_eq!(error.stack_trace, vec!["r", "r", "r", "r", "<global>"]);
}

#[test]
fn test_default_bound_overflow() {
    let outcome = run_source("function f() { f(); } f();", &EngineConfig::default()).unwrap();
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::StackOverflowError);
    assert_eq!(error.error.message(), "Maximum call stack size exceeded (depth 1000)");
    assert_eq!(error.stack_trace.len(), 1000);
    assert_eq!(error.stack_trace.first().map(String::as_str), Some("f"));
    assert_eq!(error.stack_trace.last().map(String::as_str), Some("<global>"));
}

#[test]
fn test_default_bound_overflow_on_caller_thread() {
    let outcome = run("function f() { f(); } f();");
    let error = outcome.error().unwrap();
    assert_eq!(error.error, JErrorType::StackOverflowError(1000));
    assert_eq!(error.stack_trace.len(), 1000);
    assert!(error.stack_trace[..999].iter().all(|frame| frame == "f"));
    assert_eq!(error.stack_trace[999], "<global>");
}

#[test]
fn test_deep_recursion_on_caller_thread_succeeds() {
    let outcome = run("function down(n) { return n === 0 ? 'bottom' : down(n - 1); } down(998);");
    assert_eq!(outcome.result, Ok(ValueSnapshot::String("bottom".to_string())));
}

#[test]
fn test_zero_depth_still_runs_global_code() {
    let outcome = run_with_depth("console.log('top'); function f() {} f();", 0);
    assert_eq!(outcome.printed(), vec!["top"]);
    let error = outcome.error().unwrap();
    assert_eq!(error.error, JErrorType::StackOverflowError(1));
    assert_eq!(error.stack_trace, vec!["<global>"]);
}

#[test]
fn test_deep_recursion_below_bound_succeeds() {
    let outcome = run_source(
        "function sum(n) { return n === 0 ? 0 : n + sum(n - 1); } sum(500);",
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(outcome.result, Ok(ValueSnapshot::Number(125250.0)));
}

#[test]
fn test_stack_unwinds_after_overflow() {
    let mut interpreter = Interpreter::new(EngineConfig::default().with_max_stack_depth(10));
    let outcome = interpreter.run_source("function loop() { loop(); } loop();");
    assert_eq!(outcome.error_kind(), Some(ErrorKind::StackOverflowError));
    assert_eq!(interpreter.context().ctx_stack.depth(), 1);

    let outcome = interpreter.run_source("function twice(x) { return x * 2; } twice(21);");
    assert_eq!(outcome.result, Ok(ValueSnapshot::Number(42.0)));
}

// ============================================================================
// Task queue
// ============================================================================

#[test]
fn test_tasks_run_after_script_in_due_order() {
    let outcome = run(
        "setTimeout(function () { console.log('late'); }, 10);
         setTimeout(function () { console.log('early'); }, 0);
         schedule(function () { console.log('scheduled'); });
         console.log('sync');",
    );
    assert_eq!(outcome.printed(), vec!["sync", "early", "scheduled", "late"]);
}

#[test]
fn test_tasks_can_enqueue_tasks() {
    let outcome = run(
        "setTimeout(function () { console.log('first'); setTimeout(function () { console.log('third'); }, 5); }, 1);
         setTimeout(function () { console.log('second'); }, 3);",
    );
    assert_eq!(outcome.printed(), vec!["first", "second", "third"]);
}

#[test]
fn test_timeout_passes_extra_arguments() {
    let outcome = run("setTimeout(function (a, b) { console.log(a + b); }, 0, 2, 3);");
    assert_eq!(outcome.printed(), vec!["5"]);
}

#[test]
fn test_cleared_timeout_never_runs() {
    let outcome = run(
        "var id = setTimeout(function () { console.log('cancelled'); }, 5);
         clearTimeout(id);
         console.log('done');",
    );
    assert_eq!(outcome.printed(), vec!["done"]);
}

#[test]
fn test_failing_task_reports_its_own_trace() {
    let outcome = run("setTimeout(function tick() { return nope; }, 0); console.log('main');");
    assert_eq!(outcome.printed(), vec!["main"]);
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::ReferenceUndeclaredError);
    assert_eq!(error.stack_trace, vec!["tick", "<global>"]);
}

#[test]
fn test_failed_script_drops_pending_tasks() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let outcome = interpreter.run_source("setTimeout(function () { console.log('never'); }, 0); broken();");
    assert!(outcome.printed().is_empty());
    assert_eq!(outcome.error_kind(), Some(ErrorKind::ReferenceUndeclaredError));
    assert!(interpreter.context().task_queue.is_empty());
}

#[test]
fn test_non_function_callback_is_type_error() {
    let outcome = run("setTimeout('code', 0);");
    assert_eq!(outcome.error_kind(), Some(ErrorKind::TypeError));
}

#[test]
fn test_self_rescheduling_task_hits_task_limit() {
    let program = parse("var runs = 0; function tick() { runs++; schedule(tick); } schedule(tick);").unwrap();
    let outcome = evaluate_with_config(&program, &EngineConfig::default().with_max_tasks(50));
    let error = outcome.error().unwrap();
    assert_eq!(error.error, JErrorType::TaskLimitError(50));
    assert_eq!(error.stack_trace, vec!["<global>"]);
    assert_eq!(outcome.globals["runs"].value, Some(ValueSnapshot::Number(50.0)));
}

#[test]
fn test_task_chain_within_limit_completes() {
    let program = parse("var runs = 0; function tick() { runs++; if (runs < 10) schedule(tick); } schedule(tick);").unwrap();
    let outcome = evaluate_with_config(&program, &EngineConfig::default().with_max_tasks(10));
    assert!(outcome.is_ok(), "{:?}", outcome.error());
    assert_eq!(outcome.globals["runs"].value, Some(ValueSnapshot::Number(10.0)));
}
