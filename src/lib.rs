//! # jssim - JavaScript scope semantics simulator
//!
//! A small interpreter for a restricted JavaScript subset that makes the
//! engine's bookkeeping observable:
//! - Hoisting of `var`, function declarations and parameters
//! - Temporal dead zone for `let` and `const`
//! - Lexical scope chain with per-iteration loop scopes
//! - Closures capturing scope instances by reference
//! - A bounded call stack with stack traces on failure
//! - A virtual-time task queue behind `setTimeout`
//!
//! ## Quick Start
//!
//! ### Parsing JavaScript
//!
//! ```
//! use jssim::parser::JsParser;
//!
//! let code = "var x = 5 + 3;";
//! let ast = JsParser::parse_to_ast_from_str(code).unwrap();
//! println!("Parsed {} statements", ast.body.len());
//! ```
//!
//! ### Running a script
//!
//! ```
//! use jssim::runner::api::{evaluate, parse};
//!
//! let program = parse("console.log(x); var x = 1; console.log(x);").unwrap();
//! let outcome = evaluate(&program);
//! assert_eq!(outcome.printed(), vec!["undefined", "1"]);
//! ```
//!
//! ### Observing errors
//!
//! Runtime errors carry the call stack as it was when they were raised,
//! innermost frame first.
//!
//! ```
//! use jssim::runner::api::{evaluate, parse};
//! use jssim::runner::ds::error::ErrorKind;
//!
//! let program = parse("function f() { return y; let y = 1; } f();").unwrap();
//! let outcome = evaluate(&program);
//! assert_eq!(outcome.error_kind(), Some(ErrorKind::TdzError));
//! assert_eq!(outcome.error().unwrap().stack_trace, vec!["f", "<global>"]);
//! ```
//!
//! ## Super-Global Scope
//!
//! Natives such as `console.log` and `setTimeout` are not bindings of the
//! global scope. They live in a super-global layer consulted only after
//! the whole scope chain misses, and are materialized on first use. Script
//! code can shadow them but never mutate them.
//!
//! ```
//! use jssim::runner::api::{parse, Interpreter};
//! use jssim::runner::config::EngineConfig;
//! use jssim::runner::ds::error::JErrorType;
//! use jssim::runner::ds::value::JsValue;
//! use jssim::runner::plugin::registry::BuiltInRegistry;
//! use jssim::runner::plugin::types::{BuiltInObject, EvalContext};
//!
//! fn triple(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
//!     let n = args.first().map(|v| v.to_number()).unwrap_or(0.0);
//!     Ok(JsValue::Number(n * 3.0))
//! }
//!
//! let mut registry = BuiltInRegistry::with_core();
//! registry.register_object(BuiltInObject::new("MyMath").add_method("triple", triple));
//!
//! let mut interpreter = Interpreter::with_registry(EngineConfig::default(), registry);
//! let outcome = interpreter.run(&parse("var result = MyMath.triple(7);").unwrap());
//! assert!(outcome.is_ok());
//! assert_eq!(interpreter.get_binding("result").unwrap(), JsValue::Number(21.0));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser, AST and static scope tree
//! - **[`runner`]** - Tree-walking evaluator
//!   - **[`runner::ds`]** - Values, bindings, scope instances, activations
//!   - **[`runner::eval`]** - Hoisting, statements, expressions, calls
//!   - **[`runner::plugin`]** - Native registry and super-global scope
//!   - **[`runner::std_lib`]** - `console` and timer natives

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;

pub use runner::api::{evaluate, evaluate_with_config, parse, run_source, Interpreter, Outcome};
pub use runner::config::EngineConfig;
