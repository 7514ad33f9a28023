mod api;
pub mod ast;
pub mod scope;
mod static_semantics;
#[allow(non_fmt_panics)]
#[cfg(test)]
mod unit_tests;

pub use api::JsParser;
