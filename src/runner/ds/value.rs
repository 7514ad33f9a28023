use std::fmt;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::runner::ds::function_object::FunctionRef;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";

/// The closed set of values a binding can hold.
#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Function(FunctionRef),
}

impl JsValue {
    /// Result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => TYPE_STR_UNDEFINED,
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => !(n.is_nan() || *n == 0.0),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Function(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s),
            JsValue::Function(_) => f64::NAN,
        }
    }

    /// ToString; functions render as their console form.
    pub fn to_js_string(&self) -> String {
        self.to_string()
    }

    pub fn snapshot(&self) -> ValueSnapshot {
        match self {
            JsValue::Undefined => ValueSnapshot::Undefined,
            JsValue::Null => ValueSnapshot::Null,
            JsValue::Boolean(b) => ValueSnapshot::Boolean(*b),
            JsValue::Number(n) => ValueSnapshot::Number(*n),
            JsValue::String(s) => ValueSnapshot::String(s.to_string()),
            JsValue::Function(f) => ValueSnapshot::Function(f.name().to_string()),
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) =>
        {
            trimmed.parse::<f64>().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

/// Formats a number the way JavaScript prints it.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        exponent_form(n)
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// `1e+21`, `-2.5e-7`: shortest digits with an explicitly signed exponent.
fn exponent_form(n: f64) -> String {
    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
        _ => formatted,
    }
}

impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => f.write_str(TYPE_STR_UNDEFINED),
            JsValue::Null => f.write_str(TYPE_STR_NULL),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => f.write_str(&number_to_string(*n)),
            JsValue::String(s) => f.write_str(s),
            JsValue::Function(func) => {
                if func.name().is_empty() {
                    f.write_str("[Function (anonymous)]")
                } else {
                    write!(f, "[Function: {}]", func.name())
                }
            }
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::Number(n) => write!(f, "JsValue::Number({})", n),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Function(func) => write!(f, "JsValue::Function({:?})", func.name()),
        }
    }
}

/// Strict equality; functions compare by identity.
impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Function(a), JsValue::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Owned, environment-free copy of a value for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ValueSnapshot {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Function(String),
}
