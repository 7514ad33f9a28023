//! Expression evaluation.

use std::rc::Rc;

use tracing::debug;

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionType, FunctionData, IdentifierData, LiteralData,
    LiteralType, LogicalOperator, UnaryOperator, UpdateOperator,
};
use crate::parser::scope::DeclarationKind;
use crate::runner::ds::error::{JErrorType, JsRuntimeError};
use crate::runner::ds::lex_env::{get_binding_value, set_binding_value, LexEnvironment};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::function::{call_function, instantiate_function_object};
use super::types::ValueResult;

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expression: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expression {
        ExpressionType::Literal(literal) => Ok(evaluate_literal(literal)),
        ExpressionType::Identifier(id) => resolve_identifier(&id.name, ctx),
        ExpressionType::MemberPath {
            object, properties, ..
        } => evaluate_member_path(object, properties, ctx),
        ExpressionType::ThisExpression { .. } => Ok(ctx.this_value()),
        ExpressionType::FunctionExpression(data) => Ok(evaluate_function_expression(data, None, ctx)),
        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(*operator, argument, ctx),
        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => evaluate_update_expression(*operator, argument, *prefix, ctx),
        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let left = evaluate_expression(left, ctx)?;
            let right = evaluate_expression(right, ctx)?;
            Ok(apply_binary_operator(*operator, &left, &right))
        }
        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let left = evaluate_expression(left, ctx)?;
            let short_circuit = match operator {
                LogicalOperator::And => !left.to_boolean(),
                LogicalOperator::Or => left.to_boolean(),
            };
            if short_circuit {
                Ok(left)
            } else {
                evaluate_expression(right, ctx)
            }
        }
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if evaluate_expression(test, ctx)?.to_boolean() {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }
        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment_expression(*operator, left, right, ctx),
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => evaluate_call_expression(callee, arguments, ctx),
    }
}

/// Like [`evaluate_expression`], but an anonymous function expression takes
/// `name` as its name (`var f = function () {}` is named `f`).
pub fn evaluate_named_expression(expression: &ExpressionType, name: &str, ctx: &mut EvalContext) -> ValueResult {
    match expression {
        ExpressionType::FunctionExpression(data) if data.id.is_none() => {
            Ok(evaluate_function_expression(data, Some(name), ctx))
        }
        _ => evaluate_expression(expression, ctx),
    }
}

fn evaluate_literal(literal: &LiteralData) -> JsValue {
    match &literal.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::UndefinedLiteral => JsValue::Undefined,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NumberLiteral(n) => JsValue::Number(*n),
        LiteralType::StringLiteral(s) => JsValue::String(s.to_string()),
    }
}

/// Current scope, captured outer scopes, global, then natives.
pub fn resolve_identifier(name: &str, ctx: &mut EvalContext) -> ValueResult {
    Ok(ctx.get_binding(name)?)
}

/// Writes through the scope chain. An undeclared target fails unless
/// implicit globals are enabled, in which case it becomes a global `var`.
pub fn assign_identifier(name: &str, value: JsValue, ctx: &mut EvalContext) -> Result<(), JsRuntimeError> {
    if set_binding_value(&ctx.lex_env(), name, value.clone())? {
        return Ok(());
    }
    if !ctx.config.legacy_implicit_globals {
        return Err(JErrorType::ReferenceUndeclaredError(name.to_string()).into());
    }
    debug!(name, "implicit global created");
    ctx.global_env.borrow_mut().inner.create_initialized_binding(
        name.to_string(),
        DeclarationKind::Var,
        value,
    );
    Ok(())
}

fn evaluate_member_path(object: &IdentifierData, properties: &[String], ctx: &mut EvalContext) -> ValueResult {
    let property = match properties.first() {
        Some(property) => property,
        None => return resolve_identifier(&object.name, ctx),
    };
    // A user binding shadows the host namespace, and user values have no properties.
    if let Some(value) = get_binding_value(&ctx.lex_env(), &object.name)? {
        return Err(property_read_error(&value, property).into());
    }
    let mut value = match ctx.super_global.resolve_member(&object.name, property) {
        Some(value) => value,
        None => return Err(JErrorType::ReferenceUndeclaredError(object.name.to_string()).into()),
    };
    for property in &properties[1..] {
        match value {
            JsValue::Undefined | JsValue::Null => return Err(property_read_error(&value, property).into()),
            _ => value = JsValue::Undefined,
        }
    }
    Ok(value)
}

fn property_read_error(value: &JsValue, property: &str) -> JErrorType {
    JErrorType::TypeError(format!(
        "Cannot read properties of {} (reading '{}')",
        value.type_of(),
        property
    ))
}

fn evaluate_function_expression(data: &Rc<FunctionData>, name_hint: Option<&str>, ctx: &mut EvalContext) -> JsValue {
    let code = ctx.running_execution_ctx().code.clone();
    let env = ctx.lex_env();
    match &data.id {
        // A named function expression sees its own name through an extra
        // scope that nothing else can reach.
        Some(id) if !data.is_arrow => {
            let func_env = LexEnvironment::new_declarative_environment(None, env);
            let closure = instantiate_function_object(data, None, func_env.clone(), code, ctx);
            func_env.borrow_mut().inner.create_initialized_binding(
                id.name.to_string(),
                DeclarationKind::Function,
                closure.clone(),
            );
            closure
        }
        _ => instantiate_function_object(data, name_hint, env, code, ctx),
    }
}

fn evaluate_unary_expression(operator: UnaryOperator, argument: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    if operator == UnaryOperator::TypeOf {
        if let ExpressionType::Identifier(id) = argument {
            // Undeclared names are "undefined"; TDZ still applies.
            return match ctx.get_binding(&id.name) {
                Ok(value) => Ok(JsValue::String(value.type_of().to_string())),
                Err(JErrorType::ReferenceUndeclaredError(_)) => Ok(JsValue::String("undefined".to_string())),
                Err(e) => Err(e.into()),
            };
        }
    }
    let value = evaluate_expression(argument, ctx)?;
    Ok(match operator {
        UnaryOperator::Minus => JsValue::Number(-value.to_number()),
        UnaryOperator::Plus => JsValue::Number(value.to_number()),
        UnaryOperator::LogicalNot => JsValue::Boolean(!value.to_boolean()),
        UnaryOperator::TypeOf => JsValue::String(value.type_of().to_string()),
    })
}

fn evaluate_update_expression(
    operator: UpdateOperator,
    argument: &IdentifierData,
    prefix: bool,
    ctx: &mut EvalContext,
) -> ValueResult {
    let old = resolve_identifier(&argument.name, ctx)?.to_number();
    let new = match operator {
        UpdateOperator::PlusPlus => old + 1.0,
        UpdateOperator::MinusMinus => old - 1.0,
    };
    assign_identifier(&argument.name, JsValue::Number(new), ctx)?;
    Ok(JsValue::Number(if prefix { new } else { old }))
}

fn evaluate_assignment_expression(
    operator: AssignmentOperator,
    left: &IdentifierData,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let value = match operator {
        AssignmentOperator::Equals => evaluate_named_expression(right, &left.name, ctx)?,
        _ => {
            let current = resolve_identifier(&left.name, ctx)?;
            let right = evaluate_expression(right, ctx)?;
            let binary = match operator {
                AssignmentOperator::AddEquals => BinaryOperator::Add,
                AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
                AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
                AssignmentOperator::DivideEquals => BinaryOperator::Divide,
                _ => BinaryOperator::Modulo,
            };
            apply_binary_operator(binary, &current, &right)
        }
    };
    assign_identifier(&left.name, value.clone(), ctx)?;
    Ok(value)
}

fn evaluate_call_expression(
    callee: &ExpressionType,
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> ValueResult {
    let function = evaluate_expression(callee, ctx)?;
    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(evaluate_expression(argument, ctx)?);
    }
    match function {
        JsValue::Function(f) => call_function(&f, JsValue::Undefined, args, ctx),
        other => Err(JErrorType::TypeError(format!(
            "{} is not a function (got {})",
            callee_text(callee),
            other.type_of()
        ))
        .into()),
    }
}

fn callee_text(callee: &ExpressionType) -> String {
    match callee {
        ExpressionType::Identifier(id) => id.name.to_string(),
        ExpressionType::MemberPath {
            object, properties, ..
        } => format!("{}.{}", object.name, properties.join(".")),
        ExpressionType::CallExpression { callee, .. } => format!("{}(...)", callee_text(callee)),
        _ => "expression".to_string(),
    }
}

/// Applies a binary operator to two already evaluated operands.
pub fn apply_binary_operator(operator: BinaryOperator, left: &JsValue, right: &JsValue) -> JsValue {
    match operator {
        BinaryOperator::Add => add_values(left, right),
        BinaryOperator::Subtract => JsValue::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => JsValue::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => JsValue::Number(left.to_number() / right.to_number()),
        BinaryOperator::Modulo => JsValue::Number(left.to_number() % right.to_number()),
        BinaryOperator::LessThan => compare_values(left, right, |a, b| a < b, |a, b| a < b),
        BinaryOperator::GreaterThan => compare_values(left, right, |a, b| a > b, |a, b| a > b),
        BinaryOperator::LessThanEqual => compare_values(left, right, |a, b| a <= b, |a, b| a <= b),
        BinaryOperator::GreaterThanEqual => compare_values(left, right, |a, b| a >= b, |a, b| a >= b),
        BinaryOperator::StrictlyEqual => JsValue::Boolean(left == right),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(left != right),
        BinaryOperator::LooselyEqual => JsValue::Boolean(loose_equality(left, right)),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!loose_equality(left, right)),
    }
}

fn add_values(left: &JsValue, right: &JsValue) -> JsValue {
    match (left, right) {
        (JsValue::String(_), _) | (_, JsValue::String(_)) | (JsValue::Function(_), _) | (_, JsValue::Function(_)) => {
            JsValue::String(format!("{}{}", left.to_js_string(), right.to_js_string()))
        }
        _ => JsValue::Number(left.to_number() + right.to_number()),
    }
}

/// Strings compare lexicographically, everything else numerically; NaN
/// makes every comparison false.
fn compare_values<S, N>(left: &JsValue, right: &JsValue, string_cmp: S, number_cmp: N) -> JsValue
where
    S: Fn(&str, &str) -> bool,
    N: Fn(f64, f64) -> bool,
{
    if let (JsValue::String(a), JsValue::String(b)) = (left, right) {
        return JsValue::Boolean(string_cmp(a.as_str(), b.as_str()));
    }
    JsValue::Boolean(number_cmp(left.to_number(), right.to_number()))
}

fn loose_equality(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        (JsValue::Function(_), _) | (_, JsValue::Function(_)) => left == right,
        (JsValue::String(a), JsValue::String(b)) => a == b,
        _ => left.to_number() == right.to_number(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> JsValue {
        JsValue::String(v.to_string())
    }

    #[test]
    fn addition_concatenates_when_either_side_is_a_string() {
        assert_eq!(apply_binary_operator(BinaryOperator::Add, &s("a"), &JsValue::Number(1.0)), s("a1"));
        assert_eq!(
            apply_binary_operator(BinaryOperator::Add, &JsValue::Number(1.0), &JsValue::Boolean(true)),
            JsValue::Number(2.0)
        );
        assert_eq!(apply_binary_operator(BinaryOperator::Add, &JsValue::Undefined, &s("")), s("undefined"));
    }

    #[test]
    fn loose_and_strict_equality() {
        assert!(loose_equality(&JsValue::Null, &JsValue::Undefined));
        assert!(loose_equality(&s("1"), &JsValue::Number(1.0)));
        assert!(!loose_equality(&JsValue::Null, &JsValue::Number(0.0)));
        assert_eq!(
            apply_binary_operator(BinaryOperator::StrictlyEqual, &s("1"), &JsValue::Number(1.0)),
            JsValue::Boolean(false)
        );
        assert_eq!(
            apply_binary_operator(
                BinaryOperator::StrictlyEqual,
                &JsValue::Number(f64::NAN),
                &JsValue::Number(f64::NAN)
            ),
            JsValue::Boolean(false)
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(apply_binary_operator(BinaryOperator::LessThan, &s("a"), &s("b")), JsValue::Boolean(true));
        assert_eq!(
            apply_binary_operator(BinaryOperator::LessThan, &s("10"), &JsValue::Number(9.0)),
            JsValue::Boolean(false)
        );
        assert_eq!(
            apply_binary_operator(BinaryOperator::GreaterThanEqual, &JsValue::Undefined, &JsValue::Number(0.0)),
            JsValue::Boolean(false)
        );
    }
}
