//! Parser integration tests through the public API.

extern crate jssim;

use jssim::parser::ast::{ExpressionType, FunctionBodyType, StatementType, VariableDeclarationKind};
use jssim::parser::scope::{DeclarationKind, ScopeKind};
use jssim::parser::JsParser;
use jssim::runner::ds::error::{ErrorKind, JErrorType};

fn syntax_message(code: &str) -> String {
    match JsParser::parse_to_ast_from_str(code) {
        Err(JErrorType::SyntaxError(message)) => message,
        Err(other) => panic!("expected a SyntaxError for {:?}, got {}", code, other),
        Ok(_) => panic!("expected a SyntaxError for {:?}", code),
    }
}

// ============================================================================
// Tree shape
// ============================================================================

#[test]
fn test_program_statements() {
    let program = JsParser::parse_to_ast_from_str(
        "var a = 1;
         let b;
         function f(x, y) { return x + y; }
         if (a) { b = 2; } else b = 3;
         for (let i = 0; i < 2; i++) {}
         while (false) ;",
    )
    .unwrap();
    assert_eq!(program.body.len(), 6);
    assert!(matches!(
        &program.body[0],
        StatementType::VariableDeclaration(d) if d.kind == VariableDeclarationKind::Var
    ));
    assert!(matches!(
        &program.body[1],
        StatementType::VariableDeclaration(d) if d.kind == VariableDeclarationKind::Let && d.declarations[0].init.is_none()
    ));
    match &program.body[2] {
        StatementType::FunctionDeclaration(f) => {
            assert_eq!(f.name(), "f");
            assert_eq!(f.params.len(), 2);
            assert!(!f.is_arrow);
            assert!(matches!(&f.body, FunctionBodyType::Block(body) if body.len() == 1));
        }
        other => panic!("expected a function declaration, got {:?}", other),
    }
    assert!(matches!(&program.body[3], StatementType::IfStatement { alternate: Some(_), .. }));
    assert!(matches!(&program.body[4], StatementType::ForStatement { scope: Some(_), .. }));
    assert!(matches!(&program.body[5], StatementType::WhileStatement { .. }));
}

#[test]
fn test_statement_positions() {
    let program = JsParser::parse_to_ast_from_str("var a;\n  let b;").unwrap();
    let meta = match &program.body[1] {
        StatementType::VariableDeclaration(d) => &d.meta,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!((meta.line, meta.column), (2, 3));
}

#[test]
fn test_call_with_member_path_callee() {
    let program = JsParser::parse_to_ast_from_str("console.log('a', 1);").unwrap();
    match &program.body[0] {
        StatementType::ExpressionStatement { expression, .. } => match expression.as_ref() {
            ExpressionType::CallExpression { callee, arguments, .. } => {
                assert_eq!(arguments.len(), 2);
                assert!(matches!(
                    callee.as_ref(),
                    ExpressionType::MemberPath { object, properties, .. }
                        if object.name == "console" && properties == &vec!["log".to_string()]
                ));
            }
            other => panic!("expected a call, got {:?}", other),
        },
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

// ============================================================================
// Scope tree
// ============================================================================

#[test]
fn test_scope_tree_and_hoist_plan() {
    let program = JsParser::parse_to_ast_from_str(
        "function f(p) { let a; { let b; } { var c; } function g() {} }",
    )
    .unwrap();
    let tree = &program.scope_tree;
    // global, f, the block declaring b, g
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.node(program.scope).kind, ScopeKind::Global);

    let f = match &program.body[0] {
        StatementType::FunctionDeclaration(f) => f,
        other => panic!("unexpected {:?}", other),
    };
    let node = tree.node(f.scope);
    assert_eq!(node.kind, ScopeKind::Function);
    assert_eq!(node.parent, Some(program.scope));
    assert_eq!(node.plan.params, vec!["p"]);
    assert_eq!(node.plan.var_names, vec!["c"]);
    assert_eq!(node.plan.lexicals, vec![("a".to_string(), DeclarationKind::Let)]);
    assert_eq!(node.plan.functions.len(), 1);
    assert_eq!(node.plan.functions[0].name(), "g");

    let global_plan = &tree.node(program.scope).plan;
    assert!(global_plan.var_names.is_empty());
    assert_eq!(global_plan.functions[0].name(), "f");
}

// ============================================================================
// Syntax errors
// ============================================================================

#[test]
fn test_grammar_errors_are_syntax_errors() {
    for code in &["var = 1;", "let x = ;", "function () {}", "1 +", "x++ ++;", "if (true {}"] {
        let error = JsParser::parse_to_ast_from_str(code).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::SyntaxError, "{}", code);
    }
}

#[test]
fn test_early_error_messages() {
    assert!(syntax_message("const k;").starts_with("Missing initializer in const declaration"));
    assert!(syntax_message("return 1;").starts_with("Illegal return statement"));
    assert!(syntax_message("if (true) let x = 1;").starts_with("Lexical declaration cannot appear"));
    assert!(syntax_message("let a; let a;").starts_with("Identifier 'a' has already been declared"));
}

#[test]
fn test_token_tree_names_rules() {
    let tree = JsParser::parse_to_token_tree("function f() { return 1; }").unwrap();
    assert!(tree.contains("function_declaration"));
    assert!(tree.contains("return_statement"));
    assert!(tree.contains("numeric_literal"));
}
