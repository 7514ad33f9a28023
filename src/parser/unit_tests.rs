use super::api::JsParser;
use super::api::Rule;
use super::ast::*;
use super::scope::{DeclarationKind, ScopeId, ScopeKind};
use crate::runner::ds::error::JErrorType;

use pest::consumes_to;
use pest::fails_with;
use pest::parses_to;

fn parse(code: &str) -> ProgramData {
    match JsParser::parse_to_ast_from_str(code) {
        Ok(program) => program,
        Err(e) => panic!("failed to parse {:?}: {}", code, e),
    }
}

fn syntax_error(code: &str) -> String {
    match JsParser::parse_to_ast_from_str(code) {
        Err(JErrorType::SyntaxError(message)) => message,
        Err(other) => panic!("expected SyntaxError for {:?}, got {}", code, other),
        Ok(_) => panic!("expected SyntaxError for {:?}", code),
    }
}

fn first_expression(program: &ProgramData) -> &ExpressionType {
    match &program.body[0] {
        StatementType::ExpressionStatement { expression, .. } => expression,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

// ==================== Grammar ====================

#[test]
fn test_numeric_literal() {
    parses_to! {
        parser: JsParser,
        input: "10.5e3",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 6)
        ]
    };
}

#[test]
fn test_string_literal_keeps_raw_body() {
    parses_to! {
        parser: JsParser,
        input: "'it\\'s'",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 7, [
                single_quoted(1, 6)
            ])
        ]
    };
}

#[test]
fn test_member_path() {
    parses_to! {
        parser: JsParser,
        input: "console.log",
        rule: Rule::member_path,
        tokens: [
            member_path(0, 11, [
                identifier(0, 7),
                property_name(8, 11)
            ])
        ]
    };
}

#[test]
fn test_formal_parameters() {
    parses_to! {
        parser: JsParser,
        input: "(a, b)",
        rule: Rule::formal_parameters,
        tokens: [
            formal_parameters(0, 6, [
                identifier(1, 2),
                identifier(4, 5)
            ])
        ]
    };
}

#[test]
fn test_reserved_word_is_not_an_identifier() {
    fails_with! {
        parser: JsParser,
        input: "let",
        rule: Rule::identifier,
        positives: vec![Rule::identifier],
        negatives: vec![],
        pos: 0
    };
}

#[test]
fn test_keyword_prefix_is_an_identifier() {
    parses_to! {
        parser: JsParser,
        input: "letter",
        rule: Rule::identifier,
        tokens: [
            identifier(0, 6)
        ]
    };
}

// ==================== AST ====================

#[test]
fn test_multiplication_binds_tighter() {
    let program = parse("1 + 2 * 3;");
    match first_expression(&program) {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            **right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_dotted_callee() {
    let program = parse("console.log('x', 1)");
    match first_expression(&program) {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            match &**callee {
                ExpressionType::MemberPath {
                    object, properties, ..
                } => {
                    assert_eq!(object.name, "console");
                    assert_eq!(properties, &vec!["log".to_string()]);
                }
                other => panic!("unexpected callee {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_string_escapes_are_decoded() {
    let program = parse("\"a\\nb\\\"c\";");
    match first_expression(&program) {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::StringLiteral(s),
            ..
        }) => assert_eq!(s, "a\nb\"c"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_arrow_function_with_expression_body() {
    let program = parse("const double = x => x * 2;");
    match &program.body[0] {
        StatementType::VariableDeclaration(declaration) => {
            assert_eq!(declaration.kind, VariableDeclarationKind::Const);
            match declaration.declarations[0].init.as_deref() {
                Some(ExpressionType::FunctionExpression(f)) => {
                    assert!(f.is_arrow);
                    assert_eq!(f.params.len(), 1);
                    assert!(matches!(f.body, FunctionBodyType::Expression(_)));
                }
                other => panic!("unexpected init {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_positions_are_one_based() {
    let program = parse("\n  foo;");
    let meta = first_expression(&program).get_meta();
    assert_eq!((meta.line, meta.column), (2, 3));
}

#[test]
fn test_comments_and_missing_semicolons() {
    let program = parse("// leading\nvar a = 1 /* inline */\nvar b = 2\n");
    assert_eq!(program.body.len(), 2);
}

// ==================== Scope tree ====================

#[test]
fn test_scope_nodes_and_hoist_plans() {
    let program = parse("var a = 1; { var b; let c; } function f(p) { var p; var q; }");
    let tree = &program.scope_tree;
    assert_eq!(tree.len(), 3);

    let global = tree.node(ScopeId(0));
    assert_eq!(global.kind, ScopeKind::Global);
    assert_eq!(global.plan.var_names, vec!["a", "b"]);
    assert_eq!(global.plan.functions.len(), 1);
    assert!(global.plan.lexicals.is_empty());

    let block = tree.node(ScopeId(1));
    assert_eq!(block.kind, ScopeKind::Block);
    assert_eq!(block.parent, Some(ScopeId(0)));
    assert_eq!(block.plan.lexicals, vec![("c".to_string(), DeclarationKind::Let)]);
    assert!(block.plan.var_names.is_empty());

    let function = tree.node(ScopeId(2));
    assert_eq!(function.kind, ScopeKind::Function);
    assert_eq!(function.plan.params, vec!["p"]);
    assert_eq!(function.plan.var_names, vec!["p", "q"]);
}

#[test]
fn test_plain_block_gets_no_scope_node() {
    let program = parse("{ var x = 1; x; }");
    assert_eq!(program.scope_tree.len(), 1);
    match &program.body[0] {
        StatementType::BlockStatement(block) => assert!(block.scope.is_none()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_lexical_for_gets_a_head_scope() {
    let program = parse("for (let i = 0; i < 3; i++) {} for (var j = 0; j < 3; j++) {}");
    match (&program.body[0], &program.body[1]) {
        (
            StatementType::ForStatement { scope: Some(head), .. },
            StatementType::ForStatement { scope: None, .. },
        ) => {
            let node = program.scope_tree.node(*head);
            assert_eq!(node.kind, ScopeKind::Block);
            assert_eq!(node.plan.lexicals, vec![("i".to_string(), DeclarationKind::Let)]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(program.scope_tree.node(ScopeId(0)).plan.var_names, vec!["j"]);
}

#[test]
fn test_block_function_is_block_scoped() {
    let program = parse("{ function inner() {} }");
    let block = program.scope_tree.node(ScopeId(1));
    assert_eq!(block.plan.functions.len(), 1);
    assert!(program.scope_tree.node(ScopeId(0)).plan.functions.is_empty());
}

// ==================== Early errors ====================

#[test]
fn test_redeclarations_are_early_errors() {
    assert!(syntax_error("let a; var a;").contains("'a' has already been declared"));
    assert!(syntax_error("let a; let a;").contains("'a' has already been declared"));
    assert!(syntax_error("const a = 1; function a() {}").contains("'a'"));
    assert!(syntax_error("{ let x; { var x; } }").contains("'x'"));
    assert!(syntax_error("function f(a) { let a; }").contains("'a'"));
}

#[test]
fn test_var_redeclaration_is_allowed() {
    parse("var a; var a; function a() {} function f(b) { var b; }");
}

#[test]
fn test_structural_early_errors() {
    assert!(syntax_error("const z;").contains("Missing initializer"));
    assert!(syntax_error("return 1;").contains("Illegal return"));
    assert!(syntax_error("if (true) let x = 1;").contains("single-statement"));
    assert!(syntax_error("while (false) function g() {}").contains("single-statement"));
    assert!(syntax_error("f()++;").contains("Invalid left-hand side"));
}

#[test]
fn test_grammar_errors_carry_a_position() {
    let message = syntax_error("var let = 1;");
    assert!(message.contains("1:"), "no position in {:?}", message);
    syntax_error("var x = ;");
}
