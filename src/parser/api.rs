use std::rc::Rc;
use std::time::Instant;

use pest::error::{Error, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use tracing::debug;

use super::ast::*;
use super::scope::{DeclarationData, DeclarationKind, ScopeId, ScopeKind, ScopeTree};
use super::static_semantics::compute_hoist_plans;
use crate::runner::ds::error::JErrorType;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

const TAB_WIDTH: usize = 2;

impl JsParser {
    /// Parses `script` into an AST plus its static scope tree, with every
    /// node's hoisting plan already computed.
    pub fn parse_to_ast_from_str(script: &str) -> Result<ProgramData, JErrorType> {
        let start = Instant::now();
        let mut pairs = JsParser::parse(Rule::script, script).map_err(to_syntax_error)?;
        let script_pair = pairs
            .next()
            .ok_or_else(|| JErrorType::SyntaxError("Unexpected end of input".to_string()))?;
        let program = AstBuilder::new().build_program(script_pair)?;
        debug!(
            elapsed_us = start.elapsed().as_micros() as u64,
            statements = program.body.len(),
            scopes = program.scope_tree.len(),
            "parsed script"
        );
        Ok(program)
    }

    /// Renders the raw pest token tree, one rule per line.
    pub fn parse_to_token_tree(script: &str) -> Result<String, JErrorType> {
        let pairs = JsParser::parse(Rule::script, script).map_err(to_syntax_error)?;
        let mut tree = vec![];
        for pair in pairs {
            tree.push(pair_to_string(pair, 0).join("\n"));
        }
        Ok(tree.join("\n"))
    }
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    let rule_name = format!(
        "{:?} => ({},{}) #{:?}",
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    );
    tree.push(format!("{}{}", " ".repeat(level * TAB_WIDTH), rule_name));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

fn to_syntax_error(error: Error<Rule>) -> JErrorType {
    let (line, column) = match error.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    JErrorType::SyntaxError(format!("{} at {}:{}", error.variant.message(), line, column))
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    let (line, column) = span.start_pos().line_col();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
        line,
        column,
    }
}

fn span_meta(left: &Meta, right: &Meta) -> Meta {
    Meta {
        start_index: left.start_index,
        end_index: right.end_index,
        line: left.line,
        column: left.column,
    }
}

fn get_syntax_error(pair: &Pair<Rule>, message: &str) -> JErrorType {
    JErrorType::SyntaxError(format!("{} at {}", message, get_meta(pair).location()))
}

fn get_unexpected_error(pair: &Pair<Rule>) -> JErrorType {
    get_syntax_error(pair, &format!("Unexpected {:?}", pair.as_rule()))
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, parent: &Meta) -> Result<Pair<'i, Rule>, JErrorType> {
    pairs.next().ok_or_else(|| {
        JErrorType::SyntaxError(format!("Unexpected end of input at {}", parent.location()))
    })
}

fn build_identifier(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        meta: get_meta(&pair),
        name: pair.as_str().to_string(),
    }
}

fn is_lexical_declaration_list(pair: &Pair<Rule>) -> bool {
    match pair.clone().into_inner().next() {
        Some(kind) => kind.as_str() != "var",
        None => false,
    }
}

/// A block needs its own scope node only when it declares something
/// block-scoped directly.
fn declares_lexically(pair: &Pair<Rule>) -> bool {
    match pair.as_rule() {
        Rule::function_declaration => true,
        Rule::variable_statement => match pair.clone().into_inner().next() {
            Some(list) => is_lexical_declaration_list(&list),
            None => false,
        },
        _ => false,
    }
}

fn unescape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq)]
enum StatementPosition {
    /// Directly inside a script, block or function body.
    List,
    /// Body of `if`/`for`/`while`, where declarations are not allowed.
    Single,
}

struct AstBuilder {
    tree: ScopeTree,
    current_scope: ScopeId,
    function_depth: usize,
}

impl AstBuilder {
    fn new() -> Self {
        AstBuilder {
            tree: ScopeTree::new(),
            current_scope: ScopeId(0),
            function_depth: 0,
        }
    }

    fn build_program(mut self, pair: Pair<Rule>) -> Result<ProgramData, JErrorType> {
        let meta = get_meta(&pair);
        let scope = self.tree.add_node(ScopeKind::Global, None);
        self.current_scope = scope;
        let body = self.build_statement_list(pair.into_inner())?;
        compute_hoist_plans(&mut self.tree)?;
        Ok(ProgramData {
            meta,
            body,
            scope,
            scope_tree: Rc::new(self.tree),
        })
    }

    fn build_statement_list(&mut self, pairs: Pairs<Rule>) -> Result<Vec<StatementType>, JErrorType> {
        let mut statements = vec![];
        for pair in pairs {
            if pair.as_rule() == Rule::EOI {
                continue;
            }
            statements.push(self.build_statement(pair, StatementPosition::List)?);
        }
        Ok(statements)
    }

    fn declare(&mut self, id: &IdentifierData, kind: DeclarationKind, function: Option<Rc<FunctionData>>) {
        self.tree.declare(
            self.current_scope,
            DeclarationData {
                name: id.name.to_string(),
                kind,
                meta: id.meta.clone(),
                function,
            },
        );
    }

    fn build_statement(
        &mut self,
        pair: Pair<Rule>,
        position: StatementPosition,
    ) -> Result<StatementType, JErrorType> {
        let meta = get_meta(&pair);
        Ok(match pair.as_rule() {
            Rule::function_declaration => {
                if position == StatementPosition::Single {
                    return Err(get_syntax_error(
                        &pair,
                        "Function declarations are not allowed in a single-statement context",
                    ));
                }
                let function = Rc::new(self.build_function(pair, false)?);
                if let Some(id) = function.id.clone() {
                    self.declare(&id, DeclarationKind::Function, Some(function.clone()));
                }
                StatementType::FunctionDeclaration(function)
            }
            Rule::variable_statement => {
                let list = next_pair(&mut pair.clone().into_inner(), &meta)?;
                if position == StatementPosition::Single && is_lexical_declaration_list(&list) {
                    return Err(get_syntax_error(
                        &pair,
                        "Lexical declaration cannot appear in a single-statement context",
                    ));
                }
                StatementType::VariableDeclaration(self.build_variable_declaration(list)?)
            }
            Rule::if_statement => {
                let mut inner = pair
                    .into_inner()
                    .filter(|p| !matches!(p.as_rule(), Rule::kw_if | Rule::kw_else));
                let test = inner.next().ok_or_else(|| missing(&meta))?;
                let consequent = inner.next().ok_or_else(|| missing(&meta))?;
                let alternate = inner.next();
                StatementType::IfStatement {
                    meta,
                    test: Box::new(self.build_expression(test)?),
                    consequent: Box::new(self.build_statement(consequent, StatementPosition::Single)?),
                    alternate: match alternate {
                        Some(p) => Some(Box::new(self.build_statement(p, StatementPosition::Single)?)),
                        None => None,
                    },
                }
            }
            Rule::for_statement => self.build_for_statement(pair)?,
            Rule::while_statement => {
                let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::kw_while);
                let test = inner.next().ok_or_else(|| missing(&meta))?;
                let body = inner.next().ok_or_else(|| missing(&meta))?;
                StatementType::WhileStatement {
                    meta,
                    test: Box::new(self.build_expression(test)?),
                    body: Box::new(self.build_statement(body, StatementPosition::Single)?),
                }
            }
            Rule::return_statement => {
                if self.function_depth == 0 {
                    return Err(get_syntax_error(&pair, "Illegal return statement"));
                }
                let argument = pair.into_inner().find(|p| p.as_rule() != Rule::kw_return);
                StatementType::ReturnStatement {
                    meta,
                    argument: match argument {
                        Some(p) => Some(Box::new(self.build_expression(p)?)),
                        None => None,
                    },
                }
            }
            Rule::block_statement => self.build_block(pair)?,
            Rule::empty_statement => StatementType::EmptyStatement { meta },
            Rule::expression_statement => {
                let expression = next_pair(&mut pair.into_inner(), &meta)?;
                StatementType::ExpressionStatement {
                    meta,
                    expression: Box::new(self.build_expression(expression)?),
                }
            }
            _ => return Err(get_unexpected_error(&pair)),
        })
    }

    fn build_block(&mut self, pair: Pair<Rule>) -> Result<StatementType, JErrorType> {
        let meta = get_meta(&pair);
        let needs_scope = pair.clone().into_inner().any(|p| declares_lexically(&p));
        let saved = self.current_scope;
        let scope = if needs_scope {
            let id = self.tree.add_node(ScopeKind::Block, Some(saved));
            self.current_scope = id;
            Some(id)
        } else {
            None
        };
        let body = self.build_statement_list(pair.into_inner());
        self.current_scope = saved;
        Ok(StatementType::BlockStatement(BlockStatementData {
            meta,
            body: body?,
            scope,
        }))
    }

    fn build_for_statement(&mut self, pair: Pair<Rule>) -> Result<StatementType, JErrorType> {
        let meta = get_meta(&pair);
        let saved = self.current_scope;
        let mut scope = None;
        let mut init = None;
        let mut test = None;
        let mut update = None;
        let mut body = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::kw_for => {}
                Rule::for_init => {
                    let first = next_pair(&mut child.into_inner(), &meta)?;
                    if first.as_rule() == Rule::variable_declaration_list {
                        if is_lexical_declaration_list(&first) {
                            let id = self.tree.add_node(ScopeKind::Block, Some(saved));
                            self.current_scope = id;
                            scope = Some(id);
                        }
                        init = Some(ForInitType::VariableDeclaration(
                            self.build_variable_declaration(first)?,
                        ));
                    } else {
                        init = Some(ForInitType::Expression(Box::new(self.build_expression(first)?)));
                    }
                }
                Rule::for_test => {
                    let expression = next_pair(&mut child.into_inner(), &meta)?;
                    test = Some(Box::new(self.build_expression(expression)?));
                }
                Rule::for_update => {
                    let expression = next_pair(&mut child.into_inner(), &meta)?;
                    update = Some(Box::new(self.build_expression(expression)?));
                }
                _ => body = Some(Box::new(self.build_statement(child, StatementPosition::Single)?)),
            }
        }
        self.current_scope = saved;
        Ok(StatementType::ForStatement {
            body: body.ok_or_else(|| missing(&meta))?,
            meta,
            init,
            test,
            update,
            scope,
        })
    }

    fn build_variable_declaration(
        &mut self,
        pair: Pair<Rule>,
    ) -> Result<VariableDeclarationData, JErrorType> {
        let meta = get_meta(&pair);
        let mut inner = pair.into_inner();
        let kind = match next_pair(&mut inner, &meta)?.as_str() {
            "var" => VariableDeclarationKind::Var,
            "let" => VariableDeclarationKind::Let,
            _ => VariableDeclarationKind::Const,
        };
        let declaration_kind = match kind {
            VariableDeclarationKind::Var => DeclarationKind::Var,
            VariableDeclarationKind::Let => DeclarationKind::Let,
            VariableDeclarationKind::Const => DeclarationKind::Const,
        };
        let mut declarations = vec![];
        for declarator in inner {
            let declarator_meta = get_meta(&declarator);
            let mut parts = declarator.into_inner();
            let id = build_identifier(next_pair(&mut parts, &declarator_meta)?);
            let init = match parts.next() {
                Some(p) => Some(Box::new(self.build_expression(p)?)),
                None => None,
            };
            if kind == VariableDeclarationKind::Const && init.is_none() {
                return Err(JErrorType::SyntaxError(format!(
                    "Missing initializer in const declaration at {}",
                    declarator_meta.location()
                )));
            }
            self.declare(&id, declaration_kind, None);
            declarations.push(VariableDeclaratorData {
                meta: declarator_meta,
                id,
                init,
            });
        }
        Ok(VariableDeclarationData {
            meta,
            kind,
            declarations,
        })
    }

    /// `function_declaration` or `function_expression`.
    fn build_function(&mut self, pair: Pair<Rule>, allow_anonymous: bool) -> Result<FunctionData, JErrorType> {
        let meta = get_meta(&pair);
        let mut id = None;
        let mut params = vec![];
        let mut body = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::kw_function => {}
                Rule::identifier => id = Some(build_identifier(inner)),
                Rule::formal_parameters => params = inner.into_inner().map(build_identifier).collect(),
                Rule::function_body => body = Some(inner),
                _ => return Err(get_unexpected_error(&inner)),
            }
        }
        if id.is_none() && !allow_anonymous {
            return Err(JErrorType::SyntaxError(format!(
                "Function statements require a function name at {}",
                meta.location()
            )));
        }
        let body = body.ok_or_else(|| missing(&meta))?;
        self.build_function_data(meta, id, params, body, false)
    }

    fn build_function_data(
        &mut self,
        meta: Meta,
        id: Option<IdentifierData>,
        params: Vec<IdentifierData>,
        body: Pair<Rule>,
        is_arrow: bool,
    ) -> Result<FunctionData, JErrorType> {
        let saved = self.current_scope;
        let scope = self.tree.add_node(ScopeKind::Function, Some(saved));
        self.current_scope = scope;
        self.function_depth += 1;
        for param in &params {
            self.declare(param, DeclarationKind::Param, None);
        }
        let body = if body.as_rule() == Rule::function_body {
            self.build_statement_list(body.into_inner())
                .map(FunctionBodyType::Block)
        } else {
            self.build_expression(body)
                .map(|e| FunctionBodyType::Expression(Box::new(e)))
        };
        self.function_depth -= 1;
        self.current_scope = saved;
        Ok(FunctionData {
            meta,
            id,
            params,
            body: body?,
            scope,
            is_arrow,
        })
    }

    fn build_expression(&mut self, pair: Pair<Rule>) -> Result<ExpressionType, JErrorType> {
        let meta = get_meta(&pair);
        Ok(match pair.as_rule() {
            Rule::arrow_function => {
                let mut inner = pair.into_inner();
                let parameters = next_pair(&mut inner, &meta)?;
                let parameters = next_pair(&mut parameters.into_inner(), &meta)?;
                let params = if parameters.as_rule() == Rule::identifier {
                    vec![build_identifier(parameters)]
                } else {
                    parameters.into_inner().map(build_identifier).collect()
                };
                let body = next_pair(&mut inner, &meta)?;
                ExpressionType::FunctionExpression(Rc::new(
                    self.build_function_data(meta, None, params, body, true)?,
                ))
            }
            Rule::function_expression => {
                ExpressionType::FunctionExpression(Rc::new(self.build_function(pair, true)?))
            }
            Rule::assignment => {
                let mut inner = pair.into_inner();
                let left = build_identifier(next_pair(&mut inner, &meta)?);
                let operator = match next_pair(&mut inner, &meta)?.as_str() {
                    "+=" => AssignmentOperator::AddEquals,
                    "-=" => AssignmentOperator::SubtractEquals,
                    "*=" => AssignmentOperator::MultiplyEquals,
                    "/=" => AssignmentOperator::DivideEquals,
                    "%=" => AssignmentOperator::ModuloEquals,
                    _ => AssignmentOperator::Equals,
                };
                let right = self.build_expression(next_pair(&mut inner, &meta)?)?;
                ExpressionType::AssignmentExpression {
                    meta,
                    operator,
                    left,
                    right: Box::new(right),
                }
            }
            Rule::conditional_expression => {
                let mut inner = pair.into_inner();
                let test = self.build_expression(next_pair(&mut inner, &meta)?)?;
                match inner.next() {
                    None => test,
                    Some(consequent) => {
                        let consequent = self.build_expression(consequent)?;
                        let alternate = self.build_expression(next_pair(&mut inner, &meta)?)?;
                        ExpressionType::ConditionalExpression {
                            meta,
                            test: Box::new(test),
                            consequent: Box::new(consequent),
                            alternate: Box::new(alternate),
                        }
                    }
                }
            }
            Rule::logical_or_expression | Rule::logical_and_expression => {
                self.build_logical_chain(pair)?
            }
            Rule::equality_expression
            | Rule::relational_expression
            | Rule::additive_expression
            | Rule::multiplicative_expression => self.build_binary_chain(pair)?,
            Rule::unary_expression => {
                let mut inner = pair.into_inner();
                let first = next_pair(&mut inner, &meta)?;
                if first.as_rule() != Rule::unary_operator {
                    return self.build_expression(first);
                }
                let operator = match first.as_str() {
                    "-" => UnaryOperator::Minus,
                    "+" => UnaryOperator::Plus,
                    "!" => UnaryOperator::LogicalNot,
                    _ => UnaryOperator::TypeOf,
                };
                let argument = self.build_expression(next_pair(&mut inner, &meta)?)?;
                ExpressionType::UnaryExpression {
                    meta,
                    operator,
                    argument: Box::new(argument),
                }
            }
            Rule::prefix_update => {
                let mut inner = pair.into_inner();
                let operator = update_operator(next_pair(&mut inner, &meta)?.as_str());
                let argument = build_identifier(next_pair(&mut inner, &meta)?);
                ExpressionType::UpdateExpression {
                    meta,
                    operator,
                    argument,
                    prefix: true,
                }
            }
            Rule::postfix_expression => {
                let mut inner = pair.into_inner();
                let call = next_pair(&mut inner, &meta)?;
                match inner.next() {
                    None => self.build_expression(call)?,
                    Some(op) => {
                        let mut parts = call.clone().into_inner();
                        let target = match (parts.next(), parts.next()) {
                            (Some(p), None) if p.as_rule() == Rule::identifier => build_identifier(p),
                            _ => {
                                return Err(get_syntax_error(
                                    &call,
                                    "Invalid left-hand side expression in postfix operation",
                                ))
                            }
                        };
                        ExpressionType::UpdateExpression {
                            meta,
                            operator: update_operator(op.as_str()),
                            argument: target,
                            prefix: false,
                        }
                    }
                }
            }
            Rule::call_expression => {
                let mut inner = pair.into_inner();
                let mut callee = self.build_expression(next_pair(&mut inner, &meta)?)?;
                for arguments in inner {
                    let call_meta = span_meta(callee.get_meta(), &get_meta(&arguments));
                    let mut values = vec![];
                    for argument in arguments.into_inner() {
                        values.push(self.build_expression(argument)?);
                    }
                    callee = ExpressionType::CallExpression {
                        meta: call_meta,
                        callee: Box::new(callee),
                        arguments: values,
                    };
                }
                callee
            }
            Rule::member_path => {
                let mut inner = pair.into_inner();
                let object = build_identifier(next_pair(&mut inner, &meta)?);
                let properties = inner.map(|p| p.as_str().to_string()).collect();
                ExpressionType::MemberPath {
                    meta,
                    object,
                    properties,
                }
            }
            Rule::this_expression => ExpressionType::ThisExpression { meta },
            Rule::identifier => ExpressionType::Identifier(build_identifier(pair)),
            Rule::null_literal => literal(meta, LiteralType::NullLiteral),
            Rule::undefined_literal => literal(meta, LiteralType::UndefinedLiteral),
            Rule::boolean_literal => literal(meta, LiteralType::BooleanLiteral(pair.as_str() == "true")),
            Rule::numeric_literal => {
                let value = pair
                    .as_str()
                    .parse::<f64>()
                    .map_err(|_| get_syntax_error(&pair, "Invalid number literal"))?;
                literal(meta, LiteralType::NumberLiteral(value))
            }
            Rule::string_literal => {
                let raw = match pair.into_inner().next() {
                    Some(p) => p.as_str(),
                    None => "",
                };
                literal(meta, LiteralType::StringLiteral(unescape_string(raw)))
            }
            _ => return Err(get_unexpected_error(&pair)),
        })
    }

    fn build_binary_chain(&mut self, pair: Pair<Rule>) -> Result<ExpressionType, JErrorType> {
        let meta = get_meta(&pair);
        let mut inner = pair.into_inner();
        let mut left = self.build_expression(next_pair(&mut inner, &meta)?)?;
        while let Some(op) = inner.next() {
            let operator = match op.as_str() {
                "+" => BinaryOperator::Add,
                "-" => BinaryOperator::Subtract,
                "*" => BinaryOperator::Multiply,
                "/" => BinaryOperator::Divide,
                "%" => BinaryOperator::Modulo,
                "<" => BinaryOperator::LessThan,
                ">" => BinaryOperator::GreaterThan,
                "<=" => BinaryOperator::LessThanEqual,
                ">=" => BinaryOperator::GreaterThanEqual,
                "===" => BinaryOperator::StrictlyEqual,
                "!==" => BinaryOperator::StrictlyUnequal,
                "==" => BinaryOperator::LooselyEqual,
                "!=" => BinaryOperator::LooselyUnequal,
                _ => return Err(get_unexpected_error(&op)),
            };
            let right = self.build_expression(next_pair(&mut inner, &meta)?)?;
            left = ExpressionType::BinaryExpression {
                meta: span_meta(left.get_meta(), right.get_meta()),
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn build_logical_chain(&mut self, pair: Pair<Rule>) -> Result<ExpressionType, JErrorType> {
        let meta = get_meta(&pair);
        let mut inner = pair.into_inner();
        let mut left = self.build_expression(next_pair(&mut inner, &meta)?)?;
        while let Some(op) = inner.next() {
            let operator = if op.as_str() == "&&" {
                LogicalOperator::And
            } else {
                LogicalOperator::Or
            };
            let right = self.build_expression(next_pair(&mut inner, &meta)?)?;
            left = ExpressionType::LogicalExpression {
                meta: span_meta(left.get_meta(), right.get_meta()),
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }
}

fn update_operator(op: &str) -> UpdateOperator {
    if op == "++" {
        UpdateOperator::PlusPlus
    } else {
        UpdateOperator::MinusMinus
    }
}

fn literal(meta: Meta, value: LiteralType) -> ExpressionType {
    ExpressionType::Literal(LiteralData { meta, value })
}

fn missing(meta: &Meta) -> JErrorType {
    JErrorType::SyntaxError(format!("Unexpected end of input at {}", meta.location()))
}
