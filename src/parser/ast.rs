use std::fmt::Debug;
use std::rc::Rc;

use crate::parser::scope::{ScopeId, ScopeTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
    pub line: usize,
    pub column: usize,
}

impl Meta {
    pub fn location(&self) -> String {
        format!("{}:{}", self.line, self.column)
    }
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

#[derive(Debug)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    NullLiteral,
    UndefinedLiteral,
    BooleanLiteral(bool),
    NumberLiteral(f64),
    StringLiteral(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    StrictlyEqual,
    StrictlyUnequal,
    LooselyEqual,
    LooselyUnequal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    PlusPlus,
    MinusMinus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
    ModuloEquals,
}

#[derive(Debug)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    /// Dotted access such as `console.log`; only host namespaces have properties.
    MemberPath {
        meta: Meta,
        object: IdentifierData,
        properties: Vec<String>,
    },
    ThisExpression {
        meta: Meta,
    },
    FunctionExpression(Rc<FunctionData>),
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    UpdateExpression {
        meta: Meta,
        operator: UpdateOperator,
        argument: IdentifierData,
        prefix: bool,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        meta: Meta,
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        operator: AssignmentOperator,
        left: IdentifierData,
        right: Box<ExpressionType>,
    },
    CallExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
}

impl HasMeta for ExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            ExpressionType::Literal(data) => &data.meta,
            ExpressionType::Identifier(data) => &data.meta,
            ExpressionType::MemberPath { meta, .. } => meta,
            ExpressionType::ThisExpression { meta } => meta,
            ExpressionType::FunctionExpression(data) => &data.meta,
            ExpressionType::UnaryExpression { meta, .. } => meta,
            ExpressionType::UpdateExpression { meta, .. } => meta,
            ExpressionType::BinaryExpression { meta, .. } => meta,
            ExpressionType::LogicalExpression { meta, .. } => meta,
            ExpressionType::ConditionalExpression { meta, .. } => meta,
            ExpressionType::AssignmentExpression { meta, .. } => meta,
            ExpressionType::CallExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

impl VariableDeclarationKind {
    pub fn is_lexical(&self) -> bool {
        !matches!(self, VariableDeclarationKind::Var)
    }
}

#[derive(Debug)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: IdentifierData,
    pub init: Option<Box<ExpressionType>>,
}

#[derive(Debug)]
pub struct VariableDeclarationData {
    pub meta: Meta,
    pub kind: VariableDeclarationKind,
    pub declarations: Vec<VariableDeclaratorData>,
}

#[derive(Debug)]
pub struct BlockStatementData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
    /// Present only when the block holds lexical or function declarations.
    pub scope: Option<ScopeId>,
}

#[derive(Debug)]
pub enum FunctionBodyType {
    Block(Vec<StatementType>),
    Expression(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub params: Vec<IdentifierData>,
    pub body: FunctionBodyType,
    pub scope: ScopeId,
    pub is_arrow: bool,
}

impl FunctionData {
    pub fn name(&self) -> &str {
        match &self.id {
            Some(id) => &id.name,
            None => "",
        }
    }
}

#[derive(Debug)]
pub enum ForInitType {
    VariableDeclaration(VariableDeclarationData),
    Expression(Box<ExpressionType>),
}

#[derive(Debug)]
pub enum StatementType {
    EmptyStatement {
        meta: Meta,
    },
    ExpressionStatement {
        meta: Meta,
        expression: Box<ExpressionType>,
    },
    BlockStatement(BlockStatementData),
    VariableDeclaration(VariableDeclarationData),
    FunctionDeclaration(Rc<FunctionData>),
    IfStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    ForStatement {
        meta: Meta,
        init: Option<ForInitType>,
        test: Option<Box<ExpressionType>>,
        update: Option<Box<ExpressionType>>,
        body: Box<StatementType>,
        /// Loop-head scope, present when `init` declares `let`/`const`.
        scope: Option<ScopeId>,
    },
    WhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<Box<ExpressionType>>,
    },
}

impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::EmptyStatement { meta } => meta,
            StatementType::ExpressionStatement { meta, .. } => meta,
            StatementType::BlockStatement(data) => &data.meta,
            StatementType::VariableDeclaration(data) => &data.meta,
            StatementType::FunctionDeclaration(data) => &data.meta,
            StatementType::IfStatement { meta, .. } => meta,
            StatementType::ForStatement { meta, .. } => meta,
            StatementType::WhileStatement { meta, .. } => meta,
            StatementType::ReturnStatement { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
    pub scope: ScopeId,
    pub scope_tree: Rc<ScopeTree>,
}
