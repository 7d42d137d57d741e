//! AST node definitions (Component C).
//!
//! A closed set of statement/expression variants. The AST is purely
//! declarative data: every node carries a `Span`, and no node ever retains
//! a handle into the parser's working state after `compile()` returns.

use dana_core::LiteralValue;
use dana_core::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_hint: Option<String>,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptBlock {
    pub exc_name: Option<String>,
    pub binding: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Assignment {
        target: Box<Expr>,
        type_hint: Option<String>,
        value: Box<Expr>,
        span: Span,
    },
    Conditional {
        cond: Box<Expr>,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
        span: Span,
    },
    WhileLoop {
        cond: Box<Expr>,
        body: Vec<Stmt>,
        span: Span,
    },
    ForLoop {
        target: String,
        iterable: Box<Expr>,
        body: Vec<Stmt>,
        span: Span,
    },
    FunctionDefinition {
        name: String,
        params: Vec<Param>,
        return_type: Option<String>,
        body: Vec<Stmt>,
        decorators: Vec<Expr>,
        span: Span,
    },
    StructDefinition {
        name: String,
        fields: Vec<(String, String)>,
        span: Span,
    },
    ImportStatement {
        module_path: String,
        alias: Option<String>,
        span: Span,
    },
    ImportFromStatement {
        module_path: String,
        names: Vec<(String, Option<String>)>,
        span: Span,
    },
    ReturnStatement {
        value: Option<Box<Expr>>,
        span: Span,
    },
    BreakStatement {
        span: Span,
    },
    ContinueStatement {
        span: Span,
    },
    PassStatement {
        span: Span,
    },
    RaiseStatement {
        value: Option<Box<Expr>>,
        from_value: Option<Box<Expr>>,
        span: Span,
    },
    AssertStatement {
        cond: Box<Expr>,
        msg: Option<Box<Expr>>,
        span: Span,
    },
    TryBlock {
        body: Vec<Stmt>,
        except_blocks: Vec<ExceptBlock>,
        finally: Option<Vec<Stmt>>,
        span: Span,
    },
    PrintStatement {
        msg: Box<Expr>,
        span: Span,
    },
    ExpressionStatement {
        expr: Box<Expr>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assignment { span, .. }
            | Stmt::Conditional { span, .. }
            | Stmt::WhileLoop { span, .. }
            | Stmt::ForLoop { span, .. }
            | Stmt::FunctionDefinition { span, .. }
            | Stmt::StructDefinition { span, .. }
            | Stmt::ImportStatement { span, .. }
            | Stmt::ImportFromStatement { span, .. }
            | Stmt::ReturnStatement { span, .. }
            | Stmt::BreakStatement { span }
            | Stmt::ContinueStatement { span }
            | Stmt::PassStatement { span }
            | Stmt::RaiseStatement { span, .. }
            | Stmt::AssertStatement { span, .. }
            | Stmt::TryBlock { span, .. }
            | Stmt::PrintStatement { span, .. }
            | Stmt::ExpressionStatement { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FStringPart {
    Literal(String),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Pipe,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SliceIndex {
    Index(Box<Expr>),
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Literal {
        value: LiteralValue,
        span: Span,
    },
    /// A canonical `scope.name[.attr…]` identifier (see §3.4).
    Identifier {
        qualified_name: String,
        span: Span,
    },
    BinaryExpression {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    UnaryExpression {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    FunctionCall {
        name: String,
        positional: Vec<Expr>,
        keyword: Vec<(String, Expr)>,
        span: Span,
    },
    AttributeAccess {
        object: Box<Expr>,
        name: String,
        span: Span,
    },
    SubscriptExpression {
        object: Box<Expr>,
        index: SliceIndex,
        span: Span,
    },
    ListLiteral {
        items: Vec<Expr>,
        span: Span,
    },
    TupleLiteral {
        items: Vec<Expr>,
        span: Span,
    },
    DictLiteral {
        entries: Vec<(Expr, Expr)>,
        span: Span,
    },
    SetLiteral {
        items: Vec<Expr>,
        span: Span,
    },
    FStringExpression {
        parts: Vec<FStringPart>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::BinaryExpression { span, .. }
            | Expr::UnaryExpression { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::AttributeAccess { span, .. }
            | Expr::SubscriptExpression { span, .. }
            | Expr::ListLiteral { span, .. }
            | Expr::TupleLiteral { span, .. }
            | Expr::DictLiteral { span, .. }
            | Expr::SetLiteral { span, .. }
            | Expr::FStringExpression { span, .. } => *span,
        }
    }
}
