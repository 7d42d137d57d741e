//! Token types produced by the lexer/indenter (Component A).

use dana_core::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    /// Decoded string contents (quotes stripped, escapes resolved).
    Str(String),
    /// Raw string contents (quotes stripped, no escape processing).
    RawStr(String),
    /// An f-string body, unparsed — the transformer scans it for `{expr}`
    /// placeholders.
    FStr(String),
    Bool(bool),
    NoneLit,

    Ident(String),

    // Keywords
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Def,
    Return,
    Break,
    Continue,
    Pass,
    Import,
    From,
    As,
    Try,
    Except,
    Finally,
    Raise,
    Assert,
    Struct,
    True,
    False,
    None_,
    And,
    Or,
    Not,
    Print,
    Scope(ScopeKeyword),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    StarStar,
    Pipe,
    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Assign,
    Colon,
    Comma,
    Dot,
    Arrow,
    At,

    // Structural
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Synthesized by the indenter
    Indent,
    Dedent,
    Newline,

    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKeyword {
    Local,
    Private,
    Public,
    System,
}

impl ScopeKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKeyword::Local => "local",
            ScopeKeyword::Private => "private",
            ScopeKeyword::Public => "public",
            ScopeKeyword::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local" => Some(ScopeKeyword::Local),
            "private" => Some(ScopeKeyword::Private),
            "public" => Some(ScopeKeyword::Public),
            "system" => Some(ScopeKeyword::System),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(v) => write!(f, "{v}"),
            TokenKind::Float(v) => write!(f, "{v}"),
            TokenKind::Str(s) => write!(f, "{s:?}"),
            TokenKind::RawStr(s) => write!(f, "r{s:?}"),
            TokenKind::FStr(s) => write!(f, "f{s:?}"),
            TokenKind::Bool(b) => write!(f, "{b}"),
            TokenKind::NoneLit => write!(f, "none"),
            TokenKind::Ident(name) => write!(f, "{name}"),
            TokenKind::Indent => write!(f, "INDENT"),
            TokenKind::Dedent => write!(f, "DEDENT"),
            TokenKind::Newline => write!(f, "NEWLINE"),
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Scope(s) => write!(f, "{}", s.as_str()),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Maps identifier text to a keyword token, if it is one.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    if let Some(scope) = ScopeKeyword::from_str(ident) {
        return Some(TokenKind::Scope(scope));
    }
    Some(match ident {
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "def" => TokenKind::Def,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "pass" => TokenKind::Pass,
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "try" => TokenKind::Try,
        "except" => TokenKind::Except,
        "finally" => TokenKind::Finally,
        "raise" => TokenKind::Raise,
        "assert" => TokenKind::Assert,
        "struct" => TokenKind::Struct,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "none" => TokenKind::None_,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "print" => TokenKind::Print,
        _ => return None,
    })
}
