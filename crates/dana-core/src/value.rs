//! Scalar literal values produced directly by the parser/transformer.
//!
//! `LiteralValue` is deliberately narrower than the runtime's `Value` (see
//! `dana_rt::value::Value`): it only covers the literal forms that can
//! appear verbatim in source text (`Literal` AST nodes). Collections,
//! functions, and struct instances only ever come into existence at
//! evaluation time, so they live in the runtime crate instead of here —
//! keeping this crate free of any dependency on the AST or the interpreter.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(i) => write!(f, "{i}"),
            LiteralValue::Float(v) => write!(f, "{v}"),
            LiteralValue::Str(s) => write!(f, "{s}"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::None => write!(f, "None"),
        }
    }
}
