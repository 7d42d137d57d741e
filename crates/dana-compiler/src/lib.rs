//! Dana Compiler
//!
//! Turns `.na` source text into a typed AST: tokens & indenter (A), a
//! hand-written recursive-descent/Pratt parser that builds `ast::Expr`/
//! `ast::Stmt` directly (B, fused with D's transformer helpers), and the
//! closed-set AST node definitions (C). Also owns rich diagnostics
//! rendering.

pub mod ast;
pub mod diagnostics;
pub mod error_codes;
pub mod lexer;
pub mod parser;
pub mod tokens;
pub mod transformer;

use thiserror::Error;

pub use ast::Program;
pub use diagnostics::Diagnostic;

/// Any failure in the parse → transform pipeline.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] lexer::LexError),
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Lex(e) => e.to_diagnostic(),
            CompileError::Parse(e) => e.to_diagnostic(),
        }
    }
}

/// Parse and lower Dana source text into a `Program` AST.
///
/// The grammar/parser (Component B) and the transformer (Component D) are
/// fused into a single recursive-descent/Pratt pass, the same way the
/// teacher's own `compiler::parser` builds `ast::Expr`/`ast::Stmt` directly
/// rather than through an intermediate concrete-tree type. Transformer
/// responsibilities — identifier canonicalization, operator precedence,
/// f-string placeholder scanning, trailer-chain resolution — live in
/// `transformer` as pure helper functions the parser calls at the point
/// each construct is recognised.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::lex(source)?;
    let program = parser::parse(&tokens)?;
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_trivial_assignment() {
        let program = compile("x = 1\n").unwrap();
        assert_eq!(program.statements.len(), 1);
    }
}
