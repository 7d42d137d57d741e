//! Grammar & Parser (Component B), fused with the Transformer (Component D).
//!
//! A hand-written recursive-descent / precedence-climbing parser, building
//! the typed AST directly rather than through an intermediate concrete
//! syntax tree or a generated LALR table. The start rule is `program =
//! statement*`.
//! Precedence, loosest to tightest:
//! `or < and < not < comparison < pipe < sum < term < unary < power <
//! trailer-chain < atom`. `|` is left-associative; `**` is right-associative.

use crate::ast::*;
use crate::diagnostics::Diagnostic;
use crate::error_codes::E_PARSE;
use crate::tokens::{ScopeKeyword, Token, TokenKind};
use crate::transformer;
use dana_core::{LiteralValue, Span};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token {found} at line {line}, column {col}{expected_msg}")]
    UnexpectedToken {
        found: String,
        line: usize,
        col: usize,
        expected_msg: String,
    },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("f-string placeholder has unbalanced braces")]
    UnbalancedFStringBrace,
    #[error("dictionary keys must be literal-compatible values")]
    InvalidDictKey { span: Span },
}

impl ParseError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::UnexpectedToken {
                found, line, col, ..
            } => {
                let mut d = Diagnostic::error(
                    E_PARSE,
                    format!("the symbol '{found}' is not allowed in this context"),
                )
                .with_line(*line)
                .with_col(*col);
                if found == ":" {
                    d = d.with_suggestion("remove the stray ':'");
                }
                d
            }
            ParseError::UnexpectedEof => {
                Diagnostic::error(E_PARSE, "unexpected end of input".to_string())
            }
            ParseError::UnbalancedFStringBrace => {
                Diagnostic::error(E_PARSE, "f-string placeholder has unbalanced braces".to_string())
            }
            ParseError::InvalidDictKey { span } => {
                Diagnostic::error(E_PARSE, "dictionary keys must be literal-compatible values".to_string())
                    .with_line(span.line)
                    .with_col(span.col)
            }
        }
    }
}

pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut p = Parser { tokens, pos: 0 };
    p.parse_program()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let t = self.peek();
        ParseError::UnexpectedToken {
            found: t.kind.to_string(),
            line: t.span.line,
            col: t.span.col,
            expected_msg: if expected.is_empty() {
                String::new()
            } else {
                format!(" (expected {expected})")
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let span = self.peek().span;
                self.advance();
                Ok((name, span))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    // ── Program & suites ──────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let start = self.peek().span;
        let mut statements = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek_kind(), TokenKind::Eof) {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        let end = self.peek().span;
        Ok(Program {
            statements,
            span: start.merge(end),
        })
    }

    /// `":" NEWLINE INDENT statement+ DEDENT`
    fn parse_suite(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::Colon, "':'")?;
        self.expect(TokenKind::Newline, "end of line")?;
        self.skip_newlines();
        self.expect(TokenKind::Indent, "an indented block")?;
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek_kind(), TokenKind::Dedent) {
                break;
            }
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::Dedent, "a dedent")?;
        Ok(stmts)
    }

    // ── Statements ────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let stmt = match self.peek_kind().clone() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Def | TokenKind::At => self.parse_def(),
            TokenKind::Struct => self.parse_struct_def(),
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_import_from(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let span = self.advance().span;
                Ok(Stmt::BreakStatement { span })
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                Ok(Stmt::ContinueStatement { span })
            }
            TokenKind::Pass => {
                let span = self.advance().span;
                Ok(Stmt::PassStatement { span })
            }
            TokenKind::Raise => self.parse_raise(),
            TokenKind::Assert => self.parse_assert(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Print => self.parse_print(),
            _ => self.parse_assignment_or_expr_stmt(),
        }?;
        self.expect_stmt_end()?;
        Ok(stmt)
    }

    fn expect_stmt_end(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent) {
            if matches!(self.peek_kind(), TokenKind::Newline) {
                self.advance();
            }
            Ok(())
        } else {
            Err(self.unexpected("end of line"))
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span; // if
        let cond = self.parse_expr()?;
        let then_body = self.parse_suite()?;
        let mut else_body = Vec::new();
        self.skip_newlines();
        if matches!(self.peek_kind(), TokenKind::Elif) {
            // desugar elif into a nested if inside the else branch
            let nested = self.parse_if_from_elif()?;
            else_body = vec![nested];
        } else if matches!(self.peek_kind(), TokenKind::Else) {
            self.advance();
            else_body = self.parse_suite()?;
        }
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::Conditional {
            cond: Box::new(cond),
            then_body,
            else_body,
            span: start.merge(end),
        })
    }

    fn parse_if_from_elif(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span; // elif
        let cond = self.parse_expr()?;
        let then_body = self.parse_suite()?;
        let mut else_body = Vec::new();
        self.skip_newlines();
        if matches!(self.peek_kind(), TokenKind::Elif) {
            let nested = self.parse_if_from_elif()?;
            else_body = vec![nested];
        } else if matches!(self.peek_kind(), TokenKind::Else) {
            self.advance();
            else_body = self.parse_suite()?;
        }
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::Conditional {
            cond: Box::new(cond),
            then_body,
            else_body,
            span: start.merge(end),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let cond = self.parse_expr()?;
        let body = self.parse_suite()?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::WhileLoop {
            cond: Box::new(cond),
            body,
            span: start.merge(end),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let (target, _) = self.expect_ident()?;
        self.expect(TokenKind::In, "'in'")?;
        let iterable = self.parse_expr()?;
        let body = self.parse_suite()?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::ForLoop {
            target,
            iterable: Box::new(iterable),
            body,
            span: start.merge(end),
        })
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().span;
        let mut decorators = Vec::new();
        while matches!(self.peek_kind(), TokenKind::At) {
            self.advance();
            decorators.push(self.parse_expr()?);
            self.expect(TokenKind::Newline, "end of line")?;
            self.skip_newlines();
        }
        self.expect(TokenKind::Def, "'def'")?;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen) {
            let (pname, pspan) = self.expect_ident()?;
            let type_hint = if matches!(self.peek_kind(), TokenKind::Colon) {
                self.advance();
                Some(self.parse_type_hint()?)
            } else {
                None
            };
            let default = if matches!(self.peek_kind(), TokenKind::Assign) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                name: pname,
                type_hint,
                default,
                span: pspan,
            });
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let return_type = if matches!(self.peek_kind(), TokenKind::Arrow) {
            self.advance();
            Some(self.parse_type_hint()?)
        } else {
            None
        };
        let body = self.parse_suite()?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::FunctionDefinition {
            name,
            params,
            return_type,
            body,
            decorators,
            span: start.merge(end),
        })
    }

    fn parse_type_hint(&mut self) -> Result<String, ParseError> {
        let (name, _) = self.expect_ident()?;
        Ok(name)
    }

    fn parse_struct_def(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::Colon, "':'")?;
        self.expect(TokenKind::Newline, "end of line")?;
        self.skip_newlines();
        self.expect(TokenKind::Indent, "an indented block")?;
        let mut fields = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek_kind(), TokenKind::Dedent) {
                break;
            }
            let (fname, _) = self.expect_ident()?;
            self.expect(TokenKind::Colon, "':'")?;
            let ftype = self.parse_type_hint()?;
            fields.push((fname, ftype));
            self.expect(TokenKind::Newline, "end of line")?;
        }
        self.expect(TokenKind::Dedent, "a dedent")?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::StructDefinition {
            name,
            fields,
            span: start.merge(end),
        })
    }

    fn parse_dotted_path(&mut self) -> Result<(String, Span), ParseError> {
        let (first, start) = self.expect_ident()?;
        let mut parts = vec![first];
        let mut end = start;
        while matches!(self.peek_kind(), TokenKind::Dot) {
            self.advance();
            let (next, nspan) = self.expect_ident()?;
            parts.push(next);
            end = nspan;
        }
        Ok((parts.join("."), start.merge(end)))
    }

    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let (module_path, pspan) = self.parse_dotted_path()?;
        let mut alias = None;
        let mut end = pspan;
        if matches!(self.peek_kind(), TokenKind::As) {
            self.advance();
            let (name, nspan) = self.expect_ident()?;
            alias = Some(name);
            end = nspan;
        }
        Ok(Stmt::ImportStatement {
            module_path,
            alias,
            span: start.merge(end),
        })
    }

    fn parse_import_from(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let (module_path, _) = self.parse_dotted_path()?;
        self.expect(TokenKind::Import, "'import'")?;
        let mut names = Vec::new();
        loop {
            let (name, nspan) = self.expect_ident()?;
            let mut alias = None;
            if matches!(self.peek_kind(), TokenKind::As) {
                self.advance();
                let (a, _) = self.expect_ident()?;
                alias = Some(a);
            }
            let _ = nspan;
            names.push((name, alias));
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::ImportFromStatement {
            module_path,
            names,
            span: start.merge(end),
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let value = if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::ReturnStatement {
            value,
            span: start.merge(end),
        })
    }

    fn parse_raise(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let value = if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let from_value = if matches!(self.peek_kind(), TokenKind::From) {
            self.advance();
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::RaiseStatement {
            value,
            from_value,
            span: start.merge(end),
        })
    }

    fn parse_assert(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let cond = self.parse_expr()?;
        let msg = if matches!(self.peek_kind(), TokenKind::Comma) {
            self.advance();
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::AssertStatement {
            cond: Box::new(cond),
            msg,
            span: start.merge(end),
        })
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let body = self.parse_suite()?;
        let mut except_blocks = Vec::new();
        loop {
            self.skip_newlines();
            if !matches!(self.peek_kind(), TokenKind::Except) {
                break;
            }
            let estart = self.advance().span;
            let mut exc_name = None;
            let mut binding = None;
            if !matches!(self.peek_kind(), TokenKind::Colon) {
                let (name, _) = self.expect_ident()?;
                exc_name = Some(name);
                if matches!(self.peek_kind(), TokenKind::As) {
                    self.advance();
                    let (b, _) = self.expect_ident()?;
                    binding = Some(b);
                }
            }
            let ebody = self.parse_suite()?;
            let eend = self.tokens[self.pos.saturating_sub(1)].span;
            except_blocks.push(ExceptBlock {
                exc_name,
                binding,
                body: ebody,
                span: estart.merge(eend),
            });
        }
        let finally = if matches!(self.peek_kind(), TokenKind::Finally) {
            self.advance();
            Some(self.parse_suite()?)
        } else {
            None
        };
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::TryBlock {
            body,
            except_blocks,
            finally,
            span: start.merge(end),
        })
    }

    fn parse_print(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen, "'('")?;
        let msg = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Ok(Stmt::PrintStatement {
            msg: Box::new(msg),
            span: start.merge(end),
        })
    }

    fn parse_assignment_or_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().span;
        let expr = self.parse_expr()?;
        // Optional `: type` annotation on an assignment target.
        let type_hint = if matches!(self.peek_kind(), TokenKind::Colon) {
            self.advance();
            Some(self.parse_type_hint()?)
        } else {
            None
        };
        if matches!(self.peek_kind(), TokenKind::Assign) {
            self.advance();
            let value = self.parse_expr()?;
            let end = self.tokens[self.pos.saturating_sub(1)].span;
            return Ok(Stmt::Assignment {
                target: Box::new(expr),
                type_hint,
                value: Box::new(value),
                span: start.merge(end),
            });
        }
        let end = expr.span();
        Ok(Stmt::ExpressionStatement {
            expr: Box::new(expr),
            span: start.merge(end),
        })
    }

    // ── Expressions (precedence climbing) ────────────────────────

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            let span = left.span().merge(right.span());
            left = Expr::BinaryExpression {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while matches!(self.peek_kind(), TokenKind::And) {
            self.advance();
            let right = self.parse_not()?;
            let span = left.span().merge(right.span());
            left = Expr::BinaryExpression {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek_kind(), TokenKind::Not) {
            let start = self.advance().span;
            let operand = self.parse_not()?;
            let span = start.merge(operand.span());
            return Ok(Expr::UnaryExpression {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_pipe()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::In => BinaryOp::In,
                _ => break,
            };
            self.advance();
            let right = self.parse_pipe()?;
            let span = left.span().merge(right.span());
            left = Expr::BinaryExpression {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_pipe(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_sum()?;
        while matches!(self.peek_kind(), TokenKind::Pipe) {
            self.advance();
            let right = self.parse_sum()?;
            let span = left.span().merge(right.span());
            left = Expr::BinaryExpression {
                left: Box::new(left),
                op: BinaryOp::Pipe,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_sum(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let span = left.span().merge(right.span());
            left = Expr::BinaryExpression {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::SlashSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span().merge(right.span());
            left = Expr::BinaryExpression {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek_kind(), TokenKind::Minus) {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span());
            return Ok(Expr::UnaryExpression {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                span,
            });
        }
        if matches!(self.peek_kind(), TokenKind::Plus) {
            self.advance();
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_trailer_chain()?;
        if matches!(self.peek_kind(), TokenKind::StarStar) {
            self.advance();
            let exponent = self.parse_unary()?; // right-associative
            let span = base.span().merge(exponent.span());
            return Ok(Expr::BinaryExpression {
                left: Box::new(base),
                op: BinaryOp::Pow,
                right: Box::new(exponent),
                span,
            });
        }
        Ok(base)
    }

    /// `atom { "(" args ")" | "[" slice "]" | "." NAME }*`
    fn parse_trailer_chain(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    expr = self.parse_call_trailer(expr)?;
                }
                TokenKind::LBracket => {
                    expr = self.parse_subscript_trailer(expr)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    let (name, nspan) = self.expect_ident()?;
                    let span = expr.span().merge(nspan);
                    expr = Expr::AttributeAccess {
                        object: Box::new(expr),
                        name,
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn callee_name(expr: &Expr) -> String {
        match expr {
            Expr::Identifier { qualified_name, .. } => qualified_name.clone(),
            Expr::AttributeAccess { object, name, .. } => {
                format!("{}.{}", Self::callee_name(object), name)
            }
            _ => String::new(),
        }
    }

    fn parse_call_trailer(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let start_paren = self.advance().span; // '('
        let mut positional = Vec::new();
        let mut keyword = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen) {
            if let TokenKind::Ident(name) = self.peek_kind().clone() {
                if self.tokens.get(self.pos + 1).map(|t| &t.kind) == Some(&TokenKind::Assign) {
                    self.advance();
                    self.advance();
                    let value = self.parse_expr()?;
                    keyword.push((name, value));
                    if matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                        continue;
                    } else {
                        break;
                    }
                }
            }
            positional.push(self.parse_expr()?);
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.expect(TokenKind::RParen, "')'")?.span;
        let _ = start_paren;

        // Method-sugar is resolved at call time by the interpreter (it
        // needs the receiver's runtime type); here a `a.b(...)` trailer is
        // just represented as a `FunctionCall` named after the dotted
        // attribute path, and the interpreter decides whether that is a
        // real dotted name or `receiver.method(...)` sugar.
        let name = if name_is_callable_path(&callee) {
            Self::callee_name(&callee)
        } else {
            // Calling an arbitrary expression (e.g. the result of another
            // call, or a composed/pipe function value): encode it as a
            // positional-prepended call to the synthetic `__call__` name,
            // letting the expression executor evaluate `callee` itself as
            // the function value.
            positional.insert(0, callee.clone());
            "__call__".to_string()
        };
        Ok(Expr::FunctionCall {
            name,
            positional,
            keyword,
            span: callee.span().merge(end),
        })
    }

    fn parse_subscript_trailer(&mut self, object: Expr) -> Result<Expr, ParseError> {
        self.advance(); // '['
        let index = self.parse_slice_or_index()?;
        let end = self.expect(TokenKind::RBracket, "']'")?.span;
        let span = object.span().merge(end);
        Ok(Expr::SubscriptExpression {
            object: Box::new(object),
            index,
            span,
        })
    }

    fn parse_slice_or_index(&mut self) -> Result<SliceIndex, ParseError> {
        let start = if matches!(self.peek_kind(), TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        if !matches!(self.peek_kind(), TokenKind::Colon) {
            return Ok(SliceIndex::Index(start.expect("index without ':' must have a value")));
        }
        self.advance(); // ':'
        let stop = if matches!(self.peek_kind(), TokenKind::Colon | TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let step = if matches!(self.peek_kind(), TokenKind::Colon) {
            self.advance();
            if matches!(self.peek_kind(), TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            }
        } else {
            None
        };
        Ok(SliceIndex::Slice { start, stop, step })
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Int(v) => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Integer(v),
                    span: tok.span,
                })
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Float(v),
                    span: tok.span,
                })
            }
            TokenKind::Str(s) | TokenKind::RawStr(s) => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Str(s),
                    span: tok.span,
                })
            }
            TokenKind::FStr(body) => {
                self.advance();
                let parts = transformer::parse_fstring_parts(&body, |src| {
                    let sub_tokens = crate::lexer::lex(src)
                        .map_err(|_| ParseError::UnexpectedEof)?;
                    let mut sub = Parser {
                        tokens: &sub_tokens,
                        pos: 0,
                    };
                    sub.parse_expr()
                })?;
                Ok(Expr::FStringExpression {
                    parts,
                    span: tok.span,
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Bool(true),
                    span: tok.span,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Bool(false),
                    span: tok.span,
                })
            }
            TokenKind::None_ => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::None,
                    span: tok.span,
                })
            }
            TokenKind::Scope(scope) => {
                self.advance();
                self.expect(TokenKind::Colon, "':'")?;
                let (first, fspan) = self.expect_ident()?;
                let mut parts = vec![first];
                let mut end = fspan;
                while matches!(self.peek_kind(), TokenKind::Dot) {
                    self.advance();
                    let (next, nspan) = self.expect_ident()?;
                    parts.push(next);
                    end = nspan;
                }
                let name = transformer::canonicalize_identifier(Some(scope), &parts);
                Ok(Expr::Identifier {
                    qualified_name: name,
                    span: tok.span.merge(end),
                })
            }
            TokenKind::Ident(_) => {
                let (first, fspan) = self.expect_ident()?;
                let mut parts = vec![first];
                let mut end = fspan;
                while matches!(self.peek_kind(), TokenKind::Dot) {
                    self.advance();
                    let (next, nspan) = self.expect_ident()?;
                    parts.push(next);
                    end = nspan;
                }
                let name = transformer::canonicalize_identifier(None, &parts);
                Ok(Expr::Identifier {
                    qualified_name: name,
                    span: tok.span.merge(end),
                })
            }
            TokenKind::LParen => {
                self.advance();
                if matches!(self.peek_kind(), TokenKind::RParen) {
                    let end = self.advance().span;
                    return Ok(Expr::TupleLiteral {
                        items: Vec::new(),
                        span: tok.span.merge(end),
                    });
                }
                let first = self.parse_expr()?;
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    let mut items = vec![first];
                    while matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                        if matches!(self.peek_kind(), TokenKind::RParen) {
                            break;
                        }
                        items.push(self.parse_expr()?);
                    }
                    let end = self.expect(TokenKind::RParen, "')'")?.span;
                    return Ok(Expr::TupleLiteral {
                        items,
                        span: tok.span.merge(end),
                    });
                }
                self.expect(TokenKind::RParen, "')'")?;
                Ok(first)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::RBracket) {
                    items.push(self.parse_expr()?);
                    if matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                let end = self.expect(TokenKind::RBracket, "']'")?.span;
                Ok(Expr::ListLiteral {
                    items,
                    span: tok.span.merge(end),
                })
            }
            TokenKind::LBrace => {
                self.advance();
                if matches!(self.peek_kind(), TokenKind::RBrace) {
                    let end = self.advance().span;
                    return Ok(Expr::DictLiteral {
                        entries: Vec::new(),
                        span: tok.span.merge(end),
                    });
                }
                let first_key = self.parse_expr()?;
                if matches!(self.peek_kind(), TokenKind::Colon) {
                    self.advance();
                    transformer::validate_dict_key(&first_key)?;
                    let first_val = self.parse_expr()?;
                    let mut entries = vec![(first_key, first_val)];
                    while matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                        if matches!(self.peek_kind(), TokenKind::RBrace) {
                            break;
                        }
                        let k = self.parse_expr()?;
                        transformer::validate_dict_key(&k)?;
                        self.expect(TokenKind::Colon, "':'")?;
                        let v = self.parse_expr()?;
                        entries.push((k, v));
                    }
                    let end = self.expect(TokenKind::RBrace, "'}'")?.span;
                    Ok(Expr::DictLiteral {
                        entries,
                        span: tok.span.merge(end),
                    })
                } else {
                    let mut items = vec![first_key];
                    while matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                        if matches!(self.peek_kind(), TokenKind::RBrace) {
                            break;
                        }
                        items.push(self.parse_expr()?);
                    }
                    let end = self.expect(TokenKind::RBrace, "'}'")?.span;
                    Ok(Expr::SetLiteral {
                        items,
                        span: tok.span.merge(end),
                    })
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

fn name_is_callable_path(expr: &Expr) -> bool {
    matches!(expr, Expr::Identifier { .. } | Expr::AttributeAccess { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Program {
        let tokens = lex(src).unwrap();
        parse(&tokens).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        let program = parse_src("x = 2 + 3 * 4\n");
        match &program.statements[0] {
            Stmt::Assignment { value, .. } => match value.as_ref() {
                Expr::BinaryExpression { op: BinaryOp::Add, right, .. } => {
                    assert!(matches!(right.as_ref(), Expr::BinaryExpression { op: BinaryOp::Mul, .. }));
                }
                other => panic!("expected addition at top level, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn pipe_is_left_associative_and_looser_than_sum() {
        let program = parse_src("y = a | b | c\n");
        match &program.statements[0] {
            Stmt::Assignment { value, .. } => match value.as_ref() {
                Expr::BinaryExpression { op: BinaryOp::Pipe, left, .. } => {
                    assert!(matches!(left.as_ref(), Expr::BinaryExpression { op: BinaryOp::Pipe, .. }));
                }
                other => panic!("expected pipe, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn struct_definition_parses_typed_fields() {
        let program = parse_src("struct Point:\n    x: int\n    y: int\n");
        match &program.statements[0] {
            Stmt::StructDefinition { name, fields, .. } => {
                assert_eq!(name, "Point");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected struct def, got {other:?}"),
        }
    }

    #[test]
    fn if_elif_else_desugars_to_nested_conditionals() {
        let program = parse_src("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        match &program.statements[0] {
            Stmt::Conditional { else_body, .. } => {
                assert_eq!(else_body.len(), 1);
                assert!(matches!(else_body[0], Stmt::Conditional { .. }));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn scope_prefixed_identifier_is_canonicalised() {
        let program = parse_src("private:count = 1\n");
        match &program.statements[0] {
            Stmt::Assignment { target, .. } => match target.as_ref() {
                Expr::Identifier { qualified_name, .. } => {
                    assert_eq!(qualified_name, "private.count");
                }
                other => panic!("expected identifier target, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn method_sugar_call_is_represented_as_dotted_call() {
        let program = parse_src("b = p.sq_len()\n");
        match &program.statements[0] {
            Stmt::Assignment { value, .. } => match value.as_ref() {
                Expr::FunctionCall { name, .. } => assert_eq!(name, "local.p.sq_len"),
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }
}
