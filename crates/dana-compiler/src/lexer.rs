//! Lexer and indenter (Component A).
//!
//! A line-oriented scanner emits a flat token stream, then a post-pass
//! indent tracker injects `Indent`/`Dedent`/`Newline` tokens at logical line
//! boundaries, ignoring blank/comment-only lines and honouring
//! bracket-balanced continuation.

use crate::diagnostics::Diagnostic;
use crate::tokens::{keyword, Token, TokenKind};
use dana_core::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },
    #[error("invalid character '{ch}' at line {line}, column {col}")]
    InvalidChar { ch: char, line: usize, col: usize },
    #[error("tabs and spaces mixed within one indent unit at line {line}")]
    MixedIndentation { line: usize },
    #[error("inconsistent dedent at line {line}: does not match any enclosing indent level")]
    InconsistentDedent { line: usize },
    #[error("invalid number literal '{text}' at line {line}")]
    InvalidNumber { text: String, line: usize },
}

impl LexError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let line = match self {
            LexError::UnterminatedString { line } => *line,
            LexError::InvalidChar { line, .. } => *line,
            LexError::MixedIndentation { line } => *line,
            LexError::InconsistentDedent { line } => *line,
            LexError::InvalidNumber { line, .. } => *line,
        };
        Diagnostic::error(crate::error_codes::E_LEX, self.to_string())
            .with_line(line)
    }
}

struct Scanner<'a> {
    src: &'a [u8],
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    byte_pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            byte_pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.byte_pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

/// One raw token before indentation is synthesized, tagged with the column
/// of the line it starts on (used to measure indentation) and whether it is
/// the first token on its physical line.
struct RawToken {
    token: Token,
    line_start_col: usize,
    is_first_on_line: bool,
}

/// Scan `source` into a flat token stream with `Indent`/`Dedent`/`Newline`
/// tokens synthesized at logical line boundaries.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let raw = scan_raw(source)?;
    indent(raw)
}

fn scan_raw(source: &str) -> Result<Vec<RawToken>, LexError> {
    let mut sc = Scanner::new(source);
    let mut out = Vec::new();
    let mut bracket_depth: i32 = 0;
    let mut at_line_start = true;
    let mut pending_indent_col = 1usize;

    while !sc.at_eof() {
        // Measure indentation at the start of a physical line.
        if at_line_start {
            let (indent_col, used_tab, used_space) = measure_indent(&mut sc);
            pending_indent_col = indent_col;
            if used_tab && used_space {
                return Err(LexError::MixedIndentation { line: sc.line });
            }
            at_line_start = false;
        }

        let c = match sc.peek() {
            Some(c) => c,
            None => break,
        };

        if c == '#' {
            while let Some(c) = sc.peek() {
                if c == '\n' {
                    break;
                }
                sc.bump();
            }
            continue;
        }

        if c == '\n' {
            let line = sc.line;
            sc.bump();
            if bracket_depth == 0 {
                out.push(RawToken {
                    token: Token::new(TokenKind::Newline, Span::new(sc.byte_pos, sc.byte_pos, line, sc.col)),
                    line_start_col: pending_indent_col,
                    is_first_on_line: false,
                });
            }
            at_line_start = true;
            continue;
        }

        if c == ' ' || c == '\t' || c == '\r' {
            sc.bump();
            continue;
        }

        if c == '\\' && sc.peek_at(1) == Some('\n') {
            // explicit line continuation
            sc.bump();
            sc.bump();
            continue;
        }

        let is_first = out
            .last()
            .map(|t: &RawToken| matches!(t.token.kind, TokenKind::Newline))
            .unwrap_or(true);

        let start_line = sc.line;
        let start_col = sc.col;
        let start_byte = sc.byte_pos;

        let kind = if c.is_ascii_digit() {
            scan_number(&mut sc)?
        } else if c == '_' || c.is_alphabetic() {
            scan_ident_or_string_prefix(&mut sc)?
        } else if c == '"' || c == '\'' {
            scan_string(&mut sc, false, false)?
        } else {
            match c {
                '(' => {
                    bracket_depth += 1;
                    sc.bump();
                    TokenKind::LParen
                }
                ')' => {
                    bracket_depth -= 1;
                    sc.bump();
                    TokenKind::RParen
                }
                '[' => {
                    bracket_depth += 1;
                    sc.bump();
                    TokenKind::LBracket
                }
                ']' => {
                    bracket_depth -= 1;
                    sc.bump();
                    TokenKind::RBracket
                }
                '{' => {
                    bracket_depth += 1;
                    sc.bump();
                    TokenKind::LBrace
                }
                '}' => {
                    bracket_depth -= 1;
                    sc.bump();
                    TokenKind::RBrace
                }
                ',' => {
                    sc.bump();
                    TokenKind::Comma
                }
                ':' => {
                    sc.bump();
                    TokenKind::Colon
                }
                '.' => {
                    sc.bump();
                    TokenKind::Dot
                }
                '@' => {
                    sc.bump();
                    TokenKind::At
                }
                '+' => {
                    sc.bump();
                    TokenKind::Plus
                }
                '-' => {
                    sc.bump();
                    if sc.peek() == Some('>') {
                        sc.bump();
                        TokenKind::Arrow
                    } else {
                        TokenKind::Minus
                    }
                }
                '*' => {
                    sc.bump();
                    if sc.peek() == Some('*') {
                        sc.bump();
                        TokenKind::StarStar
                    } else {
                        TokenKind::Star
                    }
                }
                '/' => {
                    sc.bump();
                    if sc.peek() == Some('/') {
                        sc.bump();
                        TokenKind::SlashSlash
                    } else {
                        TokenKind::Slash
                    }
                }
                '%' => {
                    sc.bump();
                    TokenKind::Percent
                }
                '|' => {
                    sc.bump();
                    TokenKind::Pipe
                }
                '=' => {
                    sc.bump();
                    if sc.peek() == Some('=') {
                        sc.bump();
                        TokenKind::EqEq
                    } else {
                        TokenKind::Assign
                    }
                }
                '!' => {
                    sc.bump();
                    if sc.peek() == Some('=') {
                        sc.bump();
                        TokenKind::NotEq
                    } else {
                        return Err(LexError::InvalidChar {
                            ch: c,
                            line: start_line,
                            col: start_col,
                        });
                    }
                }
                '<' => {
                    sc.bump();
                    if sc.peek() == Some('=') {
                        sc.bump();
                        TokenKind::LtEq
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    sc.bump();
                    if sc.peek() == Some('=') {
                        sc.bump();
                        TokenKind::GtEq
                    } else {
                        TokenKind::Gt
                    }
                }
                _ => {
                    return Err(LexError::InvalidChar {
                        ch: c,
                        line: start_line,
                        col: start_col,
                    })
                }
            }
        };

        let span = Span::new(start_byte, sc.byte_pos, start_line, start_col);
        out.push(RawToken {
            token: Token::new(kind, span),
            line_start_col: pending_indent_col,
            is_first_on_line: is_first,
        });
    }

    out.push(RawToken {
        token: Token::new(TokenKind::Newline, Span::new(sc.byte_pos, sc.byte_pos, sc.line, sc.col)),
        line_start_col: pending_indent_col,
        is_first_on_line: false,
    });

    Ok(out)
}

/// Consume leading whitespace on a line, returning the resulting column
/// (1-based) and whether tabs and/or spaces were used.
fn measure_indent(sc: &mut Scanner) -> (usize, bool, bool) {
    let mut used_tab = false;
    let mut used_space = false;
    loop {
        match sc.peek() {
            Some(' ') => {
                used_space = true;
                sc.bump();
            }
            Some('\t') => {
                used_tab = true;
                sc.bump();
            }
            _ => break,
        }
    }
    (sc.col, used_tab, used_space)
}

fn scan_number(sc: &mut Scanner) -> Result<TokenKind, LexError> {
    let start_line = sc.line;
    let mut text = String::new();
    let mut is_float = false;
    while let Some(c) = sc.peek() {
        if c.is_ascii_digit() || c == '_' {
            if c != '_' {
                text.push(c);
            }
            sc.bump();
        } else if c == '.' && !is_float && sc.peek_at(1).map(|n| n.is_ascii_digit()).unwrap_or(false) {
            is_float = true;
            text.push('.');
            sc.bump();
        } else if (c == 'e' || c == 'E') && !text.is_empty() {
            is_float = true;
            text.push(c);
            sc.bump();
            if matches!(sc.peek(), Some('+') | Some('-')) {
                text.push(sc.bump().unwrap());
            }
        } else {
            break;
        }
    }
    if is_float {
        text.parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|_| LexError::InvalidNumber { text, line: start_line })
    } else {
        text.parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|_| LexError::InvalidNumber { text, line: start_line })
    }
}

fn scan_ident_or_string_prefix(sc: &mut Scanner) -> Result<TokenKind, LexError> {
    let mut text = String::new();
    while let Some(c) = sc.peek() {
        if c.is_alphanumeric() || c == '_' {
            text.push(c);
            sc.bump();
        } else {
            break;
        }
    }

    // string prefixes: r"...", f"...", rf"...", fr"..."
    if matches!(sc.peek(), Some('"') | Some('\'')) {
        let lower = text.to_lowercase();
        match lower.as_str() {
            "r" => return scan_string(sc, true, false),
            "f" => return scan_string(sc, false, true),
            "rf" | "fr" => return scan_string(sc, true, true),
            _ => {}
        }
    }

    if let Some(kw) = keyword(&text) {
        return Ok(kw);
    }
    Ok(TokenKind::Ident(text))
}

fn scan_string(sc: &mut Scanner, raw: bool, is_fstring: bool) -> Result<TokenKind, LexError> {
    let start_line = sc.line;
    let quote = sc.bump().unwrap();
    let triple = sc.peek() == Some(quote) && sc.peek_at(1) == Some(quote);
    if triple {
        sc.bump();
        sc.bump();
    }

    let mut content = String::new();
    loop {
        if sc.at_eof() {
            return Err(LexError::UnterminatedString { line: start_line });
        }
        let c = sc.peek().unwrap();
        if !triple && c == '\n' {
            return Err(LexError::UnterminatedString { line: start_line });
        }
        if c == quote {
            if triple {
                if sc.peek_at(1) == Some(quote) && sc.peek_at(2) == Some(quote) {
                    sc.bump();
                    sc.bump();
                    sc.bump();
                    break;
                }
            } else {
                sc.bump();
                break;
            }
        }
        if c == '\\' && !raw {
            sc.bump();
            match sc.bump() {
                Some('n') => content.push('\n'),
                Some('t') => content.push('\t'),
                Some('r') => content.push('\r'),
                Some('\\') => content.push('\\'),
                Some('\'') => content.push('\''),
                Some('"') => content.push('"'),
                Some('0') => content.push('\0'),
                Some(other) => content.push(other),
                None => return Err(LexError::UnterminatedString { line: start_line }),
            }
            continue;
        }
        content.push(c);
        sc.bump();
    }

    if is_fstring {
        Ok(TokenKind::FStr(content))
    } else if raw {
        Ok(TokenKind::RawStr(content))
    } else {
        Ok(TokenKind::Str(content))
    }
}

/// Synthesize `Indent`/`Dedent` tokens from the raw stream's recorded
/// per-line starting columns, collapsing multiple physical lines that
/// continue inside brackets (those never carry a `Newline`) into one
/// logical line.
fn indent(raw: Vec<RawToken>) -> Result<Vec<Token>, LexError> {
    let mut out = Vec::new();
    let mut stack = vec![1usize];
    let mut pending_newline = false;

    let mut iter = raw.into_iter().peekable();
    while let Some(rt) = iter.next() {
        match &rt.token.kind {
            TokenKind::Newline => {
                // Skip blank logical lines (a Newline immediately after
                // another Newline, or as the very first token).
                if out.is_empty() || pending_newline {
                    continue;
                }
                out.push(rt.token);
                pending_newline = true;
            }
            _ => {
                if rt.is_first_on_line || pending_newline {
                    let col = rt.line_start_col;
                    let current = *stack.last().unwrap();
                    if col > current {
                        stack.push(col);
                        out.push(Token::new(TokenKind::Indent, rt.token.span));
                    } else {
                        while *stack.last().unwrap() > col {
                            stack.pop();
                            out.push(Token::new(TokenKind::Dedent, rt.token.span));
                        }
                        if *stack.last().unwrap() != col {
                            return Err(LexError::InconsistentDedent {
                                line: rt.token.span.line,
                            });
                        }
                    }
                }
                pending_newline = false;
                out.push(rt.token);
            }
        }
    }

    if !matches!(out.last().map(|t| &t.kind), Some(TokenKind::Newline)) {
        let span = out.last().map(|t| t.span).unwrap_or_else(Span::dummy);
        out.push(Token::new(TokenKind::Newline, span));
    }
    while stack.len() > 1 {
        stack.pop();
        let span = out.last().map(|t| t.span).unwrap_or_else(Span::dummy);
        out.push(Token::new(TokenKind::Dedent, span));
    }
    let span = out.last().map(|t| t.span).unwrap_or_else(Span::dummy);
    out.push(Token::new(TokenKind::Eof, span));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_assignment_has_no_indent_tokens() {
        let ks = kinds("x = 1\n");
        assert!(!ks.contains(&TokenKind::Indent));
        assert!(!ks.contains(&TokenKind::Dedent));
    }

    #[test]
    fn block_produces_indent_and_dedent() {
        let ks = kinds("if x:\n    y = 1\nz = 2\n");
        assert!(ks.contains(&TokenKind::Indent));
        assert!(ks.contains(&TokenKind::Dedent));
    }

    #[test]
    fn mixed_tabs_and_spaces_is_an_error() {
        let err = lex("if x:\n \ty = 1\n").unwrap_err();
        assert!(matches!(err, LexError::MixedIndentation { .. }));
    }

    #[test]
    fn bracket_continuation_suppresses_newline() {
        let ks = kinds("x = [\n  1,\n  2,\n]\n");
        let newline_count = ks.iter().filter(|k| matches!(k, TokenKind::Newline)).count();
        assert_eq!(newline_count, 1);
    }

    #[test]
    fn fstring_prefix_is_recognised() {
        let ks = kinds("f\"hello {name}\"\n");
        assert!(matches!(ks[0], TokenKind::FStr(_)));
    }

    #[test]
    fn comment_only_line_is_ignored() {
        let ks = kinds("# comment\nx = 1\n");
        assert_eq!(
            ks.iter().filter(|k| matches!(k, TokenKind::Newline)).count(),
            1
        );
    }
}
