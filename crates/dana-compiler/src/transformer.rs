//! Transformer helpers (Component D).
//!
//! These are pure functions the parser calls at the point each construct is
//! recognised: identifier canonicalization, f-string placeholder scanning,
//! and dictionary-key validation. Operator precedence and trailer-chain
//! resolution (the rest of Component D's responsibilities) live directly in
//! `parser`'s Pratt loop, since precedence climbing only makes sense woven
//! into the token-consuming parse itself.

use crate::ast::{Expr, FStringPart};
use crate::parser::ParseError;
use crate::tokens::ScopeKeyword;

/// Canonicalise a dotted identifier into `scope.name[.attr…]` form. A bare
/// `x` becomes `local.x`; a scope-prefixed `private:x` becomes `private.x`;
/// an already-dotted `a.b.c` whose first segment isn't a scope keyword gets
/// `local.` prepended in front.
pub fn canonicalize_identifier(scope: Option<ScopeKeyword>, parts: &[String]) -> String {
    match scope {
        Some(scope) => {
            let mut full = vec![scope.as_str().to_string()];
            full.extend(parts.iter().cloned());
            full.join(".")
        }
        None => {
            let first_is_scope = parts
                .first()
                .and_then(|p| ScopeKeyword::from_str(p))
                .is_some();
            if first_is_scope {
                parts.join(".")
            } else {
                let mut full = vec!["local".to_string()];
                full.extend(parts.iter().cloned());
                full.join(".")
            }
        }
    }
}

/// Scan an f-string body for balanced `{…}` placeholders, recursively
/// parsing each placeholder as a Dana expression. `{{`/`}}` are escaped
/// literal braces.
pub fn parse_fstring_parts(
    body: &str,
    parse_expr_fn: impl Fn(&str) -> Result<Expr, ParseError>,
) -> Result<Vec<FStringPart>, ParseError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '{' && chars.get(i + 1) == Some(&'{') {
            literal.push('{');
            i += 2;
            continue;
        }
        if c == '}' && chars.get(i + 1) == Some(&'}') {
            literal.push('}');
            i += 2;
            continue;
        }
        if c == '{' {
            if !literal.is_empty() {
                parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
            }
            let mut depth = 1;
            let mut expr_src = String::new();
            i += 1;
            while i < chars.len() && depth > 0 {
                let c = chars[i];
                if c == '{' {
                    depth += 1;
                } else if c == '}' {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                expr_src.push(c);
                i += 1;
            }
            if depth != 0 {
                return Err(ParseError::UnbalancedFStringBrace);
            }
            let expr = parse_expr_fn(expr_src.trim())?;
            parts.push(FStringPart::Expr(Box::new(expr)));
            continue;
        }
        literal.push(c);
        i += 1;
    }
    if !literal.is_empty() {
        parts.push(FStringPart::Literal(literal));
    }
    Ok(parts)
}

/// Dictionary keys must be comparable literal-compatible values: literals,
/// identifiers, or unary-negated numeric literals. Anything else is a
/// transform-time error.
pub fn validate_dict_key(key: &Expr) -> Result<(), ParseError> {
    match key {
        Expr::Literal { .. } | Expr::Identifier { .. } => Ok(()),
        Expr::UnaryExpression { operand, .. } => validate_dict_key(operand),
        _ => Err(ParseError::InvalidDictKey { span: key.span() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dana_core::{LiteralValue, Span};

    #[test]
    fn bare_name_gets_local_scope() {
        assert_eq!(
            canonicalize_identifier(None, &["x".to_string()]),
            "local.x"
        );
    }

    #[test]
    fn scoped_name_uses_given_scope() {
        assert_eq!(
            canonicalize_identifier(Some(ScopeKeyword::Private), &["x".to_string()]),
            "private.x"
        );
    }

    #[test]
    fn dotted_access_is_preserved() {
        assert_eq!(
            canonicalize_identifier(None, &["a".to_string(), "b".to_string(), "c".to_string()]),
            "local.a.b.c"
        );
    }

    #[test]
    fn fstring_splits_literal_and_expr_parts() {
        let parts = parse_fstring_parts("Hello {name}!", |src| {
            Ok(Expr::Identifier {
                qualified_name: format!("local.{src}"),
                span: Span::dummy(),
            })
        })
        .unwrap();
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], FStringPart::Literal(s) if s == "Hello "));
        assert!(matches!(&parts[2], FStringPart::Literal(s) if s == "!"));
    }

    #[test]
    fn escaped_braces_become_literal() {
        let parts = parse_fstring_parts("{{literal}}", |src| {
            Ok(Expr::Literal {
                value: LiteralValue::None,
                span: Span::dummy(),
            })
            .map_err(|_: ParseError| unreachable!())
            .or_else(|_| {
                Ok(Expr::Identifier {
                    qualified_name: src.to_string(),
                    span: Span::dummy(),
                })
            })
        })
        .unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(&parts[0], FStringPart::Literal(s) if s == "{literal}"));
    }
}
