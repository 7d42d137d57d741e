//! End-to-end lex → parse scenarios, one per surface construct that a
//! single-pass recursive-descent parser is most likely to get wrong.

use dana_compiler::ast::{BinaryOp, Expr, Stmt};
use dana_compiler::{compile, CompileError};

fn parse(source: &str) -> Vec<Stmt> {
    compile(source).unwrap_or_else(|e| panic!("expected {source:?} to compile, got {e}")).statements
}

#[test]
fn binary_operators_respect_precedence() {
    let stmts = parse("x = 2 + 3 * 4\n");
    match &stmts[0] {
        Stmt::Assignment { value, .. } => match value.as_ref() {
            Expr::BinaryExpression { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(right.as_ref(), Expr::BinaryExpression { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected a top-level Add, got {other:?}"),
        },
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn pipe_is_left_associative() {
    let stmts = parse("y = a | b | c\n");
    match &stmts[0] {
        Stmt::Assignment { value, .. } => match value.as_ref() {
            Expr::BinaryExpression { op: BinaryOp::Pipe, left, .. } => {
                assert!(matches!(left.as_ref(), Expr::BinaryExpression { op: BinaryOp::Pipe, .. }));
            }
            other => panic!("expected a top-level Pipe, got {other:?}"),
        },
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn indentation_drives_block_nesting() {
    let stmts = parse("if x:\n    if y:\n        pass\n    else:\n        pass\n");
    match &stmts[0] {
        Stmt::Conditional { then_body, .. } => {
            assert_eq!(then_body.len(), 1);
            assert!(matches!(then_body[0], Stmt::Conditional { .. }));
        }
        other => panic!("expected a conditional, got {other:?}"),
    }
}

#[test]
fn function_definition_captures_params_and_return_type() {
    let stmts = parse("def add(a: int, b: int) -> int:\n    return a + b\n");
    match &stmts[0] {
        Stmt::FunctionDefinition { name, params, return_type, body, .. } => {
            assert_eq!(name, "add");
            assert_eq!(params.len(), 2);
            assert_eq!(params[0].type_hint.as_deref(), Some("int"));
            assert_eq!(return_type.as_deref(), Some("int"));
            assert_eq!(body.len(), 1);
        }
        other => panic!("expected a function definition, got {other:?}"),
    }
}

#[test]
fn struct_definition_captures_typed_fields() {
    let stmts = parse("struct Point:\n    x: int\n    y: int\n");
    match &stmts[0] {
        Stmt::StructDefinition { name, fields, .. } => {
            assert_eq!(name, "Point");
            assert_eq!(fields, &vec![("x".to_string(), "int".to_string()), ("y".to_string(), "int".to_string())]);
        }
        other => panic!("expected a struct definition, got {other:?}"),
    }
}

#[test]
fn fstring_splits_literal_and_expression_parts() {
    let stmts = parse("msg = f\"Hello {name}!\"\n");
    match &stmts[0] {
        Stmt::Assignment { value, .. } => match value.as_ref() {
            Expr::FStringExpression { parts, .. } => assert_eq!(parts.len(), 3),
            other => panic!("expected an f-string, got {other:?}"),
        },
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn import_from_collects_names_and_aliases() {
    let stmts = parse("from math_helpers import add, sub as subtract\n");
    match &stmts[0] {
        Stmt::ImportFromStatement { module_path, names, .. } => {
            assert_eq!(module_path, "math_helpers");
            assert_eq!(names[0], ("add".to_string(), None));
            assert_eq!(names[1], ("sub".to_string(), Some("subtract".to_string())));
        }
        other => panic!("expected an import-from, got {other:?}"),
    }
}

#[test]
fn try_except_collects_named_and_bare_handlers() {
    let stmts = parse(
        "try:\n    risky()\nexcept ValueError as e:\n    pass\nexcept:\n    pass\nfinally:\n    cleanup()\n",
    );
    match &stmts[0] {
        Stmt::TryBlock { except_blocks, finally, .. } => {
            assert_eq!(except_blocks.len(), 2);
            assert_eq!(except_blocks[0].exc_name.as_deref(), Some("ValueError"));
            assert_eq!(except_blocks[0].binding.as_deref(), Some("e"));
            assert!(except_blocks[1].exc_name.is_none());
            assert!(finally.is_some());
        }
        other => panic!("expected a try block, got {other:?}"),
    }
}

#[test]
fn slice_with_all_three_parts_parses() {
    let stmts = parse("y = xs[1:5:2]\n");
    match &stmts[0] {
        Stmt::Assignment { value, .. } => match value.as_ref() {
            Expr::SubscriptExpression { index, .. } => {
                assert!(matches!(
                    index,
                    dana_compiler::ast::SliceIndex::Slice { start: Some(_), stop: Some(_), step: Some(_) }
                ));
            }
            other => panic!("expected a subscript, got {other:?}"),
        },
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn missing_colon_on_a_block_header_is_a_parse_error() {
    let err = compile("if x\n    pass\n").unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
}

#[test]
fn parse_error_diagnostic_carries_a_location_and_a_suggestion() {
    let err = compile("if x\n    pass\n").unwrap_err();
    let diagnostic = err.to_diagnostic();
    assert!(diagnostic.line.is_some());
    let rendered = diagnostic.render_plain();
    assert!(rendered.contains("line"));
}

#[test]
fn tab_width_is_fixed_and_mixed_indentation_is_rejected() {
    let err = compile("if x:\n \tpass\n").unwrap_err();
    assert!(matches!(err, CompileError::Lex(_)));
}
