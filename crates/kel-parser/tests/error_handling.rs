//! Error handling tests for the KEL parser.
//!
//! This test suite verifies that the parser reports syntax problems and
//! still hands back a usable tree:
//! - Missing operands, members, indices and branches become `Missing`
//!   placeholders at the insertion point
//! - Unrecognised input becomes an `Error` expression
//! - Empty input is a single `Missing` expression

use kel_ast::{Expr, ExprKind};
use kel_parser::{ParseError, ParseErrorKind, ParseOutput, parse};

/// Helper to verify that parsing reports at least one error.
fn expect_error(source: &str) -> ParseOutput {
    let output = parse(source);
    assert!(
        output.has_errors(),
        "Expected parse error for '{}', got {:?}",
        source,
        output.expr
    );
    output
}

fn first_error(output: &ParseOutput) -> &ParseError {
    &output.errors[0]
}

fn path_property(expr: &Expr) -> &Expr {
    match &expr.kind {
        ExprKind::Path { property, .. } => property,
        other => panic!("expected path, got {:?}", other),
    }
}

// =============================================================================
// Partial input
// =============================================================================

#[test]
fn test_empty_input() {
    let output = parse("");
    assert!(output.expr.is_missing());
    assert_eq!(output.expr.span.start, 0);
    assert!(!output.has_errors());

    assert!(parse("   ").expr.is_missing());
}

#[test]
fn test_trailing_dot() {
    let output = expect_error("Policy.");
    let property = path_property(&output.expr);
    assert!(property.is_missing());
    assert_eq!((property.span.start, property.span.end), (7, 7));
    assert_eq!(first_error(&output).kind, ParseErrorKind::UnexpectedEof);
}

#[test]
fn test_unclosed_bracket() {
    let output = expect_error("riskItems[");
    match &output.expr.kind {
        ExprKind::Access { predicate, .. } => {
            assert!(predicate.is_missing());
            assert_eq!(predicate.span.start, 10);
        }
        other => panic!("expected access, got {:?}", other),
    }
}

#[test]
fn test_empty_brackets() {
    let output = expect_error("riskItems[]");
    assert!(matches!(
        output.expr.kind,
        ExprKind::Access { ref predicate, .. } if predicate.is_missing()
    ));
    assert_eq!(output.errors.len(), 1);
}

#[test]
fn test_missing_right_operand() {
    let output = expect_error("1 +");
    match &output.expr.kind {
        ExprKind::Binary { right, .. } => assert!(right.is_missing()),
        other => panic!("expected binary, got {:?}", other),
    }
}

#[test]
fn test_unclosed_paren_in_function_call() {
    let output = expect_error("Count(Policy.riskItems");
    assert!(matches!(output.expr.kind, ExprKind::Call { ref args, .. } if args.len() == 1));
    assert!(
        first_error(&output).message.contains("expected ')'"),
        "got: {:?}",
        output.errors
    );
}

#[test]
fn test_missing_then_branch() {
    let output = expect_error("if a then");
    match &output.expr.kind {
        ExprKind::If { then_branch, .. } => assert!(then_branch.is_missing()),
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_missing_iteration_body() {
    let output = expect_error("for v in xs return");
    match &output.expr.kind {
        ExprKind::Iteration { body, variable, .. } => {
            assert!(body.is_missing());
            assert_eq!(variable.name, "v");
        }
        other => panic!("expected iteration, got {:?}", other),
    }
}

#[test]
fn test_missing_iteration_variable() {
    let output = expect_error("for in xs return 1");
    match &output.expr.kind {
        ExprKind::Iteration { variable, .. } => assert!(variable.name.is_empty()),
        other => panic!("expected iteration, got {:?}", other),
    }
}

// =============================================================================
// Malformed input
// =============================================================================

#[test]
fn test_unrecognised_input_becomes_error_expression() {
    let output = expect_error("#");
    assert!(matches!(output.expr.kind, ExprKind::Error(ref text) if text == "#"));
    assert_eq!(first_error(&output).kind, ParseErrorKind::InvalidToken);
}

#[test]
fn test_operator_in_operand_position() {
    let output = expect_error("1 + *");
    match &output.expr.kind {
        ExprKind::Binary { right, .. } => {
            assert!(matches!(right.kind, ExprKind::Error(ref text) if text == "*"));
        }
        other => panic!("expected binary, got {:?}", other),
    }
}

#[test]
fn test_trailing_tokens_reported() {
    let output = expect_error("a b");
    assert!(matches!(output.expr.kind, ExprKind::Identifier(ref name) if name == "a"));
    assert!(first_error(&output).message.contains("after expression"));
}

#[test]
fn test_unterminated_string() {
    let output = expect_error("'abc");
    assert_eq!(first_error(&output).kind, ParseErrorKind::InvalidToken);
}

#[test]
fn test_mixed_inline_map() {
    let output = expect_error("{a: 1, 2}");
    assert!(matches!(output.expr.kind, ExprKind::InlineMap(ref entries) if entries.len() == 1));
    assert!(
        output
            .errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::InvalidSyntax)
    );
}
