//! Tests for special expression forms: paths, bracket access, calls, casts,
//! conditionals, iteration, value blocks and inline collections.

use kel_ast::{Expr, ExprKind, IterationKind, TypeExprKind};
use kel_parser::{parse_expr, parse_type};

fn parse(source: &str) -> Expr {
    match parse_expr(source) {
        Ok(expr) => expr,
        Err(errors) => panic!("Failed to parse '{}': {:?}", source, errors),
    }
}

// === Paths and access ===

#[test]
fn test_path_chain_is_left_nested() {
    let expr = parse("Policy.riskItems.rentalCoverage");
    assert_eq!(expr.reference_key().as_deref(), Some("Policy.riskItems.rentalCoverage"));
    match &expr.kind {
        ExprKind::Path { object, .. } => {
            assert!(matches!(object.kind, ExprKind::Path { .. }));
        }
        other => panic!("expected path, got {:?}", other),
    }
}

#[test]
fn test_null_safe_path() {
    let expr = parse("Policy?.vehicle");
    assert!(matches!(expr.kind, ExprKind::Path { null_safe: true, .. }));
}

#[test]
fn test_index_and_filter() {
    let expr = parse("Policy.riskItems[0]");
    assert!(matches!(
        expr.kind,
        ExprKind::Access {
            explicit_filter: false,
            ..
        }
    ));

    let expr = parse("Policy.riskItems?[included]");
    match &expr.kind {
        ExprKind::Access {
            predicate,
            explicit_filter: true,
            ..
        } => assert!(matches!(predicate.kind, ExprKind::Identifier(_))),
        other => panic!("expected filter, got {:?}", other),
    }
}

#[test]
fn test_access_then_path() {
    let expr = parse("riskItems[0].rentalCoverage.limitAmount");
    assert_eq!(expr.span.end, 39);
    assert_eq!(expr.reference_key(), None);
}

#[test]
fn test_keyword_as_member_name() {
    let expr = parse("Policy.set");
    assert_eq!(expr.reference_key().as_deref(), Some("Policy.set"));
}

// === Calls ===

#[test]
fn test_function_call() {
    let expr = parse("Count(Policy.riskItems)");
    match &expr.kind {
        ExprKind::Call { name, args } => {
            assert_eq!(name.name, "Count");
            assert_eq!((name.span.start, name.span.end), (0, 5));
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected call, got {:?}", other),
    }
    assert!(matches!(parse("Today()").kind, ExprKind::Call { ref args, .. } if args.is_empty()));
}

#[test]
fn test_member_call() {
    let expr = parse("Policy.Describe(1, 2)");
    match &expr.kind {
        ExprKind::Path { property, .. } => {
            assert!(matches!(&property.kind, ExprKind::Call { args, .. } if args.len() == 2));
        }
        other => panic!("expected path, got {:?}", other),
    }
}

// === Types ===

#[test]
fn test_cast() {
    let expr = parse("(Policy) this");
    match &expr.kind {
        ExprKind::Cast { ty, value } => {
            assert!(matches!(&ty.kind, TypeExprKind::Named(name) if name == "Policy"));
            assert!(matches!(value.kind, ExprKind::This));
        }
        other => panic!("expected cast, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_identifier_is_not_cast() {
    let expr = parse("(a) + b");
    assert!(matches!(expr.kind, ExprKind::Binary { .. }));
}

#[test]
fn test_instanceof_and_typeof() {
    assert!(matches!(parse("this instanceof Vehicle").kind, ExprKind::InstanceOf { .. }));
    assert!(matches!(parse("x typeof Money").kind, ExprKind::TypeOf { .. }));
}

#[test]
fn test_type_expressions() {
    let ty = parse_type("Vehicle[] | Policy").unwrap();
    assert_eq!(ty.to_string(), "Vehicle[] | Policy");

    let ty = parse_type("<T extends Number>").unwrap();
    assert!(matches!(ty.kind, TypeExprKind::Generic { ref name, bound: Some(_) } if name == "T"));

    let ty = parse_type("(A | B)[]").unwrap();
    assert_eq!(ty.to_string(), "(A | B)[]");

    assert!(parse_type("Vehicle Policy").is_err());
}

// === Conditionals ===

#[test]
fn test_if_then_else() {
    let expr = parse("if x > 0 then x else 0");
    assert!(matches!(expr.kind, ExprKind::If { else_branch: Some(_), .. }));
}

#[test]
fn test_if_without_else() {
    let expr = parse("if active then 1");
    assert!(matches!(expr.kind, ExprKind::If { else_branch: None, .. }));
}

// === Iteration ===

#[test]
fn test_for_return() {
    let expr = parse("for v in Policy.riskItems return v.modelYear");
    match &expr.kind {
        ExprKind::Iteration {
            kind,
            variable,
            collection,
            ..
        } => {
            assert_eq!(*kind, IterationKind::For);
            assert_eq!(variable.name, "v");
            assert!(matches!(collection.kind, ExprKind::Path { .. }));
        }
        other => panic!("expected iteration, got {:?}", other),
    }
}

#[test]
fn test_some_and_every() {
    assert!(matches!(
        parse("some v in xs satisfies v > 1").kind,
        ExprKind::Iteration {
            kind: IterationKind::Some,
            ..
        }
    ));
    assert!(matches!(
        parse("every v in xs satisfies v.included").kind,
        ExprKind::Iteration {
            kind: IterationKind::Every,
            ..
        }
    ));
}

// === Value blocks ===

#[test]
fn test_value_block() {
    let expr = parse("set a to 1, b to a + 1 return a * b");
    match &expr.kind {
        ExprKind::ValueBlock { bindings, body } => {
            let names: Vec<_> = bindings.iter().map(|b| b.name.name.as_str()).collect();
            assert_eq!(names, vec!["a", "b"]);
            assert!(matches!(body.kind, ExprKind::Binary { .. }));
        }
        other => panic!("expected value block, got {:?}", other),
    }
}

// === Literals and inline collections ===

#[test]
fn test_literals() {
    assert!(matches!(parse("2.5").kind, ExprKind::Number(v) if v == 2.5));
    assert!(matches!(parse("'abc'").kind, ExprKind::String(ref s) if s == "abc"));
    assert!(matches!(parse("2020-01-01").kind, ExprKind::Date(_)));
    assert!(matches!(parse("2020-01-01T10:00:00Z").kind, ExprKind::DateTime(_)));
    assert!(matches!(parse("null").kind, ExprKind::Null));
    assert!(matches!(parse("true").kind, ExprKind::Boolean(true)));
}

#[test]
fn test_inline_array_and_map() {
    assert!(matches!(parse("{1, 2, 3}").kind, ExprKind::InlineArray(ref xs) if xs.len() == 3));
    assert!(matches!(parse("{}").kind, ExprKind::InlineArray(ref xs) if xs.is_empty()));
    match parse("{limit: 10, name: 'x'}").kind {
        ExprKind::InlineMap(entries) => {
            let keys: Vec<_> = entries.iter().map(|e| e.key.name.as_str()).collect();
            assert_eq!(keys, vec!["limit", "name"]);
        }
        other => panic!("expected inline map, got {:?}", other),
    }
}
