//! Typed AST generation against the Policy fixture.

mod common;

use std::sync::Arc;

use common::{type_of, typed};
use kel_ast::{NodeKind, Scope, ScopeType, Type, TypeRegistry, walk_node};
use kel_resolve::{GenerationError, generate};

// === Paths and access ===

#[test]
fn test_path_through_index() {
    assert_eq!(type_of("riskItems[0].rentalCoverage.limitAmount"), "Number");
    assert_eq!(type_of("riskItems[0].rentalCoverage"), "RRCoverage");
}

#[test]
fn test_filters_keep_collection_type() {
    assert_eq!(type_of("Policy.riskItems?[included]"), "Vehicle[]");
    assert_eq!(type_of("Policy.riskItems[included]"), "Vehicle[]");

    let node = typed("Policy.riskItems[included]");
    assert_eq!(node.kind, NodeKind::CollectionFilter { explicit: false });
    let node = typed("Policy.riskItems?[included]");
    assert_eq!(node.kind, NodeKind::CollectionFilter { explicit: true });
}

#[test]
fn test_path_property_ignores_outer_scopes() {
    assert_eq!(type_of("riskItems[0].premium"), "Unknown");
    assert_eq!(type_of("riskItems[0].Policy"), "Unknown");
    assert_eq!(type_of("Policy.riskItems.state"), "Unknown");
}

#[test]
fn test_numeric_predicate_is_index() {
    let node = typed("riskItems[1 + 1]");
    assert_eq!(node.kind, NodeKind::AccessByIndex);
    assert_eq!(node.ty.to_string(), "Vehicle");
}

#[test]
fn test_path_maps_over_collections() {
    assert_eq!(type_of("Policy.riskItems.model"), "String[]");
    assert_eq!(type_of("riskItems.coverages"), "Coverage[]");
    assert_eq!(type_of("riskItems.rentalCoverage.dailyLimit"), "Money[]");
}

#[test]
fn test_path_property_scope() {
    let node = typed("Policy.state");
    let property = node.child(1).unwrap();
    assert_eq!(property.scope.scope_type(), ScopeType::Path);
    assert_eq!(property.scope.ty().to_string(), "Policy");
    assert_eq!(property.ty, Type::string());
}

#[test]
fn test_filter_predicate_sees_element_and_outer_scope() {
    // `premium` comes from the enclosing Policy scope
    assert_eq!(type_of("riskItems[value > premium]"), "Vehicle[]");

    let node = typed("riskItems[this.included]");
    let predicate = node.child(1).unwrap();
    assert_eq!(predicate.scope.scope_type(), ScopeType::Filter);
    assert_eq!(predicate.child(0).unwrap().ty.to_string(), "Vehicle");
}

#[test]
fn test_this_is_scope_type() {
    assert_eq!(type_of("this"), "Policy");
    assert_eq!(type_of("this.premium"), "Money");
}

#[test]
fn test_unresolved_reference_is_unknown() {
    assert_eq!(type_of("Policu"), "Unknown");
    assert_eq!(type_of("Policu.riskItems"), "Unknown");
    assert_eq!(type_of("Policy.nope"), "Unknown");
}

// === Functions ===

#[test]
fn test_function_return_types() {
    assert_eq!(type_of("Count(riskItems)"), "Number");
    assert_eq!(type_of("First(riskItems).value"), "Money");
    assert_eq!(type_of("Max(riskItems.value)"), "Money");
    assert_eq!(type_of("Distinct(riskItems.model)"), "String[]");
    assert_eq!(type_of("Today()"), "Date");
}

#[test]
fn test_unresolved_function_is_unknown() {
    let node = typed("Count(riskItems, 1)");
    assert_eq!(
        node.kind,
        NodeKind::Function {
            name: "Count".to_string(),
            arity: 2
        }
    );
    assert!(node.ty.is_unknown());
}

#[test]
fn test_dynamic_global_scope_cannot_resolve_functions() {
    let global = Scope::root(
        "global",
        ScopeType::Global,
        Type::Any,
        Arc::new(TypeRegistry::new()),
    );
    let parsed = kel_parser::parse("Count(anything)");
    assert!(matches!(
        generate(&parsed.expr, &global),
        Err(GenerationError::Scope(_))
    ));

    let parsed = kel_parser::parse("anything.at.all");
    assert_eq!(generate(&parsed.expr, &global).unwrap().ty, Type::Any);
}

// === Operators and literals ===

#[test]
fn test_arithmetic_and_comparison() {
    assert_eq!(type_of("premium + premium"), "Money");
    assert_eq!(type_of("premium * 2"), "Number");
    assert_eq!(type_of("-premium"), "Money");
    assert_eq!(type_of("premium > 10 and not (state = 'CA')"), "Boolean");
    assert_eq!(type_of("state matches '^C'"), "Boolean");
}

#[test]
fn test_literals() {
    assert_eq!(type_of("2020-01-01"), "Date");
    assert_eq!(type_of("2020-01-01T10:00:00Z"), "DateTime");
    assert_eq!(type_of("null"), "Any");
    assert_eq!(type_of("{1, 2.5, premium}"), "Number[]");
    assert_eq!(type_of("{limit: 10, name: 'x'}"), "{limit: Number, name: String}");
}

// === Narrowing ===

#[test]
fn test_instanceof_narrows_filter() {
    let source = "riskItems[0].coverages[this instanceof RRCoverage and this.dailyLimit > 0]";
    assert_eq!(type_of(source), "RRCoverage[]");

    let node = typed(source);
    let mut daily_limit = None;
    walk_node(&node, &mut |node| {
        if node.kind == (NodeKind::Identifier { name: "dailyLimit".to_string() }) {
            daily_limit = Some(node.ty.clone());
        }
    });
    assert_eq!(daily_limit, Some(Type::money()));
}

#[test]
fn test_narrowing_in_then_branch_only() {
    let source = "for c in riskItems[0].coverages return if c instanceof RRCoverage then c else c";
    let body = typed(source).child(2).unwrap().clone();
    assert_eq!(body.kind, NodeKind::If);
    assert_eq!(body.child(1).unwrap().ty.to_string(), "RRCoverage");
    assert_eq!(body.child(2).unwrap().ty.to_string(), "Coverage");
    assert_eq!(body.ty.to_string(), "Coverage");
}

#[test]
fn test_supertype_test_keeps_original_type() {
    let source = "for v in riskItems return \
                  if v.rentalCoverage instanceof Coverage \
                  then v.rentalCoverage.dailyLimit else 0";
    let body = typed(source).child(2).unwrap().clone();
    assert!(body.child(0).unwrap().facts.is_none());
    assert_eq!(body.child(1).unwrap().ty.to_string(), "Money");

    let node = typed("this instanceof Policy");
    assert!(node.facts.is_none());
}

#[test]
fn test_unknown_type_produces_no_fact() {
    let node = typed("this instanceof Nope");
    assert!(node.facts.is_none());
    assert!(node.child(1).unwrap().ty.is_unknown());
}

// === Casts, conditionals, iteration, bindings ===

#[test]
fn test_cast_takes_target_type() {
    assert_eq!(type_of("(Coverage) riskItems[0].rentalCoverage"), "Coverage");
    let node = typed("(Number) premium");
    assert!(matches!(node.child(0).unwrap().kind, NodeKind::Type { .. }));
}

#[test]
fn test_if_common_type() {
    assert_eq!(type_of("if state = 'CA' then premium else 0"), "Number");
    assert_eq!(type_of("if state = 'CA' then premium"), "Money");
    assert_eq!(type_of("if state = 'CA' then premium else 'none'"), "Unknown");
}

#[test]
fn test_iterations() {
    assert_eq!(type_of("for v in riskItems return v.value"), "Money[]");
    assert_eq!(type_of("some v in riskItems satisfies v.included"), "Boolean");
    assert_eq!(type_of("every v in riskItems satisfies v.value > 0"), "Boolean");

    let node = typed("for v in riskItems return v");
    let variable = node.child(0).unwrap();
    assert_eq!(variable.kind, NodeKind::Variable { name: "v".to_string() });
    assert_eq!(variable.ty.to_string(), "Vehicle");
    assert_eq!(node.child(2).unwrap().scope.scope_type(), ScopeType::VariablesMap);
}

#[test]
fn test_value_block_bindings() {
    assert_eq!(type_of("set p to premium return p"), "Money");
    assert_eq!(
        type_of("set total to premium * 2, half to total / 2 return half > 100"),
        "Boolean"
    );

    let node = typed("set p to premium return p");
    assert_eq!(node.children.len(), 2);
    assert_eq!(node.child(0).unwrap().child(0).unwrap().ty, Type::money());
}

// === Recovery ===

#[test]
fn test_incomplete_path_has_empty_property() {
    let node = typed("Policy.");
    let property = node.child(1).unwrap();
    assert!(property.is_empty());
    assert_eq!(property.scope.scope_type(), ScopeType::Path);
    assert!(node.ty.is_unknown());
}
