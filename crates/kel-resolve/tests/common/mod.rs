//! Shared Policy/Vehicle/Coverage fixture for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use kel_ast::{Node, Scope};
use kel_resolve::{
    Diagnostic, FunctionLibrary, Severity, ValidationOptions, generate, registry_from_value,
    scope_from_value, validate,
};
use serde_json::{Value, json};

fn type_ref(name: &str) -> Value {
    json!({"@class": "TypeRef", "name": name})
}

fn array_of(element: Value) -> Value {
    json!({"@class": "ArrayType", "elementType": element})
}

fn reference(name: &str, ty: Value) -> Value {
    json!({"@class": "VariableSymbol", "name": name, "type": ty})
}

fn members(references: Vec<Value>) -> Value {
    json!({"@class": "SymbolTable", "references": references, "functions": []})
}

/// Domain model: a policy insuring vehicles with coverages.
pub fn registry_payload() -> Value {
    json!({
        "@class": "TypeRegistry",
        "types": [
            {
                "@class": "Type",
                "name": "Context",
                "properties": members(vec![reference("Policy", type_ref("Policy"))])
            },
            {
                "@class": "Type",
                "name": "Policy",
                "properties": members(vec![
                    reference("policyNumber", type_ref("String")),
                    reference("state", type_ref("String")),
                    reference("premium", type_ref("Money")),
                    reference("startDate", type_ref("Date")),
                    reference("riskItems", array_of(type_ref("Vehicle"))),
                ])
            },
            {
                "@class": "Type",
                "name": "Vehicle",
                "properties": members(vec![
                    reference("model", type_ref("String")),
                    reference("included", type_ref("Boolean")),
                    reference("value", type_ref("Money")),
                    reference("rentalCoverage", type_ref("RRCoverage")),
                    reference("coverages", array_of(type_ref("Coverage"))),
                ])
            },
            {
                "@class": "Type",
                "name": "Coverage",
                "properties": members(vec![
                    reference("code", type_ref("String")),
                    reference("limitAmount", type_ref("Number")),
                ])
            },
            {
                "@class": "Type",
                "name": "RRCoverage",
                "extendedTypes": [type_ref("Coverage")],
                "properties": members(vec![
                    reference("code", type_ref("String")),
                    reference("limitAmount", type_ref("Number")),
                    reference("dailyLimit", type_ref("Money")),
                ])
            },
            {
                "@class": "Type",
                "name": "Driver",
                "properties": members(vec![reference("name", type_ref("String"))])
            }
        ]
    })
}

/// Evaluation scope: a local `Policy` scope below the global context.
pub fn scope_payload() -> Value {
    json!({
        "@class": "Scope",
        "name": "Policy",
        "scopeType": "LOCAL",
        "type": type_ref("Policy"),
        "parentScope": {
            "@class": "Scope",
            "name": "global",
            "scopeType": "GLOBAL",
            "type": type_ref("Context")
        }
    })
}

/// Policy scope with the standard library installed.
pub fn policy_scope() -> Arc<Scope> {
    let registry = registry_from_value(&registry_payload()).unwrap();
    let scope = scope_from_value(&scope_payload(), Arc::new(registry)).unwrap();
    FunctionLibrary::standard().install(&scope)
}

pub fn typed(source: &str) -> Node {
    let parsed = kel_parser::parse(source);
    generate(&parsed.expr, &policy_scope()).unwrap()
}

pub fn diagnostics(source: &str) -> Vec<Diagnostic> {
    validate(&typed(source), &ValidationOptions::default())
}

pub fn errors(source: &str) -> Vec<Diagnostic> {
    diagnostics(source)
        .into_iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .collect()
}

pub fn type_of(source: &str) -> String {
    typed(source).ty.to_string()
}
