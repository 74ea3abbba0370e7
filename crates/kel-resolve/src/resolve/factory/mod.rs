//! Deserialization factory for type registries and scope graphs.
//!
//! The domain model arrives as a JSON tree of nodes tagged with an `"@class"`
//! discriminant:
//!
//! | class            | fields                                          |
//! |------------------|-------------------------------------------------|
//! | `TypeRegistry`   | `types: [Type]`                                 |
//! | `Type`           | `name`, `extendedTypes?: [type]`, `properties?: SymbolTable` |
//! | `ArrayType`      | `elementType: type`                             |
//! | `UnionType`      | `left: type`, `right: type`                     |
//! | `GenericType`    | `name`, `bound?: type`                          |
//! | `TypeRef`        | `name` (back-reference to a registered type)    |
//! | `SymbolTable`    | `references: [VariableSymbol]`, `functions: [FunctionSymbol]` |
//! | `VariableSymbol` | `name`, `type: type`                            |
//! | `FunctionSymbol` | `name`, `returnType: type`, `parameters: [type]` |
//! | `Scope`          | `name`, `scopeType`, `type: type`, `parentScope?: Scope` |
//!
//! Back-references are resolved by name after the whole registry has been
//! collected, so the domain graph may be cyclic and entries may appear in any
//! order.
//!
//! # Examples
//!
//! ```
//! # use std::sync::Arc;
//! # use kel_resolve::factory::{registry_from_value, scope_from_value};
//! # use serde_json::json;
//! let registry = registry_from_value(&json!({
//!     "@class": "TypeRegistry",
//!     "types": [{"@class": "Type", "name": "Policy"}]
//! }))
//! .unwrap();
//! let scope = scope_from_value(
//!     &json!({
//!         "@class": "Scope",
//!         "name": "policy",
//!         "scopeType": "GLOBAL",
//!         "type": {"@class": "TypeRef", "name": "Policy"}
//!     }),
//!     Arc::new(registry),
//! )
//! .unwrap();
//! assert_eq!(scope.ty().to_string(), "Policy");
//! ```

mod payload;
mod registry;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use kel_ast::{FunctionSymbol, Scope, SymbolTable, Type, TypeRegistry, VariableSymbol};

use crate::error::FactoryError;
use payload::{
    ArrayTypePayload, FunctionSymbolPayload, GenericTypePayload, RegistryPayload,
    ScopePayload, SymbolTablePayload, TypePayload, TypeRefPayload, UnionTypePayload,
    VariableSymbolPayload, class, class_of, decode, decode_as,
};
use registry::RegistryBuilder;

/// Rebuild a type registry from its payload.
pub fn registry_from_value(payload: &Value) -> Result<TypeRegistry, FactoryError> {
    let payload: RegistryPayload = decode_as(payload, class::TYPE_REGISTRY)?;
    RegistryBuilder::collect(&payload)?.build()
}

/// Rebuild a type registry from JSON text.
pub fn registry_from_str(text: &str) -> Result<TypeRegistry, FactoryError> {
    let value: Value = serde_json::from_str(text)?;
    registry_from_value(&value)
}

/// Rebuild a scope chain against a completed registry.
pub fn scope_from_value(
    payload: &Value,
    registry: Arc<TypeRegistry>,
) -> Result<Arc<Scope>, FactoryError> {
    let scope = decode_scope(payload, &registry)?;
    debug!(
        scope = scope.name(),
        depth = scope.chain().count(),
        "built scope graph"
    );
    Ok(scope)
}

/// Rebuild a scope chain from JSON text.
pub fn scope_from_str(
    text: &str,
    registry: Arc<TypeRegistry>,
) -> Result<Arc<Scope>, FactoryError> {
    let value: Value = serde_json::from_str(text)?;
    scope_from_value(&value, registry)
}

fn decode_scope(value: &Value, registry: &Arc<TypeRegistry>) -> Result<Arc<Scope>, FactoryError> {
    let payload: ScopePayload = decode_as(value, class::SCOPE)?;
    let ty = decode_type(&payload.ty, &mut ScopeTypes { registry })?;
    match &payload.parent_scope {
        Some(parent) => {
            let parent = decode_scope(parent, registry)?;
            Ok(parent.child(payload.name, payload.scope_type, ty))
        }
        None => Ok(Scope::root(
            payload.name,
            payload.scope_type,
            ty,
            Arc::clone(registry),
        )),
    }
}

/// Resolves type names met while decoding type payloads.
trait TypeNames {
    /// A `TypeRef` (or a name that must already be known).
    fn named(&mut self, name: &str) -> Result<Type, FactoryError>;

    /// A `Type` node embedded in a type position.
    fn inline(&mut self, payload: TypePayload) -> Result<Type, FactoryError>;
}

fn decode_type<N: TypeNames>(value: &Value, names: &mut N) -> Result<Type, FactoryError> {
    let class = class_of(value)?;
    match class {
        class::TYPE => names.inline(decode(value, class)?),
        class::TYPE_REF => {
            let payload: TypeRefPayload = decode(value, class)?;
            names.named(&payload.name)
        }
        class::ARRAY_TYPE => {
            let payload: ArrayTypePayload = decode(value, class)?;
            Ok(Type::array(decode_type(&payload.element_type, names)?))
        }
        class::UNION_TYPE => {
            let payload: UnionTypePayload = decode(value, class)?;
            let left = decode_type(&payload.left, names)?;
            let right = decode_type(&payload.right, names)?;
            Ok(Type::union(left, right))
        }
        class::GENERIC_TYPE => {
            let payload: GenericTypePayload = decode(value, class)?;
            let bound = payload
                .bound
                .as_ref()
                .map(|bound| decode_type(bound, names))
                .transpose()?;
            Ok(Type::generic(payload.name, bound))
        }
        other => Err(FactoryError::Malformed {
            class: other.to_string(),
            message: "expected a type node".to_string(),
        }),
    }
}

fn decode_symbol_table<N: TypeNames>(
    value: &Value,
    names: &mut N,
) -> Result<SymbolTable, FactoryError> {
    let payload: SymbolTablePayload = decode_as(value, class::SYMBOL_TABLE)?;
    let mut table = SymbolTable::new();
    for reference in &payload.references {
        let reference: VariableSymbolPayload = decode_as(reference, class::VARIABLE_SYMBOL)?;
        let ty = decode_type(&reference.ty, names)?;
        table.add_reference(VariableSymbol::new(reference.name, ty));
    }
    for function in &payload.functions {
        let function: FunctionSymbolPayload = decode_as(function, class::FUNCTION_SYMBOL)?;
        let return_type = decode_type(&function.return_type, names)?;
        let parameters = function
            .parameters
            .iter()
            .map(|parameter| decode_type(parameter, names))
            .collect::<Result<Vec<_>, _>>()?;
        table.add_function(FunctionSymbol::new(function.name, return_type, parameters));
    }
    Ok(table)
}

/// Type resolution for scope payloads: names resolve against the finished
/// registry; an inline `Type` with members becomes a synthetic type.
struct ScopeTypes<'a> {
    registry: &'a TypeRegistry,
}

impl TypeNames for ScopeTypes<'_> {
    fn named(&mut self, name: &str) -> Result<Type, FactoryError> {
        if let Some(ty) = self.registry.resolve_type(name) {
            return Ok(ty);
        }
        let has_domain_types = self
            .registry
            .iter()
            .any(|definition| !definition.ty.is_primitive());
        Err(if has_domain_types {
            FactoryError::UnresolvedReference {
                name: name.to_string(),
            }
        } else {
            FactoryError::EmptyRegistry {
                name: name.to_string(),
            }
        })
    }

    fn inline(&mut self, payload: TypePayload) -> Result<Type, FactoryError> {
        if let Some(properties) = &payload.properties {
            let members = decode_symbol_table(properties, self)?;
            return Ok(Type::synthetic(payload.name, members));
        }
        self.named(&payload.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn type_ref(name: &str) -> Value {
        json!({"@class": "TypeRef", "name": name})
    }

    #[test]
    fn test_cyclic_members_resolve() {
        let registry = registry_from_value(&json!({
            "@class": "TypeRegistry",
            "types": [
                {
                    "@class": "Type",
                    "name": "Policy",
                    "properties": {
                        "@class": "SymbolTable",
                        "references": [{
                            "@class": "VariableSymbol",
                            "name": "vehicle",
                            "type": type_ref("Vehicle")
                        }]
                    }
                },
                {
                    "@class": "Type",
                    "name": "Vehicle",
                    "properties": {
                        "@class": "SymbolTable",
                        "references": [{
                            "@class": "VariableSymbol",
                            "name": "policy",
                            "type": type_ref("Policy")
                        }]
                    }
                }
            ]
        }))
        .unwrap();

        let policy = registry.resolve_type("Policy").unwrap();
        let vehicle = registry.find_reference(&policy, "vehicle").unwrap();
        assert_eq!(vehicle.ty.to_string(), "Vehicle");
        assert!(registry.find_reference(&vehicle.ty, "policy").is_some());
    }

    #[test]
    fn test_embedded_definition_is_registered() {
        let registry = registry_from_value(&json!({
            "@class": "TypeRegistry",
            "types": [{
                "@class": "Type",
                "name": "Policy",
                "properties": {
                    "@class": "SymbolTable",
                    "references": [{
                        "@class": "VariableSymbol",
                        "name": "riskItems",
                        "type": {
                            "@class": "ArrayType",
                            "elementType": {
                                "@class": "Type",
                                "name": "Vehicle",
                                "extendedTypes": [{"@class": "Type", "name": "RiskItem"}]
                            }
                        }
                    }]
                }
            }]
        }))
        .unwrap();

        let vehicle = registry.resolve_type("Vehicle").unwrap();
        assert!(registry.contains("RiskItem"));
        assert!(registry.resolve_type("RiskItem").unwrap().is_assignable_from(&vehicle));
    }

    #[test]
    fn test_inheritance_cycle_is_rejected() {
        let err = registry_from_value(&json!({
            "@class": "TypeRegistry",
            "types": [
                {"@class": "Type", "name": "A", "extendedTypes": [type_ref("B")]},
                {"@class": "Type", "name": "B", "extendedTypes": [type_ref("A")]}
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, FactoryError::InheritanceCycle { .. }));
    }

    #[test]
    fn test_reference_errors() {
        let err = registry_from_value(&json!({
            "@class": "TypeRegistry",
            "types": [{
                "@class": "Type",
                "name": "Policy",
                "extendedTypes": [type_ref("Missing")]
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, FactoryError::UnresolvedReference { ref name } if name == "Missing"));

        let empty = Arc::new(TypeRegistry::new());
        let err = scope_from_value(
            &json!({
                "@class": "Scope",
                "name": "global",
                "scopeType": "GLOBAL",
                "type": type_ref("Policy")
            }),
            empty,
        )
        .unwrap_err();
        assert!(matches!(err, FactoryError::EmptyRegistry { .. }));
    }

    #[test]
    fn test_missing_factory() {
        let err = registry_from_value(&json!({
            "@class": "TypeRegistry",
            "types": [{
                "@class": "Type",
                "name": "Policy",
                "properties": {
                    "@class": "SymbolTable",
                    "references": [{
                        "@class": "VariableSymbol",
                        "name": "limits",
                        "type": {"@class": "MapType", "key": type_ref("String")}
                    }]
                }
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, FactoryError::MissingFactory { ref class } if class == "MapType"));
    }

    #[test]
    fn test_scope_chain_and_synthetic_type() {
        let registry = Arc::new(
            registry_from_value(&json!({
                "@class": "TypeRegistry",
                "types": [{"@class": "Type", "name": "Policy"}]
            }))
            .unwrap(),
        );
        let scope = scope_from_value(
            &json!({
                "@class": "Scope",
                "name": "rule",
                "scopeType": "LOCAL",
                "type": {
                    "@class": "Type",
                    "name": "RuleVariables",
                    "properties": {
                        "@class": "SymbolTable",
                        "references": [{
                            "@class": "VariableSymbol",
                            "name": "limit",
                            "type": type_ref("Money")
                        }]
                    }
                },
                "parentScope": {
                    "@class": "Scope",
                    "name": "global",
                    "scopeType": "GLOBAL",
                    "type": type_ref("Any")
                }
            }),
            registry,
        )
        .unwrap();

        assert_eq!(scope.chain().count(), 2);
        assert_eq!(
            scope.resolve_reference_symbol("limit").map(|s| s.ty),
            Some(Type::money())
        );
        assert!(scope.parent().unwrap().is_dynamic());
    }
}
