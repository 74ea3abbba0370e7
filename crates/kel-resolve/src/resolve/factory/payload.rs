//! Payload node shapes, one per discriminant.
//!
//! Every payload node is a JSON object tagged with `"@class"`. Nested type
//! positions stay as raw [`Value`]s so each can be dispatched on its own tag.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use kel_ast::ScopeType;

use crate::error::FactoryError;

/// Discriminant key.
pub const CLASS_KEY: &str = "@class";

pub mod class {
    pub const TYPE_REGISTRY: &str = "TypeRegistry";
    pub const TYPE: &str = "Type";
    pub const ARRAY_TYPE: &str = "ArrayType";
    pub const UNION_TYPE: &str = "UnionType";
    pub const GENERIC_TYPE: &str = "GenericType";
    pub const TYPE_REF: &str = "TypeRef";
    pub const SYMBOL_TABLE: &str = "SymbolTable";
    pub const VARIABLE_SYMBOL: &str = "VariableSymbol";
    pub const FUNCTION_SYMBOL: &str = "FunctionSymbol";
    pub const SCOPE: &str = "Scope";

    /// Every class a factory exists for.
    pub const ALL: &[&str] = &[
        TYPE_REGISTRY,
        TYPE,
        ARRAY_TYPE,
        UNION_TYPE,
        GENERIC_TYPE,
        TYPE_REF,
        SYMBOL_TABLE,
        VARIABLE_SYMBOL,
        FUNCTION_SYMBOL,
        SCOPE,
    ];
}

#[derive(Debug, Deserialize)]
pub struct RegistryPayload {
    #[serde(default)]
    pub types: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypePayload {
    pub name: String,
    #[serde(default)]
    pub extended_types: Vec<Value>,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayTypePayload {
    pub element_type: Value,
}

#[derive(Debug, Deserialize)]
pub struct UnionTypePayload {
    pub left: Value,
    pub right: Value,
}

#[derive(Debug, Deserialize)]
pub struct GenericTypePayload {
    pub name: String,
    #[serde(default)]
    pub bound: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct TypeRefPayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SymbolTablePayload {
    #[serde(default)]
    pub references: Vec<Value>,
    #[serde(default)]
    pub functions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct VariableSymbolPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSymbolPayload {
    pub name: String,
    pub return_type: Value,
    #[serde(default)]
    pub parameters: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopePayload {
    pub name: String,
    pub scope_type: ScopeType,
    #[serde(rename = "type")]
    pub ty: Value,
    #[serde(default)]
    pub parent_scope: Option<Value>,
}

/// Read the discriminant of a payload node.
///
/// Fails with `MissingFactory` for a tag no factory handles.
pub fn class_of(value: &Value) -> Result<&str, FactoryError> {
    let class = value
        .get(CLASS_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| FactoryError::Malformed {
            class: "<untagged>".to_string(),
            message: format!("missing '{}' discriminant", CLASS_KEY),
        })?;
    if class::ALL.contains(&class) {
        Ok(class)
    } else {
        Err(FactoryError::MissingFactory {
            class: class.to_string(),
        })
    }
}

/// Decode a node whose class has already been checked.
pub fn decode<T: DeserializeOwned>(value: &Value, class: &str) -> Result<T, FactoryError> {
    T::deserialize(value).map_err(|err| FactoryError::Malformed {
        class: class.to_string(),
        message: err.to_string(),
    })
}

/// Decode a node that must carry the `expected` class.
pub fn decode_as<T: DeserializeOwned>(value: &Value, expected: &str) -> Result<T, FactoryError> {
    let class = class_of(value)?;
    if class != expected {
        return Err(FactoryError::Malformed {
            class: class.to_string(),
            message: format!("expected a '{}' node", expected),
        });
    }
    decode(value, class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_class_has_no_factory() {
        let err = class_of(&json!({"@class": "MapType"})).unwrap_err();
        assert!(matches!(err, FactoryError::MissingFactory { ref class } if class == "MapType"));
    }

    #[test]
    fn test_untagged_node_is_malformed() {
        let err = class_of(&json!({"name": "Policy"})).unwrap_err();
        assert!(matches!(err, FactoryError::Malformed { .. }));
    }

    #[test]
    fn test_scope_type_names() {
        let payload: ScopePayload = decode_as(
            &json!({
                "@class": "Scope",
                "name": "rule",
                "scopeType": "VARIABLES_MAP",
                "type": {"@class": "TypeRef", "name": "Any"}
            }),
            class::SCOPE,
        )
        .unwrap();
        assert_eq!(payload.scope_type, ScopeType::VariablesMap);
        assert!(payload.parent_scope.is_none());
    }
}
