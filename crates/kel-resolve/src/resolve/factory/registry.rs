//! Two-pass type registry build.
//!
//! 1. **Collect**: walk the whole payload and record every `Type` node by
//!    name, wherever it is embedded. Nested occurrences are back-references
//!    in all but the first position.
//! 2. **Materialise**: build each plain type with its supertypes (rejecting
//!    inheritance cycles), then decode member tables. Members name their
//!    types, so a `TypeRef` to any collected definition resolves regardless of
//!    payload order.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use kel_ast::{SymbolTable, Type, TypeDefinition, TypeRegistry};

use super::payload::{
    ArrayTypePayload, FunctionSymbolPayload, GenericTypePayload, RegistryPayload,
    SymbolTablePayload, TypePayload, UnionTypePayload, VariableSymbolPayload, class, class_of,
    decode,
};
use super::{TypeNames, decode_symbol_table, decode_type};
use crate::error::FactoryError;

pub(super) struct RegistryBuilder {
    definitions: IndexMap<String, TypePayload>,
    built: HashMap<String, Type>,
    visiting: Vec<String>,
}

impl RegistryBuilder {
    /// Pass 1: record every embedded type definition.
    pub(super) fn collect(payload: &RegistryPayload) -> Result<Self, FactoryError> {
        let mut builder = Self {
            definitions: IndexMap::new(),
            built: HashMap::new(),
            visiting: Vec::new(),
        };
        for value in &payload.types {
            let class = class_of(value)?;
            if class != class::TYPE {
                return Err(FactoryError::Malformed {
                    class: class.to_string(),
                    message: "registry entries must be 'Type' nodes".to_string(),
                });
            }
            builder.collect_value(value)?;
        }
        Ok(builder)
    }

    fn collect_value(&mut self, value: &Value) -> Result<(), FactoryError> {
        let class = class_of(value)?;
        match class {
            class::TYPE => {
                let payload: TypePayload = decode(value, class)?;
                for extended in &payload.extended_types {
                    self.collect_value(extended)?;
                }
                if let Some(properties) = &payload.properties {
                    self.collect_value(properties)?;
                }
                self.record(payload);
            }
            class::TYPE_REF => {}
            class::ARRAY_TYPE => {
                let payload: ArrayTypePayload = decode(value, class)?;
                self.collect_value(&payload.element_type)?;
            }
            class::UNION_TYPE => {
                let payload: UnionTypePayload = decode(value, class)?;
                self.collect_value(&payload.left)?;
                self.collect_value(&payload.right)?;
            }
            class::GENERIC_TYPE => {
                let payload: GenericTypePayload = decode(value, class)?;
                if let Some(bound) = &payload.bound {
                    self.collect_value(bound)?;
                }
            }
            class::SYMBOL_TABLE => {
                let payload: SymbolTablePayload = decode(value, class)?;
                for item in payload.references.iter().chain(&payload.functions) {
                    self.collect_value(item)?;
                }
            }
            class::VARIABLE_SYMBOL => {
                let payload: VariableSymbolPayload = decode(value, class)?;
                self.collect_value(&payload.ty)?;
            }
            class::FUNCTION_SYMBOL => {
                let payload: FunctionSymbolPayload = decode(value, class)?;
                self.collect_value(&payload.return_type)?;
                for parameter in &payload.parameters {
                    self.collect_value(parameter)?;
                }
            }
            other => {
                return Err(FactoryError::Malformed {
                    class: other.to_string(),
                    message: "not allowed inside a type registry".to_string(),
                });
            }
        }
        Ok(())
    }

    /// First definition wins, unless only a later one declares members.
    fn record(&mut self, payload: TypePayload) {
        if Type::native(&payload.name).is_some() {
            return;
        }
        match self.definitions.get(&payload.name) {
            Some(existing) if existing.properties.is_some() || payload.properties.is_none() => {}
            _ => {
                self.definitions.insert(payload.name.clone(), payload);
            }
        }
    }

    /// Pass 2: materialise types, then their members.
    pub(super) fn build(mut self) -> Result<TypeRegistry, FactoryError> {
        let names: Vec<String> = self.definitions.keys().cloned().collect();
        let mut registry = TypeRegistry::new();
        for name in names {
            let ty = self.materialize(&name)?;
            let properties = match self
                .definitions
                .get(&name)
                .and_then(|definition| definition.properties.clone())
            {
                Some(properties) => decode_symbol_table(&properties, &mut self)?,
                None => SymbolTable::new(),
            };
            registry.register(TypeDefinition::new(ty, properties));
        }
        debug!(types = registry.len(), "built type registry");
        Ok(registry)
    }

    fn materialize(&mut self, name: &str) -> Result<Type, FactoryError> {
        if let Some(native) = Type::native(name) {
            return Ok(native);
        }
        if let Some(ty) = self.built.get(name) {
            return Ok(ty.clone());
        }
        if self.visiting.iter().any(|visiting| visiting == name) {
            return Err(FactoryError::InheritanceCycle {
                name: name.to_string(),
            });
        }
        let Some(definition) = self.definitions.get(name).cloned() else {
            return Err(if self.definitions.is_empty() {
                FactoryError::EmptyRegistry {
                    name: name.to_string(),
                }
            } else {
                FactoryError::UnresolvedReference {
                    name: name.to_string(),
                }
            });
        };

        self.visiting.push(name.to_string());
        let mut extended = Vec::with_capacity(definition.extended_types.len());
        for value in &definition.extended_types {
            let supertype = decode_type(value, self)?;
            if !matches!(supertype, Type::Plain(_)) {
                return Err(FactoryError::Malformed {
                    class: class::TYPE.to_string(),
                    message: format!("'{}' extends non-nominal type '{}'", name, supertype),
                });
            }
            extended.push(supertype);
        }
        self.visiting.pop();

        let ty = Type::plain(name, extended);
        self.built.insert(name.to_string(), ty.clone());
        Ok(ty)
    }
}

impl TypeNames for RegistryBuilder {
    fn named(&mut self, name: &str) -> Result<Type, FactoryError> {
        self.materialize(name)
    }

    fn inline(&mut self, payload: TypePayload) -> Result<Type, FactoryError> {
        self.materialize(&payload.name)
    }
}
