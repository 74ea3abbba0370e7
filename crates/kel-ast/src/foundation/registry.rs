//! Registry of named types and their members.
//!
//! The registry is built once (usually by the deserialisation factory in
//! `kel-resolve`) and then shared read-only, behind an `Arc`, by every scope
//! and every compilation.

use indexmap::IndexMap;

use super::symbols::{FunctionSymbol, SymbolTable, VariableSymbol};
use super::types::Type;

/// A named type together with its members.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub ty: Type,
    pub properties: SymbolTable,
}

/// Name-indexed registry of type definitions.
///
/// Native primitives are always present.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDefinition>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDefinition {
    pub fn new(ty: Type, properties: SymbolTable) -> Self {
        Self { ty, properties }
    }
}

impl TypeRegistry {
    /// Create a registry containing only the native primitives.
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        for ty in Type::natives() {
            types.insert(ty.name(), TypeDefinition::new(ty, SymbolTable::new()));
        }
        Self { types }
    }

    /// Register a definition under its type's name, replacing any previous one.
    pub fn register(&mut self, definition: TypeDefinition) {
        self.types.insert(definition.ty.name(), definition);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Resolve a type name, including the `Any`/`Unknown` sentinels.
    pub fn resolve_type(&self, name: &str) -> Option<Type> {
        self.types
            .get(name)
            .map(|definition| definition.ty.clone())
            .or_else(|| Type::native(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Member table of a plain type: inline for synthetic types, otherwise
    /// looked up by name.
    fn plain_members<'a>(&'a self, ty: &'a Type) -> &'a SymbolTable {
        if let Some(members) = ty.inline_members() {
            return members;
        }
        match ty {
            Type::Plain(plain) => self
                .types
                .get(plain.name())
                .map(|definition| &definition.properties)
                .unwrap_or_else(|| SymbolTable::empty()),
            _ => SymbolTable::empty(),
        }
    }

    /// Find a reference visible through `ty`.
    ///
    /// Unions search the left member first; bounded generics search their
    /// bound. Arrays and sentinels expose nothing.
    pub fn find_reference<'a>(&'a self, ty: &'a Type, name: &str) -> Option<&'a VariableSymbol> {
        match ty {
            Type::Plain(_) => self.plain_members(ty).reference(name),
            Type::Union(left, right) => self
                .find_reference(left, name)
                .or_else(|| self.find_reference(right, name)),
            Type::Generic(generic) => generic
                .bound()
                .and_then(|bound| self.find_reference(bound, name)),
            _ => None,
        }
    }

    /// Find a function visible through `ty` by name and arity.
    pub fn find_function<'a>(
        &'a self,
        ty: &'a Type,
        name: &str,
        arity: usize,
    ) -> Option<&'a FunctionSymbol> {
        match ty {
            Type::Plain(_) => self.plain_members(ty).function(name, arity),
            Type::Union(left, right) => self
                .find_function(left, name, arity)
                .or_else(|| self.find_function(right, name, arity)),
            Type::Generic(generic) => generic
                .bound()
                .and_then(|bound| self.find_function(bound, name, arity)),
            _ => None,
        }
    }

    /// All references visible through `ty`, deduplicated by name (left wins).
    pub fn references_of<'a>(&'a self, ty: &'a Type) -> Vec<&'a VariableSymbol> {
        let mut result: Vec<&VariableSymbol> = Vec::new();
        self.collect_references(ty, &mut result);
        result
    }

    fn collect_references<'a>(&'a self, ty: &'a Type, out: &mut Vec<&'a VariableSymbol>) {
        match ty {
            Type::Plain(_) => {
                for reference in self.plain_members(ty).references() {
                    if !out.iter().any(|existing| existing.name == reference.name) {
                        out.push(reference);
                    }
                }
            }
            Type::Union(left, right) => {
                self.collect_references(left, out);
                self.collect_references(right, out);
            }
            Type::Generic(generic) => {
                if let Some(bound) = generic.bound() {
                    self.collect_references(bound, out);
                }
            }
            _ => {}
        }
    }

    /// All functions visible through `ty`, deduplicated by name and arity.
    pub fn functions_of<'a>(&'a self, ty: &'a Type) -> Vec<&'a FunctionSymbol> {
        let mut result: Vec<&FunctionSymbol> = Vec::new();
        self.collect_functions(ty, &mut result);
        result
    }

    fn collect_functions<'a>(&'a self, ty: &'a Type, out: &mut Vec<&'a FunctionSymbol>) {
        match ty {
            Type::Plain(_) => {
                for function in self.plain_members(ty).functions() {
                    if !out
                        .iter()
                        .any(|f| f.name == function.name && f.arity() == function.arity())
                    {
                        out.push(function);
                    }
                }
            }
            Type::Union(left, right) => {
                self.collect_functions(left, out);
                self.collect_functions(right, out);
            }
            Type::Generic(generic) => {
                if let Some(bound) = generic.bound() {
                    self.collect_functions(bound, out);
                }
            }
            _ => {}
        }
    }
}
