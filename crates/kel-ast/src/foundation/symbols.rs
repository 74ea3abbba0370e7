//! Symbols visible through a type.
//!
//! A [`SymbolTable`] holds named references (unique by name) and an ordered
//! overload set of functions (unique by name and parameter count).

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;

use super::types::{GenericRewrites, Type, merge_rewrite};

/// A named reference (field, variable, context root).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: Type,
}

/// A function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSymbol {
    pub name: String,
    /// Declared return type; may mention generics bound by the parameters.
    pub return_type: Type,
    pub parameters: Vec<FunctionParameter>,
}

/// A positional function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub index: usize,
    pub ty: Type,
}

/// Named references plus function overloads.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    references: IndexMap<String, VariableSymbol>,
    functions: Vec<FunctionSymbol>,
}

static EMPTY_TABLE: LazyLock<SymbolTable> = LazyLock::new(SymbolTable::default);

impl VariableSymbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl FunctionSymbol {
    pub fn new(name: impl Into<String>, return_type: Type, parameter_types: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters: parameter_types
                .into_iter()
                .enumerate()
                .map(|(index, ty)| FunctionParameter { index, ty })
                .collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_generic(&self) -> bool {
        self.return_type.contains_generic()
            || self.parameters.iter().any(|param| param.ty.contains_generic())
    }

    /// Bind the generics in this signature from concrete argument types.
    pub fn generic_rewrites(&self, argument_types: &[Type]) -> GenericRewrites {
        let mut rewrites = GenericRewrites::new();
        for (param, argument) in self.parameters.iter().zip(argument_types) {
            for (name, ty) in param.ty.resolve_generic_type_rewrites(argument) {
                merge_rewrite(&mut rewrites, &name, ty);
            }
        }
        rewrites
    }

    /// Return type at a call site with the given argument types.
    ///
    /// Generics left unbound by the arguments fall back to their bound.
    pub fn resolve_return_type(&self, argument_types: &[Type]) -> Type {
        if !self.return_type.contains_generic() {
            return self.return_type.clone();
        }
        let rewrites = self.generic_rewrites(argument_types);
        self.return_type
            .rewrite_generic_types(&rewrites)
            .rewrite_generic_bounds()
    }
}

impl fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, param) in self.parameters.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.ty)?;
        }
        write!(f, "): {}", self.return_type)
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared empty table for leaf types with no members.
    pub fn empty() -> &'static SymbolTable {
        &EMPTY_TABLE
    }

    pub fn with_references(references: impl IntoIterator<Item = VariableSymbol>) -> Self {
        let mut table = Self::new();
        for reference in references {
            table.add_reference(reference);
        }
        table
    }

    /// Add a reference, replacing any previous one with the same name.
    pub fn add_reference(&mut self, reference: VariableSymbol) {
        self.references.insert(reference.name.clone(), reference);
    }

    /// Add a function, replacing any previous overload with the same name and arity.
    pub fn add_function(&mut self, function: FunctionSymbol) {
        match self
            .functions
            .iter_mut()
            .find(|f| f.name == function.name && f.arity() == function.arity())
        {
            Some(existing) => *existing = function,
            None => self.functions.push(function),
        }
    }

    pub fn reference(&self, name: &str) -> Option<&VariableSymbol> {
        self.references.get(name)
    }

    pub fn has_reference(&self, name: &str) -> bool {
        self.references.contains_key(name)
    }

    pub fn function(&self, name: &str, arity: usize) -> Option<&FunctionSymbol> {
        self.functions
            .iter()
            .find(|f| f.name == name && f.arity() == arity)
    }

    /// All overloads sharing `name`.
    pub fn overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FunctionSymbol> {
        self.functions.iter().filter(move |f| f.name == name)
    }

    pub fn references(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.references.values()
    }

    pub fn functions(&self) -> &[FunctionSymbol] {
        &self.functions
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.functions.is_empty()
    }
}
