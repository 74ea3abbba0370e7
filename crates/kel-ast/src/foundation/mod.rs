//! Foundation types
//!
//! The type model, symbol tables, the type registry and the scope chain.
//! Everything here is immutable once built and shared by reference across
//! compilations.

pub mod registry;
pub mod scope;
pub mod span;
pub mod symbols;
pub mod types;

pub use registry::{TypeDefinition, TypeRegistry};
pub use scope::{Scope, ScopeType};
pub use span::{SourceText, Span};
pub use symbols::{FunctionParameter, FunctionSymbol, SymbolTable, VariableSymbol};
pub use types::{GenericRewrites, GenericType, PlainType, Type, merge_rewrite, native};
