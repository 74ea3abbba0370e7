// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! AST types for KEL
//!
//! This crate contains the type model, scopes and symbol tables, the untyped
//! syntax tree produced by the parser, and the typed AST produced by
//! generation in `kel-resolve`.

pub mod ast;
pub mod error;
pub mod foundation;

// Re-export commonly used types
pub use error::ScopeError;
pub use foundation::{
    FunctionSymbol, Scope, ScopeType, SourceText, Span, SymbolTable, Type, TypeDefinition,
    TypeRegistry, VariableSymbol,
};

pub use ast::*;
