//! Errors raised by the foundation layer.
//!
//! These are precondition violations, not semantic findings: a scope graph
//! that cannot answer a lookup at all. Semantic diagnostics live in
//! `kel-resolve`.

use thiserror::Error;

/// Scope lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Function overloads cannot be known without a concrete global type.
    #[error("cannot resolve function {name}/{arity}: global scope '{scope}' is dynamic")]
    DynamicGlobalFunctionLookup {
        scope: String,
        name: String,
        arity: usize,
    },
}
