//! Semantic passes over KEL expressions.
//!
//! # Pipeline Position
//!
//! ```text
//! payloads ──factory──▶ TypeRegistry + Scope
//!                             │
//! Parse ─────────▶ generation ─▶ validation
//!                             └─▶ location
//! ```

pub mod factory;
pub mod generation;
pub mod library;
pub mod location;
pub mod validation;

pub use factory::{registry_from_str, registry_from_value, scope_from_str, scope_from_value};
pub use generation::generate;
pub use library::FunctionLibrary;
pub use location::{
    CompletionItem, CompletionKind, LocationInfo, complete, info_at_location, node_at,
};
pub use validation::{DEFAULT_COMPLEXITY_LIMIT, ValidationOptions, validate};
