// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # KEL
//!
//! Semantic services for the KEL expression language.
//!
//! This crate is a facade that re-exports functionality from:
//! - `kel-ast` - type model, scopes, syntax trees
//! - `kel-lexer` - tokenization
//! - `kel-parser` - error-recovering parser
//! - `kel-resolve` - typed AST generation, validation, editor queries
//!
//! and adds [`KelService`], the entry point callers use:
//!
//! ```text
//! kel-ast
//!     ↓
//! kel-lexer → kel-parser
//!                 ↓
//!           kel-resolve
//!                 ↓
//!     kel (facade) - KelService + cache + config
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kel::{KelService, ServiceConfig};
//!
//! let service = KelService::from_payloads(&registry_json, &scope_json, ServiceConfig::default())?;
//! for diagnostic in service.provide_validation("Policy.riskItems[included]")? {
//!     println!("{diagnostic}");
//! }
//! ```

// Re-export AST and foundation types
pub use kel_ast::{self as ast, *};

// Re-export lexer
pub use kel_lexer as lexer;
pub use kel_lexer::Token;

// Re-export parser
pub use kel_parser as parser;
pub use kel_parser::{ParseError, parse};

// Re-export resolve
pub use kel_resolve as resolve;
pub use kel_resolve::*;

pub mod cache;
pub mod config;
pub mod error;
pub mod report;
pub mod service;

pub use cache::{CompiledExpression, ExpressionCache};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use report::DiagnosticFormatter;
pub use service::KelService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
