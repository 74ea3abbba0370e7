// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Semantic core for KEL expressions
//!
//! This crate turns parsed expressions into typed ASTs, validates them, and
//! answers cursor-position queries:
//!
//! ```text
//! Expr ──generate──▶ Node ──validate──▶ Vec<Diagnostic>
//!                      └──complete / info_at──▶ editor services
//! ```
//!
//! The type registry and scope graph consumed by generation are built once
//! by [`factory`] from serialised payloads.

pub mod error;
pub mod resolve;

pub use error::{Diagnostic, DiagnosticKind, FactoryError, GenerationError, Severity};
pub use resolve::*;
