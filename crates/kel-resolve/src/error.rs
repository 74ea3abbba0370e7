//! Diagnostics and setup errors.
//!
//! Two classes of problem exist:
//!
//! - **Setup failures** ([`FactoryError`], [`GenerationError`]) are returned
//!   through `Result` and abort the operation. They mean the external input
//!   (type registry payload, scope graph) is malformed.
//! - **Semantic findings** ([`Diagnostic`]) are accumulated while a pass keeps
//!   walking, so one expression can surface several independent problems.
//!
//! # Examples
//!
//! ```
//! # use kel_resolve::error::*;
//! # use kel_ast::{NodeKind, Span};
//! let diagnostic = Diagnostic::error(
//!     DiagnosticKind::UnresolvedReference,
//!     Span::new(0, 6),
//!     NodeKind::Identifier { name: "Policu".into() },
//!     "unresolved reference 'Policu'",
//! )
//! .with_note("references are resolved against the enclosing scopes");
//! assert_eq!(diagnostic.to_string(), "error[KEL101]: unresolved reference 'Policu'");
//! ```

use std::fmt;

use kel_ast::{NodeKind, ScopeError, Span};
use thiserror::Error;

/// Semantic finding about a typed AST node.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Category of this finding
    pub kind: DiagnosticKind,
    /// Severity level
    pub severity: Severity,
    /// Source range of the offending node
    pub span: Option<Span>,
    /// Primary message
    pub message: String,
    /// Additional notes or hints
    pub notes: Vec<String>,
    /// Kind of the offending node
    pub node: NodeKind,
}

/// Category of a semantic finding.
///
/// # Invariant
///
/// The discriminant values must match the DIAGNOSTIC_KINDS array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DiagnosticKind {
    /// Absent or unrecognised syntax (`EMPTY` / `ERROR` nodes)
    Syntax = 0,
    /// Identifier not visible in any enclosing scope
    UnresolvedReference = 1,
    /// No function with this name and argument count
    UnresolvedFunction = 2,
    /// Operand or argument of the wrong type
    TypeMismatch = 3,
    /// Ordering operator on incomparable operands
    NotComparable = 4,
    /// Collection operator on a non-collection
    NotCollection = 5,
    /// Negative or fractional literal index
    InvalidIndex = 6,
    /// Branches or elements without a common type
    NoCommonType = 7,
    /// Type name that does not resolve
    UnknownType = 8,
    /// Cast to a type that cannot be a cast target
    InvalidCast = 9,
    /// Cast that can never fail
    RedundantCast = 10,
    /// Cast between unrelated types
    SuspiciousCast = 11,
    /// Loops and filters nested beyond the configured limit
    Complexity = 12,
    /// Binding that hides a name already in scope
    Shadowing = 13,
}

/// Code and human-readable name per kind.
///
/// Index matches DiagnosticKind discriminant.
const DIAGNOSTIC_KINDS: &[(&str, &str)] = &[
    ("KEL001", "syntax error"),               // 0: Syntax
    ("KEL101", "unresolved reference"),       // 1: UnresolvedReference
    ("KEL102", "unresolved function"),        // 2: UnresolvedFunction
    ("KEL201", "type mismatch"),              // 3: TypeMismatch
    ("KEL202", "not comparable"),             // 4: NotComparable
    ("KEL203", "not a collection"),           // 5: NotCollection
    ("KEL204", "invalid index"),              // 6: InvalidIndex
    ("KEL205", "no common type"),             // 7: NoCommonType
    ("KEL301", "unknown type"),               // 8: UnknownType
    ("KEL302", "invalid cast"),               // 9: InvalidCast
    ("KEL303", "redundant cast"),             // 10: RedundantCast
    ("KEL304", "suspicious cast"),            // 11: SuspiciousCast
    ("KEL401", "excessive complexity"),       // 12: Complexity
    ("KEL402", "shadowed variable"),          // 13: Shadowing
];

impl DiagnosticKind {
    /// Stable code, e.g. `KEL101`.
    pub fn code(self) -> &'static str {
        DIAGNOSTIC_KINDS[self as usize].0
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        DIAGNOSTIC_KINDS[self as usize].1
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational (e.g. a cast that does nothing)
    Info,
    /// Valid but suspicious
    Warning,
    /// Invalid expression
    Error,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(
        kind: DiagnosticKind,
        span: Span,
        node: NodeKind,
        message: impl Into<String>,
    ) -> Self {
        Self::with_severity(kind, Severity::Error, span, node, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(
        kind: DiagnosticKind,
        span: Span,
        node: NodeKind,
        message: impl Into<String>,
    ) -> Self {
        Self::with_severity(kind, Severity::Warning, span, node, message)
    }

    /// Creates a new informational diagnostic.
    pub fn info(
        kind: DiagnosticKind,
        span: Span,
        node: NodeKind,
        message: impl Into<String>,
    ) -> Self {
        Self::with_severity(kind, Severity::Info, span, node, message)
    }

    fn with_severity(
        kind: DiagnosticKind,
        severity: Severity,
        span: Span,
        node: NodeKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            span: Some(span),
            message: message.into(),
            notes: Vec::new(),
            node,
        }
    }

    /// Adds a note or hint.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.kind.code(), self.message)
    }
}

/// Failure to rebuild the type registry or scope graph from a payload.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Discriminant with no registered factory.
    #[error("no factory for payload class '{class}'")]
    MissingFactory { class: String },

    /// A reference was resolved before any type was registered.
    #[error("cannot resolve type reference '{name}': the type registry is empty")]
    EmptyRegistry { name: String },

    /// A reference names a type that is not in the registry.
    #[error("unresolved type reference '{name}'")]
    UnresolvedReference { name: String },

    /// A type (transitively) extends itself.
    #[error("inheritance cycle through type '{name}'")]
    InheritanceCycle { name: String },

    /// A payload node is structurally invalid for its class.
    #[error("malformed '{class}' payload: {message}")]
    Malformed { class: String, message: String },

    /// The payload is not JSON.
    #[error("invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Impossible precondition hit while generating a typed AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
}
