//! Semantic validation of typed KEL expressions.
//!
//! A second walk over the typed AST produced by generation. Every node is
//! checked against the rules of its kind and findings accumulate as
//! [`Diagnostic`]s; the walk never stops early.
//!
//! # What This Pass Checks
//!
//! 1. **Syntax leftovers** - `EMPTY` and `ERROR` nodes from parser recovery
//! 2. **Resolution** - identifiers and functions must resolve, with a
//!    nearest-name suggestion when they do not
//! 3. **Operands** - arithmetic, logical, comparison, equality, `in` and
//!    `matches` operand types
//! 4. **Collections** - indexing, filters and iterations need a collection;
//!    literal indexes must be whole and non-negative
//! 5. **Casts and type tests** - target types must resolve and be castable
//! 6. **Structure** - `if` branches and inline arrays need a common type,
//!    `set` bindings must not shadow
//! 7. **Complexity** - loops and filters nested beyond a limit
//!
//! Operands typed `Unknown` already failed somewhere below; they are skipped
//! so a single mistake surfaces once.
//!
//! # Examples
//!
//! ```rust,ignore
//! use kel_resolve::validation::{validate, ValidationOptions};
//!
//! let diagnostics = validate(&node, &ValidationOptions::default());
//! for diagnostic in diagnostics.iter().filter(|d| d.is_error()) {
//!     eprintln!("{diagnostic}");
//! }
//! ```

mod rules;
mod suggest;

use tracing::debug;

use kel_ast::{Node, NodeKind};

use crate::error::{Diagnostic, DiagnosticKind};

/// Default limit on nested loops and filters.
pub const DEFAULT_COMPLEXITY_LIMIT: usize = 3;

/// Validator policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Deepest allowed nesting of loop bodies and filter predicates
    pub complexity_limit: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            complexity_limit: DEFAULT_COMPLEXITY_LIMIT,
        }
    }
}

/// Validate a typed AST, returning diagnostics in source order.
pub fn validate(node: &Node, options: &ValidationOptions) -> Vec<Diagnostic> {
    let mut validator = Validator {
        options,
        diagnostics: Vec::new(),
        complexity_reported: false,
    };
    validator.visit(node, 0, false);
    debug!(
        diagnostics = validator.diagnostics.len(),
        errors = validator.diagnostics.iter().filter(|d| d.is_error()).count(),
        "validated expression"
    );
    validator.diagnostics
}

struct Validator<'a> {
    options: &'a ValidationOptions,
    diagnostics: Vec<Diagnostic>,
    complexity_reported: bool,
}

impl Validator<'_> {
    /// `depth` counts enclosing loop bodies and filter predicates.
    /// `unresolvable` marks a path property whose receiver is `Unknown`.
    fn visit(&mut self, node: &Node, depth: usize, unresolvable: bool) {
        if node.kind.is_loop() {
            self.check_complexity(node, depth + 1);
        }

        if !unresolvable {
            rules::check_resolution(node, &mut self.diagnostics);
        }
        rules::check_node(node, &mut self.diagnostics);

        for (index, child) in node.children.iter().enumerate() {
            let child_depth = if nests_deeper(&node.kind, index) {
                depth + 1
            } else {
                depth
            };
            let child_unresolvable = matches!(node.kind, NodeKind::Path { .. })
                && index == 1
                && node.children[0].ty.is_unknown();
            self.visit(child, child_depth, child_unresolvable);
        }
    }

    fn check_complexity(&mut self, node: &Node, level: usize) {
        if self.complexity_reported || level <= self.options.complexity_limit {
            return;
        }
        self.complexity_reported = true;
        self.diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::Complexity,
                node.span,
                node.kind.clone(),
                format!(
                    "expression nests {} loops or filters; the limit is {}",
                    level, self.options.complexity_limit
                ),
            )
            .with_note("split the expression or move inner loops into a function"),
        );
    }
}

/// Filter predicates and iteration bodies are evaluated once per element.
fn nests_deeper(kind: &NodeKind, child_index: usize) -> bool {
    match kind {
        NodeKind::CollectionFilter { .. } => child_index == 1,
        NodeKind::For { .. } | NodeKind::Some { .. } | NodeKind::Every { .. } => child_index == 2,
        _ => false,
    }
}
