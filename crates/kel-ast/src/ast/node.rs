//! Typed AST.
//!
//! Every [`Node`] carries the inferred evaluation type, the [`Scope`] active
//! where it was generated, its children in source order, and optionally the
//! type-narrowing facts deduced by it.
//!
//! # Child layout
//!
//! Node kinds carry only their own data. Sub-expressions live in `children`,
//! in this order:
//!
//! | kind                                        | children                             |
//! |---------------------------------------------|--------------------------------------|
//! | binary operators                            | `[left, right]`                      |
//! | `Negation`, `Not`                           | `[operand]`                          |
//! | `InstanceOf`, `TypeOf`                      | `[value, Type]`                      |
//! | `Cast`                                      | `[Type, value]`                      |
//! | `Path`                                      | `[object, property]`                 |
//! | `AccessByIndex`, `CollectionFilter`         | `[collection, predicate]`            |
//! | `Function`                                  | arguments                            |
//! | `For`, `Some`, `Every`                      | `[Variable, collection, body]`       |
//! | `If`                                        | `[condition, then, else?]`           |
//! | `ValueBlock`                                | `[Variable..., body]`                |
//! | `Variable` (in a value block)               | `[value]`                            |
//! | `InlineArray`, `InlineMap`                  | elements / values                    |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::foundation::{Scope, Span, Type};

/// Type-narrowing facts: reference text (`this`, `Policy.vehicle`) to the
/// narrowed type.
pub type TypeFacts = HashMap<String, Type>;

/// A typed AST node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Inferred evaluation type
    pub ty: Type,
    /// Scope active where this node was generated
    pub scope: Arc<Scope>,
    /// Sub-nodes in source order
    pub children: Vec<Node>,
    /// Narrowing facts that hold when this node evaluates to `true`
    pub facts: Option<TypeFacts>,
}

/// One variant per language construct.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Arithmetic
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulus,
    Exponent,
    Negation,

    // Logical
    Conjunction,
    Disjunction,
    Not,

    // Comparison
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    MoreThan,
    MoreThanOrEquals,

    // Collection / string
    In,
    Matches,

    // Type tests
    InstanceOf,
    TypeOf,
    Cast,
    /// Type written in source; `ty` is the resolved type
    Type { text: String },

    // Literals
    Decimal(f64),
    String(String),
    Boolean(bool),
    Null,
    Date(String),
    DateTime(String),
    InlineArray,
    InlineMap { keys: Vec<String> },

    // References
    This,
    Identifier { name: String },
    Path { null_safe: bool },
    AccessByIndex,
    CollectionFilter { explicit: bool },
    Function { name: String, arity: usize },

    // Iteration
    For { variable: String },
    Some { variable: String },
    Every { variable: String },

    // Control flow / bindings
    If,
    ValueBlock,
    Variable { name: String },

    // Recovery
    Empty,
    Error { text: String },
}

impl Node {
    pub fn new(kind: NodeKind, span: Span, ty: Type, scope: Arc<Scope>) -> Self {
        Self {
            kind,
            span,
            ty,
            scope,
            children: Vec::new(),
            facts: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_facts(mut self, facts: TypeFacts) -> Self {
        self.facts = (!facts.is_empty()).then_some(facts);
        self
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, NodeKind::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NodeKind::Error { .. })
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }
}

impl NodeKind {
    /// Upper-case construct name, e.g. `COLLECTION_FILTER`.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Addition => "ADDITION",
            NodeKind::Subtraction => "SUBTRACTION",
            NodeKind::Multiplication => "MULTIPLICATION",
            NodeKind::Division => "DIVISION",
            NodeKind::Modulus => "MODULUS",
            NodeKind::Exponent => "EXPONENT",
            NodeKind::Negation => "NEGATION",
            NodeKind::Conjunction => "CONJUNCTION",
            NodeKind::Disjunction => "DISJUNCTION",
            NodeKind::Not => "NOT",
            NodeKind::Equals => "EQUALS",
            NodeKind::NotEquals => "NOT_EQUALS",
            NodeKind::LessThan => "LESS_THAN",
            NodeKind::LessThanOrEquals => "LESS_THAN_OR_EQUALS",
            NodeKind::MoreThan => "MORE_THAN",
            NodeKind::MoreThanOrEquals => "MORE_THAN_OR_EQUALS",
            NodeKind::In => "IN",
            NodeKind::Matches => "MATCHES",
            NodeKind::InstanceOf => "INSTANCEOF",
            NodeKind::TypeOf => "TYPEOF",
            NodeKind::Cast => "CAST",
            NodeKind::Type { .. } => "TYPE",
            NodeKind::Decimal(_) => "DECIMAL",
            NodeKind::String(_) => "STRING",
            NodeKind::Boolean(_) => "BOOLEAN",
            NodeKind::Null => "NULL",
            NodeKind::Date(_) => "DATE",
            NodeKind::DateTime(_) => "DATETIME",
            NodeKind::InlineArray => "INLINE_ARRAY",
            NodeKind::InlineMap { .. } => "INLINE_MAP",
            NodeKind::This => "THIS",
            NodeKind::Identifier { .. } => "IDENTIFIER",
            NodeKind::Path { .. } => "PATH",
            NodeKind::AccessByIndex => "ACCESS_BY_INDEX",
            NodeKind::CollectionFilter { .. } => "COLLECTION_FILTER",
            NodeKind::Function { .. } => "FUNCTION",
            NodeKind::For { .. } => "FOR",
            NodeKind::Some { .. } => "SOME",
            NodeKind::Every { .. } => "EVERY",
            NodeKind::If => "IF",
            NodeKind::ValueBlock => "VALUE_BLOCK",
            NodeKind::Variable { .. } => "VARIABLE",
            NodeKind::Empty => "EMPTY",
            NodeKind::Error { .. } => "ERROR",
        }
    }

    /// Loop and filter constructs, which count towards nesting complexity.
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            NodeKind::For { .. }
                | NodeKind::Some { .. }
                | NodeKind::Every { .. }
                | NodeKind::CollectionFilter { .. }
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
