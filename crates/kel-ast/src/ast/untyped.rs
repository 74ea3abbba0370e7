//! Untyped syntax tree produced by the parser.
//!
//! [`Expr`] is pure syntax plus source locations. AST generation in
//! `kel-resolve` consumes it read-only and produces the typed
//! [`Node`](super::Node) tree.
//!
//! # Error Recovery
//!
//! The parser never gives up on an expression. Constructs that are missing a
//! required part get a zero-width [`ExprKind::Missing`] at the insertion point,
//! and tokens that make no sense where they appear become
//! [`ExprKind::Error`]. Both survive into the typed tree as `EMPTY` and
//! `ERROR` nodes so completion keeps working on half-typed input.
//!
//! # Examples
//!
//! ```rust
//! use kel_ast::ast::{BinaryOp, Expr, ExprKind};
//! use kel_ast::foundation::Span;
//!
//! let one = Expr::number(1.0, Span::new(0, 1));
//! let two = Expr::number(2.0, Span::new(4, 5));
//! let sum = Expr::binary(BinaryOp::Add, one, two);
//!
//! assert_eq!(sum.span, Span::new(0, 5));
//! assert!(matches!(sum.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
//! ```

use std::fmt;

use crate::foundation::Span;

/// Untyped expression from the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// A name together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// One `name to value` binding of a value block.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Ident,
    pub value: Expr,
}

/// One `key: value` entry of an inline map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Ident,
    pub value: Expr,
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Decimal literal: `1`, `2.5`
    Number(f64),
    /// String literal, unquoted
    String(String),
    Boolean(bool),
    Null,
    /// Date literal: `2020-01-01`
    Date(String),
    /// Date-time literal: `2020-01-01T10:00:00Z`
    DateTime(String),

    /// The current scope value
    This,

    /// Bare identifier: `Policy`
    Identifier(String),

    /// Member access: `object.property`, `object?.property`
    ///
    /// `property` is an identifier, a call, or `Missing` while typing.
    Path {
        object: Box<Expr>,
        property: Box<Expr>,
        null_safe: bool,
    },

    /// Bracket access: `collection[predicate]` or `collection?[predicate]`
    ///
    /// Without `?` the predicate's type decides between index and filter.
    Access {
        collection: Box<Expr>,
        predicate: Box<Expr>,
        explicit_filter: bool,
    },

    /// Function call: `Count(Policy.riskItems)`
    Call { name: Ident, args: Vec<Expr> },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `value instanceof Type`
    InstanceOf { value: Box<Expr>, ty: TypeExpr },

    /// `value typeof Type`
    TypeOf { value: Box<Expr>, ty: TypeExpr },

    /// `(Type) value`
    Cast { ty: TypeExpr, value: Box<Expr> },

    /// `if condition then a else b`
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },

    /// `for v in xs return body`, `some v in xs satisfies body`,
    /// `every v in xs satisfies body`
    Iteration {
        kind: IterationKind,
        variable: Ident,
        collection: Box<Expr>,
        body: Box<Expr>,
    },

    /// `set a to x, b to y return body`
    ValueBlock {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },

    /// `{1, 2, 3}`
    InlineArray(Vec<Expr>),

    /// `{limit: 10, name: 'x'}`
    InlineMap(Vec<MapEntry>),

    /// Absent but syntactically expected
    Missing,

    /// Unparseable token, with its text
    Error(String),
}

/// Iteration flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterationKind {
    For,
    Some,
    Every,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `not a`, `!a`
    Not,
    /// `-a`
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // Collection / string
    In,
    Matches,
}

/// Type written inside an expression: `Vehicle`, `Vehicle[]`, `A | B`, `<T>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    Named(String),
    Array(Box<TypeExpr>),
    Union(Box<TypeExpr>, Box<TypeExpr>),
    Generic {
        name: String,
        bound: Option<Box<TypeExpr>>,
    },
    Missing,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn number(value: f64, span: Span) -> Self {
        Self::new(ExprKind::Number(value), span)
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Identifier(name.into()), span)
    }

    /// Zero-width placeholder at `offset`.
    pub fn missing(offset: u32) -> Self {
        Self::new(ExprKind::Missing, Span::point(offset))
    }

    pub fn error(text: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Error(text.into()), span)
    }

    /// Binary expression spanning both operands.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let span = left.span.merge(&right.span);
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.kind, ExprKind::Missing)
    }

    /// Dotted source form of a reference chain (`this`, `a`, `a.b.c`).
    ///
    /// Type-narrowing facts are keyed by this text. Anything that is not a
    /// plain reference chain yields `None`.
    pub fn reference_key(&self) -> Option<String> {
        match &self.kind {
            ExprKind::This => Some("this".to_string()),
            ExprKind::Identifier(name) => Some(name.clone()),
            ExprKind::Path {
                object, property, ..
            } => {
                let object = object.reference_key()?;
                let property = property.reference_key()?;
                Some(format!("{object}.{property}"))
            }
            _ => None,
        }
    }
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl BinaryOp {
    /// Source symbol of this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
            Self::In => "in",
            Self::Matches => "matches",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod | Self::Pow
        )
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => f.write_str("not"),
            UnaryOp::Neg => f.write_str("-"),
        }
    }
}

impl fmt::Display for IterationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IterationKind::For => f.write_str("for"),
            IterationKind::Some => f.write_str("some"),
            IterationKind::Every => f.write_str("every"),
        }
    }
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Named(name) => f.write_str(name),
            TypeExprKind::Array(element) => match element.kind {
                TypeExprKind::Union(..) => write!(f, "({element})[]"),
                _ => write!(f, "{element}[]"),
            },
            TypeExprKind::Union(left, right) => write!(f, "{left} | {right}"),
            TypeExprKind::Generic { name, bound } => match bound {
                Some(bound) => write!(f, "<{name} extends {bound}>"),
                None => write!(f, "<{name}>"),
            },
            TypeExprKind::Missing => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_key() {
        let path = Expr::new(
            ExprKind::Path {
                object: Box::new(Expr::identifier("Policy", Span::new(0, 6))),
                property: Box::new(Expr::identifier("vehicle", Span::new(7, 14))),
                null_safe: false,
            },
            Span::new(0, 14),
        );
        assert_eq!(path.reference_key().as_deref(), Some("Policy.vehicle"));
        assert_eq!(Expr::number(1.0, Span::default()).reference_key(), None);
    }

    #[test]
    fn test_type_expr_display() {
        let named = |name: &str| TypeExpr::new(TypeExprKind::Named(name.into()), Span::default());
        let union = TypeExpr::new(
            TypeExprKind::Union(Box::new(named("A")), Box::new(named("B"))),
            Span::default(),
        );
        let array = TypeExpr::new(TypeExprKind::Array(Box::new(union)), Span::default());
        assert_eq!(array.to_string(), "(A | B)[]");
    }
}
