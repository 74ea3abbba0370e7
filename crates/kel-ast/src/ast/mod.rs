// Syntax trees: the untyped parser output and the typed AST built from it.

mod node;
pub mod untyped;
pub mod walk;

pub use node::*;
pub use untyped::{
    BinaryOp, Binding, Expr, ExprKind, Ident, IterationKind, MapEntry, TypeExpr, TypeExprKind,
    UnaryOp,
};
pub use walk::{walk_node, walk_node_with_ancestors};
