//! Typed tree walking utilities.
//!
//! A single closure-driven pre-order walk shared by the validator, the
//! location services and the tests, instead of a visitor trait.
//!
//! # Examples
//!
//! ```rust,ignore
//! use kel_ast::ast::{walk_node, NodeKind};
//!
//! // Count function calls
//! let mut calls = 0;
//! walk_node(&root, &mut |node| {
//!     if matches!(node.kind, NodeKind::Function { .. }) {
//!         calls += 1;
//!     }
//! });
//! ```

use super::Node;

/// Walk a typed tree in pre-order, calling `visitor` for each node.
///
/// Children are visited left to right, which is source order.
pub fn walk_node<V>(node: &Node, visitor: &mut V)
where
    V: FnMut(&Node),
{
    visitor(node);
    for child in &node.children {
        walk_node(child, visitor);
    }
}

/// Walk a typed tree in pre-order, also passing each node's ancestors
/// (outermost first).
pub fn walk_node_with_ancestors<'a, V>(node: &'a Node, visitor: &mut V)
where
    V: FnMut(&'a Node, &[&'a Node]),
{
    let mut ancestors = Vec::new();
    walk_inner(node, &mut ancestors, visitor);
}

fn walk_inner<'a, V>(node: &'a Node, ancestors: &mut Vec<&'a Node>, visitor: &mut V)
where
    V: FnMut(&'a Node, &[&'a Node]),
{
    visitor(node, ancestors);
    ancestors.push(node);
    for child in &node.children {
        walk_inner(child, ancestors, visitor);
    }
    ancestors.pop();
}
