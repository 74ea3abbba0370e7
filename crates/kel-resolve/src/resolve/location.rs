//! Cursor-position queries over a typed AST.
//!
//! Both queries start by finding the deepest node whose span contains the
//! cursor. Span ends are inclusive for this purpose, so a cursor right after
//! `Policy.` lands on the empty property node inside the path scope.
//!
//! - [`complete`] lists the references, functions and keywords visible from
//!   that node's scope, ranked by distance up the scope chain.
//! - [`info_at_location`] reports the node's type, or the function for calls.

use std::collections::HashSet;
use std::fmt;

use kel_ast::{Node, NodeKind, ScopeType, Span, Type, walk_node_with_ancestors};
use serde::Serialize;

/// What a completion inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Function,
    Reference,
    Keyword,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionItem {
    pub kind: CompletionKind,
    pub text: String,
    /// Type of a reference, signature of a function, empty for keywords
    pub detail: String,
    /// Distance up the scope chain; lower ranks first
    pub rank: usize,
}

/// Hover result.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInfo {
    Type {
        ty: Type,
        span: Span,
    },
    Function {
        name: String,
        parameter_count: usize,
        span: Span,
    },
}

const KEYWORDS: &[&str] = &[
    "this", "true", "false", "null", "not", "if", "for", "some", "every", "set",
];

const FILTER_KEYWORDS: &[&str] = &["instanceof", "typeof"];

/// Deepest node whose span contains `cursor`.
pub fn node_at(root: &Node, cursor: u32) -> Option<&Node> {
    if !root.span.contains(cursor) {
        return None;
    }
    let mut current = root;
    while let Some(child) = current
        .children
        .iter()
        .find(|child| child.span.contains(cursor))
    {
        current = child;
    }
    Some(current)
}

/// Node a completion at `cursor` applies to.
///
/// Falls back to the deepest node ending before the cursor, which covers a
/// cursor placed past trailing input.
fn completion_target(root: &Node, cursor: u32) -> Option<&Node> {
    if let Some(node) = node_at(root, cursor) {
        return Some(node);
    }
    let mut best: Option<&Node> = None;
    walk_node_with_ancestors(root, &mut |node, _| {
        if node.span.end <= cursor && best.is_none_or(|current| node.span.end >= current.span.end)
        {
            best = Some(node);
        }
    });
    best
}

/// Completion items for a cursor inside `root`, most relevant first.
pub fn complete(root: &Node, cursor: u32) -> Vec<CompletionItem> {
    let Some(node) = completion_target(root, cursor) else {
        return Vec::new();
    };

    let scope = &node.scope;
    let registry = scope.all_types();
    let mut items = Vec::new();
    let mut seen_references: HashSet<&str> = HashSet::new();
    let mut seen_functions: HashSet<(&str, usize)> = HashSet::new();

    for (rank, enclosing) in scope.chain().enumerate() {
        for reference in registry.references_of(enclosing.ty()) {
            if seen_references.insert(reference.name.as_str()) {
                items.push(CompletionItem {
                    kind: CompletionKind::Reference,
                    text: reference.name.clone(),
                    detail: reference.ty.to_string(),
                    rank,
                });
            }
        }
        for function in registry.functions_of(enclosing.ty()) {
            if seen_functions.insert((function.name.as_str(), function.arity())) {
                items.push(CompletionItem {
                    kind: CompletionKind::Function,
                    text: function.name.clone(),
                    detail: function.to_string(),
                    rank,
                });
            }
        }
    }

    let keyword_rank = scope.chain().count();
    items.extend(keywords(scope.scope_type()).map(|keyword| CompletionItem {
        kind: CompletionKind::Keyword,
        text: keyword.to_string(),
        detail: String::new(),
        rank: keyword_rank,
    }));
    items
}

fn keywords(scope_type: ScopeType) -> impl Iterator<Item = &'static str> {
    let (base, extra): (&[&str], &[&str]) = match scope_type {
        ScopeType::Path => (&[], &[]),
        ScopeType::Filter => (KEYWORDS, FILTER_KEYWORDS),
        _ => (KEYWORDS, &[]),
    };
    base.iter().chain(extra).copied()
}

/// Type or function under the cursor.
///
/// Type nodes inside casts and type tests report nothing; the enclosing
/// expression already describes them.
pub fn info_at_location(root: &Node, cursor: u32) -> Option<LocationInfo> {
    let node = node_at(root, cursor)?;
    match &node.kind {
        NodeKind::Type { .. } => None,
        NodeKind::Function { name, arity } => Some(LocationInfo::Function {
            name: name.clone(),
            parameter_count: *arity,
            span: node.span,
        }),
        _ => Some(LocationInfo::Type {
            ty: node.ty.clone(),
            span: node.span,
        }),
    }
}

impl fmt::Display for CompletionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionKind::Function => f.write_str("function"),
            CompletionKind::Reference => f.write_str("reference"),
            CompletionKind::Keyword => f.write_str("keyword"),
        }
    }
}

impl fmt::Display for LocationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationInfo::Type { ty, .. } => write!(f, "{ty}"),
            LocationInfo::Function {
                name,
                parameter_count,
                ..
            } => write!(f, "{name}/{parameter_count}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use kel_ast::{Scope, SymbolTable, TypeRegistry, VariableSymbol};

    fn leaf(kind: NodeKind, start: u32, end: u32, scope: &Arc<kel_ast::Scope>) -> Node {
        Node::new(kind, Span::new(start, end), Type::number(), Arc::clone(scope))
    }

    #[test]
    fn test_node_at_prefers_deepest() {
        let registry = Arc::new(TypeRegistry::new());
        let scope = Scope::root("global", ScopeType::Global, Type::Any, registry);
        let root = leaf(NodeKind::Addition, 0, 5, &scope).with_children(vec![
            leaf(NodeKind::Decimal(1.0), 0, 1, &scope),
            leaf(NodeKind::Decimal(2.0), 4, 5, &scope),
        ]);
        assert_eq!(node_at(&root, 5).map(|n| &n.kind), Some(&NodeKind::Decimal(2.0)));
        assert_eq!(node_at(&root, 2).map(|n| &n.kind), Some(&NodeKind::Addition));
        assert!(node_at(&root, 6).is_none());
        assert_eq!(
            completion_target(&root, 7).map(|n| &n.kind),
            Some(&NodeKind::Decimal(2.0))
        );
    }

    #[test]
    fn test_keywords_by_scope() {
        assert_eq!(keywords(ScopeType::Path).count(), 0);
        assert!(keywords(ScopeType::Filter).any(|k| k == "instanceof"));
        assert!(!keywords(ScopeType::Local).any(|k| k == "typeof"));
    }

    #[test]
    fn test_nearest_scope_wins() {
        let global = Scope::root(
            "global",
            ScopeType::Global,
            Type::synthetic(
                "Globals",
                SymbolTable::with_references([
                    VariableSymbol::new("x", Type::string()),
                    VariableSymbol::new("y", Type::string()),
                ]),
            ),
            Arc::new(TypeRegistry::new()),
        );
        let local = global.child(
            "v",
            ScopeType::VariablesMap,
            Type::synthetic(
                "{x: Number}",
                SymbolTable::with_references([VariableSymbol::new("x", Type::number())]),
            ),
        );
        let root = leaf(NodeKind::Identifier { name: "x".into() }, 0, 1, &local);

        let items = complete(&root, 1);
        let x: Vec<_> = items.iter().filter(|item| item.text == "x").collect();
        assert_eq!(x.len(), 1);
        assert_eq!((x[0].rank, x[0].detail.as_str()), (0, "Number"));
        let y = items.iter().find(|item| item.text == "y").unwrap();
        assert_eq!(y.rank, 1);
        assert!(items.last().is_some_and(|item| item.kind == CompletionKind::Keyword));
    }
}
