//! Lexical scope chain.
//!
//! A [`Scope`] pairs a type (whose members are what is visible at that point)
//! with a parent link. Scopes are created while walking an expression: entering
//! the right-hand side of a path, a filter predicate, an iteration body or a
//! `set ... to` binding pushes a child scope, and leaving it drops the child.
//!
//! # Dynamic scopes
//!
//! A scope whose type is [`Type::Any`] is *dynamic*: any name resolves in it,
//! to a synthetic `Any`-typed symbol, unless a static ancestor actually
//! declares that name (in which case the declared symbol wins).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ast::untyped::{TypeExpr, TypeExprKind};
use crate::error::ScopeError;

use super::registry::TypeRegistry;
use super::symbols::{FunctionSymbol, VariableSymbol};
use super::types::Type;

/// What syntactic construct introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    Global,
    Local,
    Path,
    Filter,
    VariablesMap,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Global => "GLOBAL",
            ScopeType::Local => "LOCAL",
            ScopeType::Path => "PATH",
            ScopeType::Filter => "FILTER",
            ScopeType::VariablesMap => "VARIABLES_MAP",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in a parent-linked scope chain.
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    scope_type: ScopeType,
    ty: Type,
    all_types: Arc<TypeRegistry>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// Create a root scope.
    pub fn root(
        name: impl Into<String>,
        scope_type: ScopeType,
        ty: Type,
        all_types: Arc<TypeRegistry>,
    ) -> Arc<Scope> {
        Arc::new(Scope {
            name: name.into(),
            scope_type,
            ty,
            all_types,
            parent: None,
        })
    }

    /// Create a child scope sharing this scope's registry.
    pub fn child(
        self: &Arc<Self>,
        name: impl Into<String>,
        scope_type: ScopeType,
        ty: Type,
    ) -> Arc<Scope> {
        Arc::new(Scope {
            name: name.into(),
            scope_type,
            ty,
            all_types: Arc::clone(&self.all_types),
            parent: Some(Arc::clone(self)),
        })
    }

    /// Rebuild this chain with `root` attached above its outermost scope.
    pub fn rebase(self: &Arc<Self>, root: Arc<Scope>) -> Arc<Scope> {
        let parent = match &self.parent {
            Some(parent) => parent.rebase(root),
            None => root,
        };
        Arc::new(Scope {
            name: self.name.clone(),
            scope_type: self.scope_type,
            ty: self.ty.clone(),
            all_types: Arc::clone(&self.all_types),
            parent: Some(parent),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope_type(&self) -> ScopeType {
        self.scope_type
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn all_types(&self) -> &Arc<TypeRegistry> {
        &self.all_types
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.ty.is_any()
    }

    /// This scope followed by each ancestor, nearest first.
    pub fn chain(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |scope| scope.parent.as_deref())
    }

    /// Resolve a reference by name, walking up the chain.
    pub fn resolve_reference_symbol(&self, name: &str) -> Option<VariableSymbol> {
        if self.is_dynamic() && !self.is_declared_in_static_ancestor(name) {
            return Some(VariableSymbol::new(name, Type::Any));
        }
        match self.all_types.find_reference(&self.ty, name) {
            Some(symbol) => Some(symbol.clone()),
            None if self.is_member_scope() => None,
            None => self
                .parent
                .as_ref()
                .and_then(|parent| parent.resolve_reference_symbol(name)),
        }
    }

    /// A static `PATH` scope: `a.b` looks up `b` on `a` and nowhere else.
    fn is_member_scope(&self) -> bool {
        self.scope_type == ScopeType::Path && !self.is_dynamic()
    }

    /// Scopes a reference lookup from here may consult, nearest first.
    ///
    /// Same as [`Scope::chain`], except that a static `PATH` scope ends it.
    pub fn reference_chain(&self) -> impl Iterator<Item = &Scope> {
        let depth = if self.is_member_scope() { 1 } else { usize::MAX };
        self.chain().take(depth)
    }

    fn is_declared_in_static_ancestor(&self, name: &str) -> bool {
        self.chain()
            .skip(1)
            .filter(|scope| !scope.is_dynamic())
            .any(|scope| scope.all_types.find_reference(&scope.ty, name).is_some())
    }

    /// Visible in this scope, counting names made visible by dynamism.
    pub fn is_reference_in_current_scope(&self, name: &str) -> bool {
        self.is_dynamic() || self.all_types.find_reference(&self.ty, name).is_some()
    }

    /// Actually declared by this scope or one of its ancestors.
    pub fn is_reference_strictly_in_scope(&self, name: &str) -> bool {
        self.reference_chain()
            .any(|scope| scope.all_types.find_reference(&scope.ty, name).is_some())
    }

    /// Resolve a function by exact name and arity, walking up the chain.
    ///
    /// A dynamic global scope has no knowable overloads; if it is also the
    /// root of the chain the lookup fails.
    pub fn resolve_function_symbol(
        &self,
        name: &str,
        arity: usize,
    ) -> Result<Option<FunctionSymbol>, ScopeError> {
        if self.is_dynamic() && self.scope_type == ScopeType::Global && self.parent.is_none() {
            return Err(ScopeError::DynamicGlobalFunctionLookup {
                scope: self.name.clone(),
                name: name.to_string(),
                arity,
            });
        }
        if let Some(function) = self.all_types.find_function(&self.ty, name, arity) {
            return Ok(Some(function.clone()));
        }
        match &self.parent {
            Some(parent) => parent.resolve_function_symbol(name, arity),
            None => Ok(None),
        }
    }

    /// Resolve a type written inside an expression (casts, `instanceof`).
    ///
    /// Resolution happens against the nearest static scope; with no static
    /// scope in the chain, or an unknown name, the result is `Unknown`.
    pub fn resolve_type_of(&self, type_expr: &TypeExpr) -> Type {
        match self.chain().find(|scope| !scope.is_dynamic()) {
            Some(scope) => resolve_type_expr(&scope.all_types, type_expr),
            None => Type::Unknown,
        }
    }
}

fn resolve_type_expr(registry: &TypeRegistry, type_expr: &TypeExpr) -> Type {
    match &type_expr.kind {
        TypeExprKind::Named(name) => registry.resolve_type(name).unwrap_or(Type::Unknown),
        TypeExprKind::Array(element) => match resolve_type_expr(registry, element) {
            Type::Unknown => Type::Unknown,
            element => Type::array(element),
        },
        TypeExprKind::Union(left, right) => match (
            resolve_type_expr(registry, left),
            resolve_type_expr(registry, right),
        ) {
            (Type::Unknown, _) | (_, Type::Unknown) => Type::Unknown,
            (left, right) => Type::union(left, right),
        },
        TypeExprKind::Generic { name, bound } => Type::generic(
            name.as_str(),
            bound.as_ref().map(|bound| resolve_type_expr(registry, bound)),
        ),
        TypeExprKind::Missing => Type::Unknown,
    }
}
