//! Typed AST generation.
//!
//! Transforms an untyped [`Expr`] from the parser into a typed [`Node`] tree.
//! Every syntax construct becomes exactly one node carrying its inferred
//! type and the scope active at that point.
//!
//! # Scopes
//!
//! The generator keeps an explicit scope stack on top of the caller's scope:
//!
//! - `a.b` visits `b` in a `PATH` scope typed to `a` (one array layer
//!   removed)
//! - `xs[p]` / `xs?[p]` visits `p` in a `FILTER` scope typed to the union of
//!   the element type and the enclosing scope type
//! - `for`/`some`/`every` and `set ... to` bindings visit their bodies in
//!   `VARIABLES_MAP` scopes whose synthetic type declares only the variable
//!
//! # Narrowing
//!
//! `x instanceof T` and `x typeof T` produce a fact `x -> T` when `T` is
//! strictly more specific than the type of `x`; testing against a supertype
//! leaves `x` as it is. Facts are pushed for the right side of `and` and the
//! `then` branch of `if`, so later references to `x` there see `T`. A filter
//! predicate that narrows `this` narrows the filter result.
//!
//! # Recovery
//!
//! `Missing` becomes an `Empty` node and `Error` an `Error` node, both typed
//! `Unknown`. Unresolved names and functions are typed `Unknown` and left to
//! the validator. The only failure is a function lookup on a dynamic global
//! scope with nothing above it.

mod facts;

use std::sync::Arc;

use tracing::debug;

use kel_ast::{
    BinaryOp, Binding, Expr, ExprKind, Ident, IterationKind, MapEntry, Node, NodeKind, Scope,
    ScopeType, Span, SymbolTable, Type, TypeExpr, TypeFacts, UnaryOp, VariableSymbol,
};

use crate::error::GenerationError;
use facts::{FactStack, conjoin};

/// Fact key for the implicit receiver.
pub const THIS: &str = "this";

/// Generate a typed AST for `expr` evaluated in `scope`.
///
/// # Errors
///
/// [`GenerationError::Scope`] if a function is called with a dynamic global
/// scope as the outermost scope.
pub fn generate(expr: &Expr, scope: &Arc<Scope>) -> Result<Node, GenerationError> {
    let mut generator = AstGenerator::new(Arc::clone(scope));
    let node = generator.visit(expr)?;
    debug!(nodes = node.size(), ty = %node.ty, "generated typed AST");
    Ok(node)
}

/// Stateful tree walk: scope stack plus fact stack.
pub struct AstGenerator {
    root: Arc<Scope>,
    scopes: Vec<Arc<Scope>>,
    facts: FactStack,
}

impl AstGenerator {
    pub fn new(root: Arc<Scope>) -> Self {
        Self {
            root,
            scopes: Vec::new(),
            facts: FactStack::default(),
        }
    }

    fn scope(&self) -> &Arc<Scope> {
        self.scopes.last().unwrap_or(&self.root)
    }

    pub fn visit(&mut self, expr: &Expr) -> Result<Node, GenerationError> {
        let span = expr.span;
        let scope = Arc::clone(self.scope());

        let node = match &expr.kind {
            // === Literals ===
            ExprKind::Number(value) => {
                Node::new(NodeKind::Decimal(*value), span, Type::number(), scope)
            }
            ExprKind::String(value) => {
                Node::new(NodeKind::String(value.clone()), span, Type::string(), scope)
            }
            ExprKind::Boolean(value) => {
                Node::new(NodeKind::Boolean(*value), span, Type::boolean(), scope)
            }
            ExprKind::Null => Node::new(NodeKind::Null, span, Type::Any, scope),
            ExprKind::Date(text) => {
                Node::new(NodeKind::Date(text.clone()), span, Type::date(), scope)
            }
            ExprKind::DateTime(text) => {
                Node::new(NodeKind::DateTime(text.clone()), span, Type::datetime(), scope)
            }
            ExprKind::InlineArray(elements) => self.visit_inline_array(elements, span)?,
            ExprKind::InlineMap(entries) => self.visit_inline_map(entries, span)?,

            // === References ===
            ExprKind::This => Node::new(NodeKind::This, span, self.this_type(), scope),
            ExprKind::Identifier(name) => self.visit_identifier(name, span),
            ExprKind::Path {
                object,
                property,
                null_safe,
            } => self.visit_path(expr, object, property, *null_safe)?,
            ExprKind::Access {
                collection,
                predicate,
                explicit_filter,
            } => self.visit_access(collection, predicate, *explicit_filter, span)?,
            ExprKind::Call { name, args } => self.visit_call(name, args, span)?,

            // === Operators ===
            ExprKind::Unary { op, operand } => {
                let operand = self.visit(operand)?;
                let (kind, ty) = match op {
                    UnaryOp::Neg if is_number_like(&operand.ty) => {
                        (NodeKind::Negation, operand.ty.clone())
                    }
                    UnaryOp::Neg => (NodeKind::Negation, Type::number()),
                    UnaryOp::Not => (NodeKind::Not, Type::boolean()),
                };
                Node::new(kind, span, ty, scope).with_children(vec![operand])
            }
            ExprKind::Binary { op, left, right } => self.visit_binary(*op, left, right, span)?,

            // === Types ===
            ExprKind::InstanceOf { value, ty } => {
                self.visit_type_test(NodeKind::InstanceOf, value, ty, span)?
            }
            ExprKind::TypeOf { value, ty } => {
                self.visit_type_test(NodeKind::TypeOf, value, ty, span)?
            }
            ExprKind::Cast { ty, value } => {
                let target = self.type_node(ty);
                let value = self.visit(value)?;
                Node::new(NodeKind::Cast, span, target.ty.clone(), scope)
                    .with_children(vec![target, value])
            }

            // === Control flow ===
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.visit_if(condition, then_branch, else_branch.as_deref(), span)?,
            ExprKind::Iteration {
                kind,
                variable,
                collection,
                body,
            } => self.visit_iteration(*kind, variable, collection, body, span)?,
            ExprKind::ValueBlock { bindings, body } => {
                let depth = self.scopes.len();
                let result = self.visit_value_block(bindings, body, span);
                self.scopes.truncate(depth);
                result?
            }

            // === Recovery ===
            ExprKind::Missing => Node::new(NodeKind::Empty, span, Type::Unknown, scope),
            ExprKind::Error(text) => Node::new(
                NodeKind::Error { text: text.clone() },
                span,
                Type::Unknown,
                scope,
            ),
        };

        Ok(node)
    }

    /// `this` is the nearest non-variable scope's type; inside a filter it
    /// is the element being tested.
    fn this_type(&self) -> Type {
        if let Some(fact) = self.facts.lookup(THIS) {
            return fact.clone();
        }
        let receiver = self
            .scope()
            .chain()
            .find(|scope| scope.scope_type() != ScopeType::VariablesMap);
        match receiver {
            Some(scope) if scope.scope_type() == ScopeType::Filter => match scope.ty() {
                Type::Union(element, _) => (**element).clone(),
                other => other.clone(),
            },
            Some(scope) => scope.ty().clone(),
            None => Type::Any,
        }
    }

    fn visit_identifier(&self, name: &str, span: Span) -> Node {
        let scope = Arc::clone(self.scope());
        let fact = match scope.scope_type() {
            ScopeType::Path => None,
            _ => self.facts.lookup(name).cloned(),
        };
        let ty = fact.unwrap_or_else(|| {
            scope
                .resolve_reference_symbol(name)
                .map(|symbol| symbol.ty)
                .unwrap_or(Type::Unknown)
        });
        Node::new(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            span,
            ty,
            scope,
        )
    }

    fn visit_path(
        &mut self,
        expr: &Expr,
        object: &Expr,
        property: &Expr,
        null_safe: bool,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let object = self.visit(object)?;
        let receiver = object.ty.unwrap_array_type();
        let traverses_collection = receiver != object.ty;

        self.scopes
            .push(scope.child(receiver.name(), ScopeType::Path, receiver));
        let property = self.visit(property);
        self.scopes.pop();
        let property = property?;

        let mut ty = if object.ty.is_unknown() || property.ty.is_unknown() {
            Type::Unknown
        } else if traverses_collection {
            object.ty.map_to(&property.ty.unwrap_array_type())
        } else {
            property.ty.clone()
        };
        if let Some(fact) = expr
            .reference_key()
            .and_then(|key| self.facts.lookup(&key).cloned())
        {
            ty = fact;
        }

        Ok(Node::new(NodeKind::Path { null_safe }, expr.span, ty, scope)
            .with_children(vec![object, property]))
    }

    /// `xs[p]` is an index when `p` is numeric, otherwise a filter.
    fn visit_access(
        &mut self,
        collection: &Expr,
        predicate: &Expr,
        explicit_filter: bool,
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let collection = self.visit(collection)?;
        let element = collection.ty.unwrap_array_type();
        let filter_type = if element.is_any() {
            Type::Any
        } else {
            Type::union(element.clone(), scope.ty().clone())
        };

        self.scopes
            .push(scope.child(element.name(), ScopeType::Filter, filter_type));
        let outer_facts = self.facts.isolate();
        let predicate = self.visit(predicate);
        self.facts.restore(outer_facts);
        self.scopes.pop();
        let predicate = predicate?;

        let node = if !explicit_filter && is_number_like(&predicate.ty) {
            Node::new(NodeKind::AccessByIndex, span, element, scope)
        } else {
            let narrowed = predicate
                .facts
                .as_ref()
                .and_then(|facts| facts.get(THIS))
                .map(Type::wrap_array_type);
            let ty = narrowed.unwrap_or_else(|| collection.ty.clone());
            Node::new(
                NodeKind::CollectionFilter {
                    explicit: explicit_filter,
                },
                span,
                ty,
                scope,
            )
        };
        Ok(node.with_children(vec![collection, predicate]))
    }

    fn visit_call(
        &mut self,
        name: &Ident,
        args: &[Expr],
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let args = args
            .iter()
            .map(|arg| self.visit(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let argument_types: Vec<Type> = args.iter().map(|arg| arg.ty.clone()).collect();

        let ty = match scope.resolve_function_symbol(&name.name, args.len())? {
            Some(function) => function.resolve_return_type(&argument_types),
            None => Type::Unknown,
        };

        Ok(Node::new(
            NodeKind::Function {
                name: name.name.clone(),
                arity: args.len(),
            },
            span,
            ty,
            scope,
        )
        .with_children(args))
    }

    fn visit_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let left = self.visit(left)?;

        if op == BinaryOp::And {
            self.facts.push(left.facts.as_ref());
            let right = self.visit(right);
            self.facts.pop();
            let right = right?;
            let facts = conjoin(left.facts.as_ref(), right.facts.as_ref());
            return Ok(Node::new(NodeKind::Conjunction, span, Type::boolean(), scope)
                .with_children(vec![left, right])
                .with_facts(facts));
        }

        let right = self.visit(right)?;
        let ty = if op.is_arithmetic() {
            arithmetic_type(&left.ty, &right.ty)
        } else {
            Type::boolean()
        };
        Ok(Node::new(binary_kind(op), span, ty, scope).with_children(vec![left, right]))
    }

    fn visit_type_test(
        &mut self,
        kind: NodeKind,
        value: &Expr,
        type_expr: &TypeExpr,
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let value_node = self.visit(value)?;
        let target = self.type_node(type_expr);

        let mut facts = TypeFacts::new();
        if narrows(&value_node.ty, &target.ty) {
            if let Some(key) = value.reference_key() {
                facts.insert(key, target.ty.clone());
            }
        }

        Ok(Node::new(kind, span, Type::boolean(), scope)
            .with_children(vec![value_node, target])
            .with_facts(facts))
    }

    fn type_node(&self, type_expr: &TypeExpr) -> Node {
        let scope = Arc::clone(self.scope());
        let ty = scope.resolve_type_of(type_expr);
        Node::new(
            NodeKind::Type {
                text: type_expr.to_string(),
            },
            type_expr.span,
            ty,
            scope,
        )
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: Option<&Expr>,
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let condition = self.visit(condition)?;

        self.facts.push(condition.facts.as_ref());
        let then_node = self.visit(then_branch);
        self.facts.pop();
        let then_node = then_node?;

        let else_node = else_branch.map(|branch| self.visit(branch)).transpose()?;
        let ty = match &else_node {
            Some(else_node) => then_node
                .ty
                .resolve_common_type_of(&else_node.ty)
                .unwrap_or(Type::Unknown),
            None => then_node.ty.clone(),
        };

        let mut children = vec![condition, then_node];
        children.extend(else_node);
        Ok(Node::new(NodeKind::If, span, ty, scope).with_children(children))
    }

    fn visit_iteration(
        &mut self,
        kind: IterationKind,
        variable: &Ident,
        collection: &Expr,
        body: &Expr,
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let collection = self.visit(collection)?;
        let element = collection.ty.unwrap_array_type();

        let variable_node = Node::new(
            NodeKind::Variable {
                name: variable.name.clone(),
            },
            variable.span,
            element.clone(),
            Arc::clone(&scope),
        );
        self.scopes
            .push(variables_scope(&scope, &variable.name, element));
        let body = self.visit(body);
        self.scopes.pop();
        let body = body?;

        let (kind, ty) = match kind {
            IterationKind::For => (
                NodeKind::For {
                    variable: variable.name.clone(),
                },
                body.ty.wrap_array_type(),
            ),
            IterationKind::Some => (
                NodeKind::Some {
                    variable: variable.name.clone(),
                },
                Type::boolean(),
            ),
            IterationKind::Every => (
                NodeKind::Every {
                    variable: variable.name.clone(),
                },
                Type::boolean(),
            ),
        };
        Ok(Node::new(kind, span, ty, scope).with_children(vec![variable_node, collection, body]))
    }

    /// Pushes one scope per binding; the caller truncates the stack.
    fn visit_value_block(
        &mut self,
        bindings: &[Binding],
        body: &Expr,
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let mut children = Vec::with_capacity(bindings.len() + 1);

        for binding in bindings {
            let declared_in = Arc::clone(self.scope());
            let value = self.visit(&binding.value)?;
            let ty = value.ty.clone();
            self.scopes
                .push(variables_scope(&declared_in, &binding.name.name, ty.clone()));
            children.push(
                Node::new(
                    NodeKind::Variable {
                        name: binding.name.name.clone(),
                    },
                    binding.name.span.merge(&value.span),
                    ty,
                    declared_in,
                )
                .with_children(vec![value]),
            );
        }

        let body = self.visit(body)?;
        let ty = body.ty.clone();
        children.push(body);
        Ok(Node::new(NodeKind::ValueBlock, span, ty, scope).with_children(children))
    }

    fn visit_inline_array(
        &mut self,
        elements: &[Expr],
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let elements = elements
            .iter()
            .map(|element| self.visit(element))
            .collect::<Result<Vec<_>, _>>()?;
        let ty = match common_element_type(elements.iter().map(|element| &element.ty)) {
            Some(element) => element.wrap_array_type(),
            None => Type::Unknown,
        };
        Ok(Node::new(NodeKind::InlineArray, span, ty, scope).with_children(elements))
    }

    fn visit_inline_map(
        &mut self,
        entries: &[MapEntry],
        span: Span,
    ) -> Result<Node, GenerationError> {
        let scope = Arc::clone(self.scope());
        let mut members = SymbolTable::new();
        let mut keys = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for entry in entries {
            let value = self.visit(&entry.value)?;
            members.add_reference(VariableSymbol::new(entry.key.name.clone(), value.ty.clone()));
            keys.push(entry.key.name.clone());
            values.push(value);
        }
        let ty = Type::synthetic(record_type_name(&members), members);
        Ok(Node::new(NodeKind::InlineMap { keys }, span, ty, scope).with_children(values))
    }
}

/// Child scope declaring a single variable.
fn variables_scope(parent: &Arc<Scope>, name: &str, ty: Type) -> Arc<Scope> {
    let mut members = SymbolTable::new();
    if !name.is_empty() {
        members.add_reference(VariableSymbol::new(name, ty));
    }
    let scope_type = Type::synthetic(record_type_name(&members), members);
    parent.child(name, ScopeType::VariablesMap, scope_type)
}

/// Display name of a synthetic record type: `{limit: Number, name: String}`.
fn record_type_name(members: &SymbolTable) -> String {
    let fields: Vec<String> = members
        .references()
        .map(|reference| format!("{}: {}", reference.name, reference.ty))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

pub(crate) fn is_number_like(ty: &Type) -> bool {
    !ty.is_any() && !ty.is_unknown() && Type::number().is_assignable_from(ty)
}

/// Whether a successful type test against `target` tells more than `current`.
fn narrows(current: &Type, target: &Type) -> bool {
    !target.is_unknown() && current != target && current.is_assignable_from(target)
}

fn arithmetic_type(left: &Type, right: &Type) -> Type {
    if is_number_like(left) && is_number_like(right) {
        left.resolve_common_type_of(right)
            .unwrap_or_else(Type::number)
    } else {
        Type::number()
    }
}

/// Common type of inline array elements; `Any` when there are none.
fn common_element_type<'a>(mut types: impl Iterator<Item = &'a Type>) -> Option<Type> {
    let Some(first) = types.next() else {
        return Some(Type::Any);
    };
    types.try_fold(first.clone(), |common, ty| common.resolve_common_type_of(ty))
}

fn binary_kind(op: BinaryOp) -> NodeKind {
    match op {
        BinaryOp::Add => NodeKind::Addition,
        BinaryOp::Sub => NodeKind::Subtraction,
        BinaryOp::Mul => NodeKind::Multiplication,
        BinaryOp::Div => NodeKind::Division,
        BinaryOp::Mod => NodeKind::Modulus,
        BinaryOp::Pow => NodeKind::Exponent,
        BinaryOp::Eq => NodeKind::Equals,
        BinaryOp::Ne => NodeKind::NotEquals,
        BinaryOp::Lt => NodeKind::LessThan,
        BinaryOp::Le => NodeKind::LessThanOrEquals,
        BinaryOp::Gt => NodeKind::MoreThan,
        BinaryOp::Ge => NodeKind::MoreThanOrEquals,
        BinaryOp::And => NodeKind::Conjunction,
        BinaryOp::Or => NodeKind::Disjunction,
        BinaryOp::In => NodeKind::In,
        BinaryOp::Matches => NodeKind::Matches,
    }
}
