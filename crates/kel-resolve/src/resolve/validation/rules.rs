//! Per-node validation rules.

use kel_ast::{Node, NodeKind, Type};

use super::suggest::{suggest_function, suggest_reference};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::resolve::generation::is_number_like;

/// Identifier and function resolution.
pub(super) fn check_resolution(node: &Node, out: &mut Vec<Diagnostic>) {
    match &node.kind {
        NodeKind::Identifier { name } if node.ty.is_unknown() => {
            let message = match suggest_reference(&node.scope, name) {
                Some(suggestion) => {
                    format!("unresolved reference '{name}'; did you mean '{suggestion}'?")
                }
                None => format!("unresolved reference '{name}'"),
            };
            out.push(Diagnostic::error(
                DiagnosticKind::UnresolvedReference,
                node.span,
                node.kind.clone(),
                message,
            ));
        }
        NodeKind::Function { name, arity } => check_function(node, name, *arity, out),
        _ => {}
    }
}

fn check_function(node: &Node, name: &str, arity: usize, out: &mut Vec<Diagnostic>) {
    // A dynamic global root already failed generation.
    let Ok(resolved) = node.scope.resolve_function_symbol(name, arity) else {
        return;
    };

    let Some(function) = resolved else {
        let mut message = format!("unresolved function '{name}' with {arity} argument(s)");
        if let Some(suggestion) = suggest_function(&node.scope, name) {
            message.push_str(&format!("; did you mean '{suggestion}'?"));
        }
        let mut diagnostic = Diagnostic::error(
            DiagnosticKind::UnresolvedFunction,
            node.span,
            node.kind.clone(),
            message,
        );
        let registry = node.scope.all_types();
        let overloads: Vec<String> = node
            .scope
            .chain()
            .flat_map(|scope| registry.functions_of(scope.ty()))
            .filter(|function| function.name == name)
            .map(ToString::to_string)
            .collect();
        if !overloads.is_empty() {
            diagnostic = diagnostic.with_note(format!("available: {}", overloads.join(", ")));
        }
        out.push(diagnostic);
        return;
    };

    for (parameter, argument) in function.parameters.iter().zip(&node.children) {
        let expected = parameter.ty.rewrite_generic_bounds();
        if argument.ty.is_unknown() || expected.is_assignable_from(&argument.ty) {
            continue;
        }
        out.push(Diagnostic::error(
            DiagnosticKind::TypeMismatch,
            argument.span,
            argument.kind.clone(),
            format!(
                "argument {} of '{}' expects {}, found {}",
                parameter.index + 1,
                name,
                expected,
                argument.ty
            ),
        ));
    }
}

/// Kind-specific checks other than resolution.
pub(super) fn check_node(node: &Node, out: &mut Vec<Diagnostic>) {
    match &node.kind {
        NodeKind::Empty => out.push(Diagnostic::error(
            DiagnosticKind::Syntax,
            node.span,
            node.kind.clone(),
            "expected expression",
        )),
        NodeKind::Error { text } => out.push(Diagnostic::error(
            DiagnosticKind::Syntax,
            node.span,
            node.kind.clone(),
            format!("unexpected '{text}'"),
        )),

        NodeKind::Addition
        | NodeKind::Subtraction
        | NodeKind::Multiplication
        | NodeKind::Division
        | NodeKind::Modulus
        | NodeKind::Exponent
        | NodeKind::Negation => {
            for operand in &node.children {
                expect_operand(node, operand, "Number", is_numeric_operand, out);
            }
        }
        NodeKind::Conjunction | NodeKind::Disjunction | NodeKind::Not => {
            for operand in &node.children {
                expect_operand(node, operand, "Boolean", is_boolean, out);
            }
        }
        NodeKind::LessThan
        | NodeKind::LessThanOrEquals
        | NodeKind::MoreThan
        | NodeKind::MoreThanOrEquals => {
            if let Some((left, right)) = known_operands(node) {
                if !left.ty.is_comparable_with(&right.ty) {
                    out.push(Diagnostic::error(
                        DiagnosticKind::NotComparable,
                        node.span,
                        node.kind.clone(),
                        format!(
                            "'{}' cannot compare {} with {}",
                            operator(&node.kind),
                            left.ty,
                            right.ty
                        ),
                    ));
                }
            }
        }
        NodeKind::Equals | NodeKind::NotEquals => {
            if let Some((left, right)) = known_operands(node) {
                if !compatible(&left.ty, &right.ty) {
                    out.push(Diagnostic::error(
                        DiagnosticKind::TypeMismatch,
                        node.span,
                        node.kind.clone(),
                        format!(
                            "'{}' between unrelated types {} and {}",
                            operator(&node.kind),
                            left.ty,
                            right.ty
                        ),
                    ));
                }
            }
        }
        NodeKind::In => check_in(node, out),
        NodeKind::Matches => {
            for operand in &node.children {
                expect_operand(node, operand, "String", is_string, out);
            }
        }

        NodeKind::InstanceOf | NodeKind::TypeOf => {
            if let Some(target) = node.child(1) {
                check_type_name(target, out);
            }
        }
        NodeKind::Cast => check_cast(node, out),

        NodeKind::AccessByIndex => {
            expect_collection(node.child(0), out);
            if let Some(index) = node.child(1) {
                check_index(index, out);
            }
        }
        NodeKind::CollectionFilter { .. } => {
            expect_collection(node.child(0), out);
            if let Some(predicate) = node.child(1) {
                expect_boolean(predicate, "filter predicate", out);
            }
        }
        NodeKind::For { .. } => expect_collection(node.child(1), out),
        NodeKind::Some { .. } | NodeKind::Every { .. } => {
            expect_collection(node.child(1), out);
            if let Some(body) = node.child(2) {
                expect_boolean(body, "condition", out);
            }
        }

        NodeKind::If => check_if(node, out),
        NodeKind::ValueBlock => check_shadowing(node, out),
        NodeKind::InlineArray => {
            let common = node
                .children
                .iter()
                .map(|element| Some(element.ty.clone()))
                .reduce(|common, ty| match (common, ty) {
                    (Some(common), Some(ty)) => common.resolve_common_type_of(&ty),
                    _ => None,
                });
            if let Some(None) = common {
                out.push(Diagnostic::error(
                    DiagnosticKind::NoCommonType,
                    node.span,
                    node.kind.clone(),
                    "array elements have no common type",
                ));
            }
        }

        _ => {}
    }
}

fn is_numeric_operand(ty: &Type) -> bool {
    ty.is_any() || is_number_like(ty)
}

fn is_boolean(ty: &Type) -> bool {
    Type::boolean().is_assignable_from(ty)
}

fn is_string(ty: &Type) -> bool {
    Type::string().is_assignable_from(ty)
}

fn compatible(left: &Type, right: &Type) -> bool {
    left.is_assignable_from(right) || right.is_assignable_from(left)
}

fn known_operands(node: &Node) -> Option<(&Node, &Node)> {
    let left = node.child(0)?;
    let right = node.child(1)?;
    (!left.ty.is_unknown() && !right.ty.is_unknown()).then_some((left, right))
}

fn expect_operand(
    node: &Node,
    operand: &Node,
    expected: &str,
    accepts: fn(&Type) -> bool,
    out: &mut Vec<Diagnostic>,
) {
    if operand.ty.is_unknown() || accepts(&operand.ty) {
        return;
    }
    out.push(Diagnostic::error(
        DiagnosticKind::TypeMismatch,
        operand.span,
        operand.kind.clone(),
        format!(
            "'{}' expects {} operands, found {}",
            operator(&node.kind),
            expected,
            operand.ty
        ),
    ));
}

fn expect_boolean(node: &Node, what: &str, out: &mut Vec<Diagnostic>) {
    if node.ty.is_unknown() || is_boolean(&node.ty) {
        return;
    }
    out.push(Diagnostic::error(
        DiagnosticKind::TypeMismatch,
        node.span,
        node.kind.clone(),
        format!("{what} must be Boolean, found {}", node.ty),
    ));
}

fn expect_collection(node: Option<&Node>, out: &mut Vec<Diagnostic>) {
    let Some(node) = node else {
        return;
    };
    if node.ty.is_unknown() || node.ty.is_collection() {
        return;
    }
    out.push(Diagnostic::error(
        DiagnosticKind::NotCollection,
        node.span,
        node.kind.clone(),
        format!("expected a collection, found {}", node.ty),
    ));
}

fn check_in(node: &Node, out: &mut Vec<Diagnostic>) {
    let Some((value, collection)) = known_operands(node) else {
        return;
    };
    if !collection.ty.is_collection() {
        expect_collection(Some(collection), out);
        return;
    }
    let element = collection.ty.unwrap_array_type();
    if !compatible(&element, &value.ty) {
        out.push(Diagnostic::error(
            DiagnosticKind::TypeMismatch,
            node.span,
            node.kind.clone(),
            format!("{} can never be in a collection of {}", value.ty, element),
        ));
    }
}

fn check_index(index: &Node, out: &mut Vec<Diagnostic>) {
    let message = match &index.kind {
        NodeKind::Negation
            if matches!(index.child(0).map(|c| &c.kind), Some(NodeKind::Decimal(_))) =>
        {
            "index must not be negative"
        }
        NodeKind::Decimal(value) if value.fract() != 0.0 => "index must be a whole number",
        _ => return,
    };
    out.push(Diagnostic::error(
        DiagnosticKind::InvalidIndex,
        index.span,
        index.kind.clone(),
        message,
    ));
}

/// Type written in source; an empty text means the parser found none.
fn check_type_name(target: &Node, out: &mut Vec<Diagnostic>) -> bool {
    if !target.ty.is_unknown() {
        return true;
    }
    let NodeKind::Type { text } = &target.kind else {
        return false;
    };
    let diagnostic = if text.is_empty() {
        Diagnostic::error(
            DiagnosticKind::Syntax,
            target.span,
            target.kind.clone(),
            "expected type name",
        )
    } else {
        Diagnostic::error(
            DiagnosticKind::UnknownType,
            target.span,
            target.kind.clone(),
            format!("unknown type '{text}'"),
        )
    };
    out.push(diagnostic);
    false
}

fn check_cast(node: &Node, out: &mut Vec<Diagnostic>) {
    let (Some(target), Some(value)) = (node.child(0), node.child(1)) else {
        return;
    };
    if !check_type_name(target, out) {
        return;
    }
    if target.ty.is_union() || target.ty.contains_generic() {
        out.push(Diagnostic::error(
            DiagnosticKind::InvalidCast,
            target.span,
            target.kind.clone(),
            format!("cannot cast to {}", target.ty),
        ));
        return;
    }
    if value.ty.is_unknown() || value.ty.is_any() {
        return;
    }

    if target.ty.is_assignable_from(&value.ty) {
        out.push(Diagnostic::info(
            DiagnosticKind::RedundantCast,
            node.span,
            node.kind.clone(),
            format!("redundant cast: value is already {}", value.ty),
        ));
    } else if !value.ty.is_assignable_from(&target.ty) {
        out.push(Diagnostic::warning(
            DiagnosticKind::SuspiciousCast,
            node.span,
            node.kind.clone(),
            format!("cast from {} to unrelated type {}", value.ty, target.ty),
        ));
    }
}

fn check_if(node: &Node, out: &mut Vec<Diagnostic>) {
    if let Some(condition) = node.child(0) {
        expect_boolean(condition, "condition", out);
    }
    let (Some(then_branch), Some(else_branch)) = (node.child(1), node.child(2)) else {
        return;
    };
    if then_branch.ty.resolve_common_type_of(&else_branch.ty).is_none() {
        out.push(Diagnostic::error(
            DiagnosticKind::NoCommonType,
            node.span,
            node.kind.clone(),
            format!(
                "branches have no common type: {} and {}",
                then_branch.ty, else_branch.ty
            ),
        ));
    }
}

fn check_shadowing(node: &Node, out: &mut Vec<Diagnostic>) {
    let bindings = node.children.len().saturating_sub(1);
    for variable in &node.children[..bindings] {
        let NodeKind::Variable { name } = &variable.kind else {
            continue;
        };
        if variable.scope.is_reference_strictly_in_scope(name) {
            out.push(Diagnostic::error(
                DiagnosticKind::Shadowing,
                variable.span,
                variable.kind.clone(),
                format!("'{name}' shadows a name already in scope"),
            ));
        }
    }
}

fn operator(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Addition => "+",
        NodeKind::Subtraction => "-",
        NodeKind::Multiplication => "*",
        NodeKind::Division => "/",
        NodeKind::Modulus => "%",
        NodeKind::Exponent => "**",
        NodeKind::Negation => "-",
        NodeKind::Conjunction => "and",
        NodeKind::Disjunction => "or",
        NodeKind::Not => "not",
        NodeKind::Equals => "=",
        NodeKind::NotEquals => "!=",
        NodeKind::LessThan => "<",
        NodeKind::LessThanOrEquals => "<=",
        NodeKind::MoreThan => ">",
        NodeKind::MoreThanOrEquals => ">=",
        NodeKind::In => "in",
        NodeKind::Matches => "matches",
        other => other.label(),
    }
}
