//! Keyword-introduced forms: `if`, `for`/`some`/`every`, `set`.

use kel_ast::{Binding, Expr, ExprKind, Ident, IterationKind, Span};
use kel_lexer::Token;

use super::super::{ParseError, TokenStream};

/// Parse `if condition then a [else b]`.
pub(super) fn parse_if(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    stream.advance();

    let condition = super::parse_expr(stream);
    stream.expect(Token::Then);
    let then_branch = super::parse_expr(stream);
    let else_branch = stream
        .eat(&Token::Else)
        .then(|| Box::new(super::parse_expr(stream)));

    Expr::new(
        ExprKind::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
        },
        stream.span_from(start),
    )
}

/// Parse `for v in xs return body`, `some v in xs satisfies body` or
/// `every v in xs satisfies body`.
pub(super) fn parse_iteration(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    let kind = match stream.advance() {
        Some(Token::Some_) => IterationKind::Some,
        Some(Token::Every) => IterationKind::Every,
        _ => IterationKind::For,
    };

    let variable = parse_name(stream, "as iteration variable");
    stream.expect(Token::In);
    let collection = super::parse_expr(stream);
    match kind {
        IterationKind::For => stream.expect(Token::Return),
        _ => stream.expect(Token::Satisfies),
    };
    let body = super::parse_expr(stream);

    Expr::new(
        ExprKind::Iteration {
            kind,
            variable,
            collection: Box::new(collection),
            body: Box::new(body),
        },
        stream.span_from(start),
    )
}

/// Parse `set a to x, b to y return body`.
pub(super) fn parse_value_block(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    stream.advance();

    let mut bindings = Vec::new();
    loop {
        let name = parse_name(stream, "as variable name");
        stream.expect(Token::To);
        let value = super::parse_expr(stream);
        bindings.push(Binding { name, value });
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::Return);
    let body = super::parse_expr(stream);

    Expr::new(
        ExprKind::ValueBlock {
            bindings,
            body: Box::new(body),
        },
        stream.span_from(start),
    )
}

/// Parse a declared name; a missing one is empty and zero-width.
fn parse_name(stream: &mut TokenStream, context: &str) -> Ident {
    match stream.peek() {
        Some(Token::Ident(name)) => {
            let span = stream.current_span();
            stream.advance();
            Ident::new(name.to_string(), span)
        }
        other => {
            let span = stream.current_span();
            stream.error(ParseError::unexpected_token(other, context, span));
            Ident::new("", Span::point(stream.insertion_point()))
        }
    }
}
