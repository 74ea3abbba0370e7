//! Atomic expressions - literals, identifiers, calls, casts, inline collections.

use kel_ast::{Expr, ExprKind, Ident, MapEntry};
use kel_lexer::Token;

use super::super::{ParseError, TokenStream, types};
use super::pratt;

/// Parse atomic expressions.
///
/// Never consumes a token that closes an enclosing construct; in that
/// position a `Missing` placeholder is returned instead.
pub(super) fn parse_atom(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();

    let kind = match stream.peek() {
        Some(Token::Number(value)) => ExprKind::Number(*value),
        Some(Token::String(s)) => ExprKind::String(s.to_string()),
        Some(Token::Date(text)) => ExprKind::Date(text.to_string()),
        Some(Token::DateTime(text)) => ExprKind::DateTime(text.to_string()),
        Some(Token::True) => ExprKind::Boolean(true),
        Some(Token::False) => ExprKind::Boolean(false),
        Some(Token::Null) => ExprKind::Null,
        Some(Token::This) => ExprKind::This,
        Some(Token::Ident(_)) if matches!(stream.peek_nth(1), Some(Token::LParen)) => {
            return parse_call(stream);
        }
        Some(Token::Ident(name)) => ExprKind::Identifier(name.to_string()),
        Some(Token::LParen) => return parse_parenthesized(stream),
        Some(Token::LBrace) => return parse_inline_collection(stream),
        Some(Token::Unknown(text)) => {
            let span = stream.current_span();
            stream.error(ParseError::invalid_token(text, span));
            stream.advance();
            return Expr::error(text.to_string(), span);
        }
        Some(
            Token::RParen
            | Token::RBracket
            | Token::RBrace
            | Token::Comma
            | Token::Colon
            | Token::Then
            | Token::Else
            | Token::Return
            | Token::Satisfies
            | Token::To,
        )
        | None => {
            let span = stream.current_span();
            stream.error(ParseError::unexpected_token(
                stream.peek(),
                "where an expression was expected",
                span,
            ));
            return Expr::missing(stream.insertion_point());
        }
        Some(other) => {
            let span = stream.current_span();
            stream.error(ParseError::unexpected_token(Some(other), "in expression", span));
            stream.advance();
            return Expr::error(other.to_string(), span);
        }
    };

    stream.advance();
    Expr::new(kind, stream.span_from(start))
}

/// Parse a function call `Name(args...)`.
pub(super) fn parse_call(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    let name_span = stream.current_span();
    let name = match stream.advance() {
        Some(Token::Ident(name)) => name.to_string(),
        _ => String::new(),
    };
    let args = parse_call_args(stream);
    Expr::new(
        ExprKind::Call {
            name: Ident::new(name, name_span),
            args,
        },
        stream.span_from(start),
    )
}

/// Parse function call arguments.
fn parse_call_args(stream: &mut TokenStream) -> Vec<Expr> {
    stream.expect(Token::LParen);

    let mut args = Vec::new();
    if stream.eat(&Token::RParen) {
        return args;
    }
    loop {
        args.push(super::parse_expr(stream));
        if !stream.eat(&Token::Comma) {
            break;
        }
    }

    stream.expect(Token::RParen);
    args
}

/// Parse `( expr )` or a cast `(Type) operand`.
fn parse_parenthesized(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    stream.advance();

    if types::is_cast_ahead(stream) {
        let ty = types::parse_type_expr(stream);
        stream.expect(Token::RParen);
        let value = pratt::parse_prefix(stream);
        return Expr::new(
            ExprKind::Cast {
                ty,
                value: Box::new(value),
            },
            stream.span_from(start),
        );
    }

    let inner = super::parse_expr(stream);
    stream.expect(Token::RParen);
    inner
}

/// Parse `{1, 2}` (inline array) or `{key: value, ...}` (inline map).
fn parse_inline_collection(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    stream.advance();

    if stream.eat(&Token::RBrace) {
        return Expr::new(ExprKind::InlineArray(Vec::new()), stream.span_from(start));
    }

    let is_map = matches!(stream.peek(), Some(Token::Ident(_)))
        && matches!(stream.peek_nth(1), Some(Token::Colon));

    let kind = if is_map {
        ExprKind::InlineMap(parse_map_entries(stream))
    } else {
        let mut elements = Vec::new();
        loop {
            elements.push(super::parse_expr(stream));
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
        ExprKind::InlineArray(elements)
    };

    stream.expect(Token::RBrace);
    Expr::new(kind, stream.span_from(start))
}

fn parse_map_entries(stream: &mut TokenStream) -> Vec<MapEntry> {
    let mut entries = Vec::new();
    loop {
        let key = match stream.peek() {
            Some(Token::Ident(name)) => {
                let span = stream.current_span();
                stream.advance();
                Ident::new(name.to_string(), span)
            }
            _ => {
                let span = stream.current_span();
                stream.error(ParseError::invalid_syntax(
                    "inline map entries must be written as 'name: value'",
                    span,
                ));
                break;
            }
        };
        stream.expect(Token::Colon);
        let value = super::parse_expr(stream);
        entries.push(MapEntry { key, value });
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    entries
}
