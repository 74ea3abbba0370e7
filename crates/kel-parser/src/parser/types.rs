//! Type expression parser: `Name`, `Name[]`, `A | B`, `<T>`, `<T extends N>`.

use kel_ast::{TypeExpr, TypeExprKind};
use kel_lexer::Token;

use super::{ParseError, TokenStream};

/// Parse a (possibly union) type expression.
pub(super) fn parse_type_expr(stream: &mut TokenStream) -> TypeExpr {
    let mut left = parse_type_atom(stream);
    while stream.eat(&Token::Pipe) {
        let right = parse_type_atom(stream);
        let span = left.span.merge(&right.span);
        left = TypeExpr::new(TypeExprKind::Union(Box::new(left), Box::new(right)), span);
    }
    left
}

fn parse_type_atom(stream: &mut TokenStream) -> TypeExpr {
    let start = stream.current_pos();
    let base = match stream.peek() {
        Some(Token::Ident(name)) => {
            stream.advance();
            TypeExpr::new(TypeExprKind::Named(name.to_string()), stream.span_from(start))
        }
        Some(Token::Lt) => {
            stream.advance();
            let name = match stream.peek() {
                Some(Token::Ident(name)) => {
                    stream.advance();
                    name.to_string()
                }
                other => {
                    let span = stream.current_span();
                    stream.error(ParseError::unexpected_token(other, "in generic type", span));
                    String::new()
                }
            };
            let bound = stream
                .eat(&Token::Extends)
                .then(|| Box::new(parse_type_expr(stream)));
            stream.expect(Token::Gt);
            TypeExpr::new(TypeExprKind::Generic { name, bound }, stream.span_from(start))
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_type_expr(stream);
            stream.expect(Token::RParen);
            TypeExpr::new(inner.kind, stream.span_from(start))
        }
        other => {
            let span = stream.current_span();
            stream.error(ParseError::unexpected_token(other, "where a type was expected", span));
            return TypeExpr::new(TypeExprKind::Missing, stream.span_from(start));
        }
    };

    let mut ty = base;
    while stream.check(&Token::LBracket) && matches!(stream.peek_nth(1), Some(Token::RBracket)) {
        stream.advance();
        stream.advance();
        ty = TypeExpr::new(TypeExprKind::Array(Box::new(ty)), stream.span_from(start));
    }
    ty
}

/// Whether the tokens after an opening `(` form `Type) operand`.
///
/// Used to tell a cast `(Policy) this` from a parenthesised expression.
pub(super) fn is_cast_ahead(stream: &TokenStream) -> bool {
    if !matches!(stream.peek(), Some(Token::Ident(_)) | Some(Token::Lt)) {
        return false;
    }
    let mut offset = 0;
    loop {
        match stream.peek_nth(offset) {
            Some(
                Token::Ident(_)
                | Token::LBracket
                | Token::RBracket
                | Token::Pipe
                | Token::Lt
                | Token::Gt
                | Token::Extends,
            ) => offset += 1,
            Some(Token::RParen) => break,
            _ => return false,
        }
    }
    matches!(
        stream.peek_nth(offset + 1),
        Some(
            Token::Ident(_)
                | Token::This
                | Token::Number(_)
                | Token::String(_)
                | Token::Date(_)
                | Token::DateTime(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::LParen
                | Token::LBrace
        )
    )
}
