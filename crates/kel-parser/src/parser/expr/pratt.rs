//! Pratt parser core - precedence climbing for binary, prefix and postfix operators.

use kel_ast::{BinaryOp, Expr, ExprKind, Span, UnaryOp};
use kel_lexer::Token;

use super::super::{ParseError, TokenStream, types};
use super::{atoms, special};

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Precedence of `instanceof` / `typeof`, which take a type on the right.
const TYPE_TEST_PREC: u8 = 30;

/// Get binary operator metadata (precedence, associativity, and operator enum).
///
/// Higher precedence binds tighter.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Or | Token::PipePipe => Some((10, Assoc::Left, BinaryOp::Or)),
        Token::And | Token::AmpAmp => Some((20, Assoc::Left, BinaryOp::And)),
        Token::Eq | Token::EqEq => Some((30, Assoc::Left, BinaryOp::Eq)),
        Token::BangEq => Some((30, Assoc::Left, BinaryOp::Ne)),
        Token::Lt => Some((30, Assoc::Left, BinaryOp::Lt)),
        Token::LtEq => Some((30, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((30, Assoc::Left, BinaryOp::Gt)),
        Token::GtEq => Some((30, Assoc::Left, BinaryOp::Ge)),
        Token::In => Some((30, Assoc::Left, BinaryOp::In)),
        Token::Matches => Some((30, Assoc::Left, BinaryOp::Matches)),
        Token::Plus => Some((40, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((40, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((50, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((50, Assoc::Left, BinaryOp::Div)),
        Token::Percent => Some((50, Assoc::Left, BinaryOp::Mod)),
        Token::StarStar => Some((60, Assoc::Right, BinaryOp::Pow)),
        _ => None,
    }
}

/// Pratt parser - handles binary operators with precedence climbing.
pub(super) fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Expr {
    let mut left = parse_prefix(stream);

    while let Some(token) = stream.peek() {
        if matches!(token, Token::InstanceOf | Token::TypeOf) {
            if TYPE_TEST_PREC < min_prec {
                break;
            }
            stream.advance();
            let ty = types::parse_type_expr(stream);
            let span = left.span.merge(&ty.span);
            let value = Box::new(left);
            let kind = match token {
                Token::InstanceOf => ExprKind::InstanceOf { value, ty },
                _ => ExprKind::TypeOf { value, ty },
            };
            left = Expr::new(kind, span);
            continue;
        }

        let Some((prec, assoc, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        stream.advance();

        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let right = parse_pratt(stream, next_prec);
        left = Expr::binary(op, left, right);
    }

    left
}

/// Parse prefix expressions (unary operators, special forms, postfix chains).
pub(super) fn parse_prefix(stream: &mut TokenStream) -> Expr {
    match stream.peek() {
        Some(Token::Minus) | Some(Token::Not) | Some(Token::Bang) => parse_unary(stream),
        Some(Token::If) => special::parse_if(stream),
        Some(Token::For) | Some(Token::Some_) | Some(Token::Every) => {
            special::parse_iteration(stream)
        }
        Some(Token::Set) => special::parse_value_block(stream),
        _ => parse_postfix(stream),
    }
}

/// Parse unary operators.
fn parse_unary(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    let op = match stream.advance() {
        Some(Token::Minus) => UnaryOp::Neg,
        _ => UnaryOp::Not,
    };

    let operand = parse_prefix(stream);
    let span = stream.span_from(start);

    Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    )
}

/// Parse postfix chains: member access and bracket access.
fn parse_postfix(stream: &mut TokenStream) -> Expr {
    let mut expr = atoms::parse_atom(stream);

    loop {
        match stream.peek() {
            Some(Token::Dot) | Some(Token::QuestionDot) => {
                let null_safe = matches!(stream.advance(), Some(Token::QuestionDot));
                let property = parse_member(stream);
                let span = expr.span.merge(&property.span);
                expr = Expr::new(
                    ExprKind::Path {
                        object: Box::new(expr),
                        property: Box::new(property),
                        null_safe,
                    },
                    span,
                );
            }
            Some(Token::LBracket) | Some(Token::QuestionBracket) => {
                let explicit_filter = matches!(stream.advance(), Some(Token::QuestionBracket));
                let predicate = if stream.check(&Token::RBracket) {
                    let span = stream.current_span();
                    stream.error(ParseError::unexpected_token(
                        Some(&Token::RBracket),
                        "where an index or filter was expected",
                        span,
                    ));
                    Expr::missing(stream.insertion_point())
                } else {
                    super::parse_expr(stream)
                };
                stream.expect(Token::RBracket);
                let span = Span::new(expr.span.start, stream.insertion_point());
                expr = Expr::new(
                    ExprKind::Access {
                        collection: Box::new(expr),
                        predicate: Box::new(predicate),
                        explicit_filter,
                    },
                    span,
                );
            }
            _ => break,
        }
    }

    expr
}

/// Parse the member after `.`: an identifier, a keyword used as a name, or a
/// call. A missing member becomes `Missing` at the insertion point.
fn parse_member(stream: &mut TokenStream) -> Expr {
    let start = stream.current_pos();
    match stream.peek() {
        Some(Token::Ident(_)) if matches!(stream.peek_nth(1), Some(Token::LParen)) => {
            atoms::parse_call(stream)
        }
        Some(Token::Ident(name)) => {
            stream.advance();
            Expr::identifier(name.to_string(), stream.span_from(start))
        }
        Some(token) if token.keyword_text().is_some() => {
            let text = token.keyword_text().unwrap_or_default();
            stream.advance();
            Expr::identifier(text, stream.span_from(start))
        }
        other => {
            let span = stream.current_span();
            stream.error(ParseError::unexpected_token(other, "after '.'", span));
            Expr::missing(stream.insertion_point())
        }
    }
}
