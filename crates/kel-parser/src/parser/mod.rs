//! Hand-written recursive descent parser for KEL.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead and an error sink
//! - `error`: ParseError
//! - `expr`: Expression parser using Pratt parsing
//! - `types`: Type expressions for casts and `instanceof`
//!
//! ## Recovery
//!
//! Parsing always produces an expression. Problems are collected as
//! [`ParseError`]s alongside it, and the tree holds `Missing`/`Error`
//! placeholders where input was absent or unusable.
//!
//! ```rust,ignore
//! let output = parse("Policy.");
//! assert!(matches!(output.expr.kind, ExprKind::Path { .. }));
//! assert_eq!(output.errors.len(), 1);
//! ```

mod error;
mod expr;
mod stream;
mod types;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

use kel_ast::{Expr, TypeExpr};
use kel_lexer::Token;
use std::ops::Range;

/// An expression with the problems found while parsing it.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub expr: Expr,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Tokenize and parse expression text.
pub fn parse(source: &str) -> ParseOutput {
    let tokens = kel_lexer::tokenize(source);
    parse_expr_with_spans(&tokens)
}

/// Parse a sequence of tokens with byte spans into an expression.
///
/// Empty input yields a single `Missing` expression at offset 0.
pub fn parse_expr_with_spans(tokens: &[(Token, Range<usize>)]) -> ParseOutput {
    let mut stream = TokenStream::new(tokens);
    let expr = expr::parse_root(&mut stream);
    ParseOutput {
        expr,
        errors: stream.into_errors(),
    }
}

/// Parse expression text, failing on any syntax problem.
///
/// # Returns
/// - `Ok(Expr)` if parsing succeeds without recovery
/// - `Err(Vec<ParseError>)` otherwise
pub fn parse_expr(source: &str) -> Result<Expr, Vec<ParseError>> {
    let output = parse(source);
    if output.errors.is_empty() {
        Ok(output.expr)
    } else {
        Err(output.errors)
    }
}

/// Parse a standalone type expression such as `Vehicle[]` or `A | B`.
pub fn parse_type(source: &str) -> Result<TypeExpr, Vec<ParseError>> {
    let tokens = kel_lexer::tokenize(source);
    let mut stream = TokenStream::new(&tokens);
    let ty = types::parse_type_expr(&mut stream);
    if let Some(token) = stream.peek() {
        let span = stream.current_span();
        stream.error(ParseError::unexpected_token(Some(token), "after type", span));
    }
    let errors = stream.into_errors();
    if errors.is_empty() { Ok(ty) } else { Err(errors) }
}
