//! Expression parser.
//!
//! ## Precedence (lowest to highest)
//!
//! | level | operators                                                   |
//! |-------|-------------------------------------------------------------|
//! | 10    | `or` `\|\|`                                                 |
//! | 20    | `and` `&&`                                                  |
//! | 30    | `=` `==` `!=` `<` `<=` `>` `>=` `in` `matches` `instanceof` `typeof` |
//! | 40    | `+` `-`                                                     |
//! | 50    | `*` `/` `%`                                                 |
//! | 60    | `**` (right associative)                                    |
//!
//! Prefix forms (`not`, `-`, casts) bind tighter than any binary operator;
//! postfix access (`.`, `?.`, `[...]`, `?[...]`) binds tightest. `if`,
//! `for`/`some`/`every` and `set` extend as far right as possible.

mod atoms;
mod pratt;
mod special;

use kel_ast::Expr;

use super::{ParseError, TokenStream};

/// Parse a full expression.
pub(super) fn parse_expr(stream: &mut TokenStream) -> Expr {
    pratt::parse_pratt(stream, 0)
}

/// Parse a whole input: one expression, reporting anything left over.
pub(super) fn parse_root(stream: &mut TokenStream) -> Expr {
    if stream.at_end() {
        return Expr::missing(0);
    }
    let expr = parse_expr(stream);
    while let Some(token) = stream.peek() {
        let span = stream.current_span();
        stream.error(ParseError::unexpected_token(Some(token), "after expression", span));
        stream.advance();
    }
    expr
}
