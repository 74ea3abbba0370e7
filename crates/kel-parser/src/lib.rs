//! Hand-written recursive descent parser for KEL
//!
//! Turns expression text into the untyped [`kel_ast::Expr`] tree, recovering
//! from every syntax problem so editor services always have a tree to work on.

pub mod parser;

pub use parser::{
    ParseError, ParseErrorKind, ParseOutput, parse, parse_expr, parse_expr_with_spans, parse_type,
};

// Re-export lexer
pub use kel_lexer::Token;
