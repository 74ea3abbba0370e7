// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for KEL.
//!
//! This crate provides tokenization of KEL expressions using logos.
//!
//! # Design
//!
//! - `Token` - all KEL token types (keywords, operators, literals, identifiers)
//! - Whitespace is skipped; KEL has no comments
//! - [`tokenize`] never fails: text logos cannot match becomes
//!   [`Token::Unknown`], so the parser can turn it into an error node
//!
//! # Examples
//!
//! ```
//! # use kel_lexer::*;
//! let tokens: Vec<Token> = tokenize("Policy.riskItems[0]")
//!     .into_iter()
//!     .map(|(token, _)| token)
//!     .collect();
//! assert_eq!(tokens.len(), 6);
//! ```

use logos::Logos;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// KEL token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // === Keywords ===
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("in")]
    In,
    #[token("matches")]
    Matches,
    #[token("instanceof")]
    InstanceOf,
    #[token("typeof")]
    TypeOf,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("return")]
    Return,
    #[token("some")]
    Some_,
    #[token("every")]
    Every,
    #[token("satisfies")]
    Satisfies,
    #[token("set")]
    Set,
    #[token("to")]
    To,
    #[token("extends")]
    Extends,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token(".")]
    Dot,
    /// Null-safe access `?.`
    #[token("?.")]
    QuestionDot,
    /// Explicit filter `?[`
    #[token("?[")]
    QuestionBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("|")]
    Pipe,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Decimal literal (e.g. 42, 2.5)
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// Date literal `2020-01-01`
    #[regex(r"[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]", |lex| Rc::from(lex.slice()))]
    Date(Rc<str>),

    /// Date-time literal `2020-01-01T10:00:00Z`
    #[regex(
        r"[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T[0-9][0-9]:[0-9][0-9](:[0-9][0-9](\.[0-9]+)?)?(Z|[+-][0-9][0-9]:[0-9][0-9])?",
        |lex| Rc::from(lex.slice())
    )]
    DateTime(Rc<str>),

    /// String literal in single or double quotes, unescaped
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice()))]
    String(Rc<str>),

    /// Identifier (e.g. Policy, riskItems, Count)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),

    /// Text the lexer could not match; produced by [`tokenize`] only.
    Unknown(Rc<str>),
}

/// Strip quotes and unescape a string literal.
fn unquote(literal: &str) -> Option<Rc<str>> {
    let content = literal.get(1..literal.len().saturating_sub(1))?;
    unescape_string(content).map(|s| Rc::from(s.as_str()))
}

/// Unescape a string literal content.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                // Unsupported escape or trailing backslash
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

/// Tokenize `source`, pairing each token with its byte range.
///
/// Unmatched text is kept as [`Token::Unknown`] rather than dropped.
pub fn tokenize(source: &str) -> Vec<(Token, Range<usize>)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let token = result.unwrap_or_else(|_| Token::Unknown(Rc::from(lexer.slice())));
        tokens.push((token, lexer.span()));
    }
    tokens
}

impl Token {
    /// Source text of keyword tokens.
    ///
    /// Keywords may be used as member names after `.`.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::This => "this",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Not => "not",
            Token::And => "and",
            Token::Or => "or",
            Token::In => "in",
            Token::Matches => "matches",
            Token::InstanceOf => "instanceof",
            Token::TypeOf => "typeof",
            Token::If => "if",
            Token::Then => "then",
            Token::Else => "else",
            Token::For => "for",
            Token::Return => "return",
            Token::Some_ => "some",
            Token::Every => "every",
            Token::Satisfies => "satisfies",
            Token::Set => "set",
            Token::To => "to",
            Token::Extends => "extends",
            _ => return None,
        };
        Some(text)
    }

    fn symbol_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::StarStar => "**",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Eq => "=",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::Bang => "!",
            Token::Dot => ".",
            Token::QuestionDot => "?.",
            Token::QuestionBracket => "?[",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Pipe => "|",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Date(text) | Token::DateTime(text) => write!(f, "{}", text),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Ident(id) => write!(f, "{}", id),
            Token::Unknown(text) => write!(f, "{}", text),
            other => {
                let text = other
                    .keyword_text()
                    .or_else(|| other.symbol_text())
                    .unwrap_or_default();
                write!(f, "{}", text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().map(|(token, _)| token).collect()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(Rc::from(s))
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            lex("for v in items return v"),
            vec![
                Token::For,
                ident("v"),
                Token::In,
                ident("items"),
                Token::Return,
                ident("v"),
            ]
        );
        // Keyword prefixes are identifiers
        assert_eq!(lex("format settings"), vec![ident("format"), ident("settings")]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("a ** 2 != b?.c && !d"),
            vec![
                ident("a"),
                Token::StarStar,
                Token::Number(2.0),
                Token::BangEq,
                ident("b"),
                Token::QuestionDot,
                ident("c"),
                Token::AmpAmp,
                Token::Bang,
                ident("d"),
            ]
        );
        assert_eq!(lex("xs?[x]")[1], Token::QuestionBracket);
    }

    #[test]
    fn test_literals() {
        assert_eq!(lex("2.5"), vec![Token::Number(2.5)]);
        assert_eq!(lex("2020-01-01"), vec![Token::Date(Rc::from("2020-01-01"))]);
        assert_eq!(
            lex("2020-01-01T10:00:00Z"),
            vec![Token::DateTime(Rc::from("2020-01-01T10:00:00Z"))]
        );
        assert_eq!(lex(r#"'it\'s' "x""#), vec![
            Token::String(Rc::from("it's")),
            Token::String(Rc::from("x")),
        ]);
    }

    #[test]
    fn test_unknown_text_is_kept() {
        let tokens = tokenize("a # b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].0, Token::Unknown(Rc::from("#")));
        assert_eq!(tokens[1].1, 2..3);
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("Policy.riskItems");
        let spans: Vec<_> = tokens.into_iter().map(|(_, span)| span).collect();
        assert_eq!(spans, vec![0..6, 6..7, 7..16]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::QuestionBracket.to_string(), "?[");
        assert_eq!(Token::Satisfies.to_string(), "satisfies");
        assert_eq!(Token::String(Rc::from("x")).to_string(), "'x'");
    }
}
