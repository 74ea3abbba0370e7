//! Token stream wrapper for hand-written parser.

use kel_ast::foundation::Span;
use kel_lexer::Token;
use std::ops::Range;

use super::ParseError;

/// Token stream with lookahead, position tracking and an error sink.
///
/// Each token is paired with its byte span from the source. Parse functions
/// never abort: they record a [`ParseError`] here and return a recovery
/// expression instead.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream from tokens with their byte spans.
    pub fn new(tokens: &'src [(Token, Range<usize>)]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token.
    pub fn check(&self, expected: &Token) -> bool {
        let expected = std::mem::discriminant(expected);
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == expected)
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    ///
    /// On mismatch the token is left in place and an error is recorded.
    pub fn expect(&mut self, expected: Token) -> bool {
        if self.eat(&expected) {
            return true;
        }
        let error = ParseError::expected_token(expected, self.peek().cloned(), self.current_span());
        self.errors.push(error);
        false
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Get the current position in the token stream.
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span from the start of the token at `start` to the end of the last
    /// consumed token.
    ///
    /// If nothing was consumed since `start`, the result is a zero-width span
    /// at the insertion point.
    pub fn span_from(&self, start: usize) -> Span {
        if start >= self.pos {
            return Span::point(self.insertion_point());
        }
        let start_byte = self.tokens.get(start).map(|(_, span)| span.start).unwrap_or(0);
        Span::new(start_byte as u32, self.insertion_point())
    }

    /// Get a span for the current token, or a point at the end of input.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => Span::new(span.start as u32, span.end as u32),
            None => Span::point(self.insertion_point()),
        }
    }

    /// Byte offset right after the last consumed token.
    ///
    /// Missing constructs are placed here, so a cursor at the end of
    /// `Policy.` lands on the missing property.
    pub fn insertion_point(&self) -> u32 {
        self.pos
            .checked_sub(1)
            .and_then(|last| self.tokens.get(last))
            .map(|(_, span)| span.end as u32)
            .unwrap_or(0)
    }

    /// Record a parse error.
    pub fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Take the recorded errors.
    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }
}
