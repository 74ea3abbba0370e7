//! Source location tracking for diagnostics and cursor queries.
//!
//! KEL expressions are short, single-source snippets, so a span is just a
//! byte range into the expression text. [`SourceText`] turns those ranges
//! back into human-readable line/column positions.
//!
//! # Examples
//!
//! ```
//! # use kel_ast::foundation::span::*;
//! let text = SourceText::new("Policy.riskItems\n  [0]");
//! let span = Span::new(7, 16);
//!
//! assert_eq!(text.snippet(&span), "riskItems");
//! assert_eq!(text.line_col(19), (2, 3));
//! ```

use serde::{Deserialize, Serialize};

/// Compact source location reference.
///
/// Points to a half-open byte range `[start, end)` in the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a zero-length span at `offset`.
    ///
    /// Used for syntactically absent constructs, which sit at their
    /// insertion point.
    pub fn point(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// Check if this span is zero-length.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Get the length of this span in bytes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Merge two spans (returns span covering both).
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Check whether a cursor offset touches this span.
    ///
    /// The end is inclusive: a cursor placed right after the last character
    /// of an identifier is still "on" that identifier.
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Expression text with a line index.
#[derive(Debug, Clone)]
pub struct SourceText {
    source: String,
    /// Byte offsets of each line start; `line_starts[0]` is always 0.
    line_starts: Vec<u32>,
}

impl SourceText {
    /// Index the given expression text.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = compute_line_starts(&source);
        Self {
            source,
            line_starts,
        }
    }

    /// The original text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Get the source snippet for a span.
    ///
    /// Spans outside the text, or not on a char boundary, yield `""`.
    pub fn snippet(&self, span: &Span) -> &str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    /// Get (line, column) for a byte offset. Both are 1-based.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        (line_idx as u32 + 1, offset - line_start + 1)
    }

    /// Text of a 1-based line, without its terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = match self.line_starts.get(idx + 1) {
            Some(next) => *next as usize - 1,
            None => self.source.len(),
        };
        self.source
            .get(start..end)
            .map(|text| text.trim_end_matches('\r'))
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            starts.push(idx as u32 + 1);
        }
    }
    starts
}
