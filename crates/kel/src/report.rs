//! Human-readable rendering of diagnostics.
//!
//! - `DiagnosticFormatter` - formats diagnostics with the offending source line
//!
//! ```text
//! error: unresolved reference: unresolved reference 'Policu'; did you mean 'Policy'?
//!   --> expression:1:1
//!    |
//!   1 | Policu.state
//!    | ^^^^^^
//! ```

use kel_ast::SourceText;
use kel_resolve::Diagnostic;

/// Formats diagnostics against the expression they were produced for.
pub struct DiagnosticFormatter<'a> {
    source: &'a SourceText,
    origin: &'a str,
}

impl<'a> DiagnosticFormatter<'a> {
    /// Creates a formatter; `origin` labels the location line
    /// (a file name, or `expression` for inline text).
    pub fn new(source: &'a SourceText, origin: &'a str) -> Self {
        Self { source, origin }
    }

    /// Formats one diagnostic with its source line and underline.
    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}: {}: {}\n",
            diagnostic.severity,
            diagnostic.kind.name(),
            diagnostic.message
        ));

        if let Some(span) = diagnostic.span {
            let (line, col) = self.source.line_col(span.start);
            output.push_str(&format!("  --> {}:{}:{}\n", self.origin, line, col));

            if let Some(source_line) = self.source.line_text(line) {
                output.push_str("   |\n");
                output.push_str(&format!("{:3} | {}\n", line, source_line));

                let start_col = col as usize;
                let end_col = (start_col + span.len() as usize).min(source_line.len() + 1);
                let underline = " ".repeat(start_col.saturating_sub(1))
                    + &"^".repeat(end_col.saturating_sub(start_col).max(1));
                output.push_str(&format!("   | {}\n", underline));
            }
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("   = note: {}\n", note));
        }

        output
    }

    /// Formats several diagnostics separated by blank lines.
    pub fn format_all(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|d| self.format(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
