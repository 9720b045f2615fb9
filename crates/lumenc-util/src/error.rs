//! Shared error-reporting conventions.
//!
//! Every pipeline stage defines its own `thiserror`-derived error enum (see
//! `lumenc-lex::LexError`, `lumenc-par::ParseError`, `lumenc-sem::TypeError`,
//! `lumenc-gen::CodegenError`). This module only carries the one piece of
//! behavior they all share: rendering to the single human-readable
//! diagnostic line the driver prints on failure — no multi-line rendering,
//! no source snippets.

use crate::span::Span;
use std::fmt;

/// A stage error that knows where in the source it occurred.
///
/// Implemented by each stage's error enum so the driver can format a
/// uniform `error: <message> (line <n>, column <n>)` line regardless of
/// which stage produced the failure.
pub trait Located: fmt::Display {
    fn span(&self) -> Span;
}

/// Formats the single diagnostic line the driver writes to stderr.
pub fn diagnostic_line(err: &impl Located) -> String {
    let span = err.span();
    if span.line == 0 {
        format!("error: {err}")
    } else {
        format!("error: {err} (line {}, column {})", span.line, span.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake(Span);

    impl fmt::Display for Fake {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl Located for Fake {
        fn span(&self) -> Span {
            self.0
        }
    }

    #[test]
    fn dummy_span_omits_location() {
        let line = diagnostic_line(&Fake(Span::DUMMY));
        assert_eq!(line, "error: boom");
    }

    #[test]
    fn real_span_includes_location() {
        let line = diagnostic_line(&Fake(Span::point(4, 2)));
        assert_eq!(line, "error: boom (line 4, column 2)");
    }
}
