//! Source location tracking.
//!
//! A [`Span`] identifies a byte range in one source file; a [`FileId`]
//! distinguishes files in case the driver is ever extended to accept more
//! than one (the current driver never constructs more than one, per the
//! single-file CLI contract).

/// Identifies a source file. The driver only ever allocates `FileId(0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    pub const DUMMY: FileId = FileId(0);
}

/// A byte range into a source buffer, with 1-based line/column for
/// human-readable diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
    pub file_id: FileId,
}

impl Span {
    pub const DUMMY: Span = Span {
        start: 0,
        end: 0,
        line: 0,
        column: 0,
        file_id: FileId::DUMMY,
    };

    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
            file_id: FileId::DUMMY,
        }
    }

    /// A zero-width span at a single point, used for synthesized diagnostics
    /// that don't originate from a specific slice of source.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(0, 0, line, column)
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_span_is_zero_width() {
        assert!(Span::DUMMY.is_empty());
    }

    #[test]
    fn point_span_carries_line_and_column_only() {
        let s = Span::point(3, 7);
        assert_eq!(s.line, 3);
        assert_eq!(s.column, 7);
        assert!(s.is_empty());
    }
}
