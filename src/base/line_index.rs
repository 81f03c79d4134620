//! Source text positions and line/column conversion.

use std::fmt;

use text_size::TextSize;
use thiserror::Error;

/// A line and column position in source text.
///
/// Both line and column are 0-indexed internally, but displayed as 1-indexed.
/// Columns are measured in UTF-8 bytes, not characters.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes, not characters)
    pub col: u32,
}

impl LineCol {
    /// Create a new LineCol position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create from a 1-indexed line and column, as used at the
    /// evaluation-engine boundary.
    #[inline]
    pub const fn from_one_based(line: u32, col: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            col: col.saturating_sub(1),
        }
    }

    /// Get the 1-indexed (line, column) pair for the engine boundary and
    /// for display.
    #[inline]
    pub const fn to_one_based(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = self.to_one_based();
        write!(f, "{line}:{col}")
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = self.to_one_based();
        write!(f, "{line}:{col}")
    }
}

/// An out-of-range position or offset.
///
/// The index never clamps: a query past the end of the text (or past the
/// end of a line) is an error the caller has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The requested byte offset lies past the end of the text.
    #[error("offset {offset} is past the end of the text (length {len})")]
    OffsetOutOfBounds { offset: u32, len: u32 },

    /// The requested line does not exist.
    #[error("line {line} is past the end of the text ({line_count} lines)")]
    LineOutOfBounds { line: u32, line_count: u32 },

    /// The requested column lies past the end of its line.
    #[error("column {col} is past the end of line {line} (length {line_len})")]
    ColumnOutOfBounds { line: u32, col: u32, line_len: u32 },
}

/// Index for converting between byte offsets and line/column positions.
///
/// Built once per document version from the full source text. Handles both
/// bare-`\n` and `\r\n` line endings (a line starts after each `\n`; any
/// `\r` belongs to the line it terminates).
///
/// `offset_to_position` and `position_to_offset` are exact inverses for
/// every in-range input.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. Always non-empty: line 0
    /// starts at offset 0.
    line_starts: Vec<TextSize>,
    /// Total length of the indexed text, in bytes.
    len: TextSize,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a line/column position.
    ///
    /// The offset one past the end of the text is valid (it addresses the
    /// end-of-file insertion point); anything beyond is an error.
    pub fn offset_to_position(&self, offset: TextSize) -> Result<LineCol, PositionError> {
        if offset > self.len {
            return Err(PositionError::OffsetOutOfBounds {
                offset: offset.into(),
                len: self.len.into(),
            });
        }

        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = self.line_starts[line];
        let col = offset - line_start;

        Ok(LineCol {
            line: line as u32,
            col: col.into(),
        })
    }

    /// Convert a line/column position to a byte offset.
    ///
    /// A column may address any byte of its line, including the line's
    /// terminating `\n`; on the final line it may additionally address the
    /// end-of-file insertion point. A column that would land on the next
    /// line (or a line the text does not have) is an error, so that this
    /// method stays an exact inverse of [`Self::offset_to_position`].
    pub fn position_to_offset(&self, position: LineCol) -> Result<TextSize, PositionError> {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return Err(PositionError::LineOutOfBounds {
                line: position.line,
                line_count: self.line_starts.len() as u32,
            });
        }

        let line_start = self.line_starts[line];
        let is_last_line = line + 1 == self.line_starts.len();
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.len);
        // On terminated lines the last addressable column is the `\n`
        // itself; offsets at `line_end` belong to the next line.
        let line_len = u32::from(line_end - line_start) - if is_last_line { 0 } else { 1 };

        if position.col > line_len {
            return Err(PositionError::ColumnOutOfBounds {
                line: position.line,
                col: position.col,
                line_len,
            });
        }

        Ok(line_start + TextSize::from(position.col))
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Total length of the indexed text, in bytes.
    pub fn len(&self) -> TextSize {
        self.len
    }

    /// Check whether the indexed text is empty.
    pub fn is_empty(&self) -> bool {
        self.len == TextSize::from(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_display() {
        assert_eq!(format!("{}", LineCol::new(0, 0)), "1:1");
        assert_eq!(format!("{}", LineCol::new(5, 10)), "6:11");
    }

    #[test]
    fn line_col_one_based_round_trip() {
        let pos = LineCol::from_one_based(1, 1);
        assert_eq!(pos, LineCol::new(0, 0));
        assert_eq!(pos.to_one_based(), (1, 1));
    }

    #[test]
    fn single_line() {
        let index = LineIndex::new("hello world");

        assert_eq!(
            index.offset_to_position(TextSize::from(0)),
            Ok(LineCol::new(0, 0))
        );
        assert_eq!(
            index.offset_to_position(TextSize::from(5)),
            Ok(LineCol::new(0, 5))
        );
    }

    #[test]
    fn multi_line() {
        let index = LineIndex::new("hello\nworld\n!");

        assert_eq!(
            index.offset_to_position(TextSize::from(6)),
            Ok(LineCol::new(1, 0))
        );
        assert_eq!(
            index.offset_to_position(TextSize::from(11)),
            Ok(LineCol::new(1, 5))
        );
        assert_eq!(
            index.offset_to_position(TextSize::from(12)),
            Ok(LineCol::new(2, 0))
        );
    }

    #[test]
    fn crlf_line_endings() {
        let index = LineIndex::new("ab\r\ncd");

        // The \r belongs to line 0; line 1 starts after the \n.
        assert_eq!(
            index.offset_to_position(TextSize::from(2)),
            Ok(LineCol::new(0, 2))
        );
        assert_eq!(
            index.offset_to_position(TextSize::from(4)),
            Ok(LineCol::new(1, 0))
        );
        assert_eq!(
            index.position_to_offset(LineCol::new(1, 0)),
            Ok(TextSize::from(4))
        );
    }

    #[test]
    fn round_trip_every_offset() {
        let text = "one\ntwo\r\nthree\n\nfour";
        let index = LineIndex::new(text);

        for offset in 0..=text.len() as u32 {
            let offset = TextSize::from(offset);
            let pos = index.offset_to_position(offset).unwrap();
            assert_eq!(index.position_to_offset(pos), Ok(offset));
        }
    }

    #[test]
    fn round_trip_every_position() {
        let text = "one\ntwo\r\nthree";
        let index = LineIndex::new(text);

        for line in 0..index.line_count() as u32 {
            for col in 0..20u32 {
                let pos = LineCol::new(line, col);
                let Ok(offset) = index.position_to_offset(pos) else {
                    continue;
                };
                assert_eq!(index.offset_to_position(offset), Ok(pos));
            }
        }
    }

    #[test]
    fn offset_past_end_is_error() {
        let index = LineIndex::new("abc");

        assert_eq!(
            index.offset_to_position(TextSize::from(4)),
            Err(PositionError::OffsetOutOfBounds { offset: 4, len: 3 })
        );
    }

    #[test]
    fn line_past_end_is_error() {
        let index = LineIndex::new("abc\ndef");

        assert_eq!(
            index.position_to_offset(LineCol::new(2, 0)),
            Err(PositionError::LineOutOfBounds {
                line: 2,
                line_count: 2
            })
        );
    }

    #[test]
    fn column_past_end_of_line_is_error() {
        let index = LineIndex::new("ab\ncd");

        // Line 0 is "ab\n": columns 0..=2 are addressable (2 is the \n);
        // column 3 would land on the next line.
        assert_eq!(
            index.position_to_offset(LineCol::new(0, 2)),
            Ok(TextSize::from(2))
        );
        assert!(matches!(
            index.position_to_offset(LineCol::new(0, 3)),
            Err(PositionError::ColumnOutOfBounds { .. })
        ));

        // Line 1 is the last line: column 2 is the end-of-file point.
        assert_eq!(
            index.position_to_offset(LineCol::new(1, 2)),
            Ok(TextSize::from(5))
        );
        assert!(matches!(
            index.position_to_offset(LineCol::new(1, 3)),
            Err(PositionError::ColumnOutOfBounds { .. })
        ));
    }

    #[test]
    fn empty_text() {
        let index = LineIndex::new("");

        assert!(index.is_empty());
        assert_eq!(index.line_count(), 1);
        assert_eq!(
            index.offset_to_position(TextSize::from(0)),
            Ok(LineCol::new(0, 0))
        );
    }
}
