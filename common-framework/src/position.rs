/// A line/column location in source text.
///
/// Parses address their input by byte offset; this type is only built when
/// a diagnostic needs to be shown to a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number in characters (1-indexed)
    pub column: usize,
    /// Byte offset from the start of the input
    pub offset: usize,
}

impl Position {
    /// Creates a new position at the start of the input.
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Creates a position with the given values.
    pub fn at(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Locates a byte offset in `text`.
    ///
    /// Offsets past the end are clamped to the end of the text. An offset
    /// inside a multi-byte character counts as that character's column.
    pub fn locate(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let mut position = Self::new();
        for (index, ch) in text.char_indices() {
            if index >= offset {
                break;
            }
            if ch == '\n' {
                position.line += 1;
                position.column = 1;
            } else {
                position.column += 1;
            }
        }
        position.offset = offset;
        position
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_new() {
        let pos = Position::new();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_position_default() {
        let pos = Position::default();
        assert_eq!(pos, Position::new());
    }

    #[test]
    fn test_locate_first_line() {
        assert_eq!(Position::locate("hello", 3), Position::at(1, 4, 3));
    }

    #[test]
    fn test_locate_after_newline() {
        let text = "ab\ncd\nef";
        assert_eq!(Position::locate(text, 3), Position::at(2, 1, 3));
        assert_eq!(Position::locate(text, 7), Position::at(3, 2, 7));
    }

    #[test]
    fn test_locate_counts_characters() {
        // 'é' is two bytes wide but one column.
        assert_eq!(Position::locate("éa", 2), Position::at(1, 2, 2));
    }

    #[test]
    fn test_locate_clamps_to_end() {
        assert_eq!(Position::locate("ab", 10), Position::at(1, 3, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::at(4, 7, 30).to_string(), "4:7");
    }
}
