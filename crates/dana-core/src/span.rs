use serde::{Deserialize, Serialize};

/// Source location in the original `.na` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start in the source.
    pub start: usize,
    /// Byte offset of the end (exclusive) in the source.
    pub end: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub col: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Self {
            start,
            end,
            line,
            col,
        }
    }

    pub fn dummy() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 0,
            col: 0,
        }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            col: if self.line <= other.line {
                self.col
            } else {
                other.col
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_picks_earliest_position() {
        let a = Span::new(10, 15, 3, 4);
        let b = Span::new(0, 5, 1, 1);
        let m = a.merge(b);
        assert_eq!(m.start, 0);
        assert_eq!(m.end, 15);
        assert_eq!(m.line, 1);
        assert_eq!(m.col, 1);
    }
}
