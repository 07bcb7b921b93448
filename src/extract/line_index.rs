/// Helper to convert byte offsets to line and column numbers
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Create a new LineIndex from source text
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    /// Get line number (1-based) for a byte offset
    pub fn line_number(&self, offset: usize) -> usize {
        self.line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1))
            + 1
    }

    /// Get (line, column), both 1-based, for a byte offset. Columns count characters.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_number(offset);
        let line_start = self.line_starts[line - 1];
        let end = offset.min(self.source.len());
        let column = self
            .source
            .get(line_start..end)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(end - line_start);
        (line, column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers() {
        let index = LineIndex::new("type A {\n  id: ID\n}\n");

        assert_eq!(index.line_number(0), 1);
        assert_eq!(index.line_number(8), 1);
        assert_eq!(index.line_number(9), 2);
        assert_eq!(index.line_number(19), 3);
    }

    #[test]
    fn test_columns_count_characters() {
        let source = "# é\n  name: String";
        let index = LineIndex::new(source);

        let offset = source.find("name").unwrap();
        assert_eq!(index.line_col(offset), (2, 3));
        assert_eq!(index.line_col(source.find('é').unwrap() + 2), (1, 4));
    }
}
