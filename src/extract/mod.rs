pub mod line_index;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

pub use line_index::LineIndex;

/// `type Name {` or `extend type Name {` followed by everything up to the first `}`.
/// Braces are not balanced: a nested `{ }` inside the body ends it early.
static TYPE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(extend\s+)?type\s+(\w+)\s*\{([^}]*)\}?").expect("type block pattern")
});

/// Types and fields declared by a single schema file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFile {
    pub types: BTreeSet<String>,
    pub fields: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaFile {
    pub fn declares(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.values().map(|f| f.len()).sum()
    }
}

/// A `type` / `extend type` block found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBlock<'a> {
    pub name: &'a str,
    pub is_extension: bool,
    /// Byte range of the whole match, from `type`/`extend` to the closing brace
    pub span: Range<usize>,
    /// Byte offset of the body, just after `{`
    pub body_start: usize,
    pub body: &'a str,
}

/// A field line found inside a type body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl<'a> {
    pub name: &'a str,
    /// Byte range of the field identifier, relative to the body
    pub span: Range<usize>,
}

/// Iterate over every type block in `content`, in source order
pub fn type_blocks(content: &str) -> impl Iterator<Item = TypeBlock<'_>> {
    TYPE_BLOCK.captures_iter(content).filter_map(|caps| {
        let whole = caps.get(0)?;
        let name = caps.get(2)?;
        let body = caps.get(3)?;
        Some(TypeBlock {
            name: name.as_str(),
            is_extension: caps.get(1).is_some(),
            span: whole.range(),
            body_start: body.start(),
            body: body.as_str(),
        })
    })
}

/// Regex extractor for one indentation width
#[derive(Debug, Clone)]
pub struct SchemaExtractor {
    tab_size: usize,
    field_line: Regex,
}

impl SchemaExtractor {
    pub fn new(tab_size: usize) -> Self {
        let pattern = format!(r"(?m)^(?: {{{}}}|\t)(\w+)[ \t]*[:(]", tab_size);
        let field_line = Regex::new(&pattern).expect("field line pattern");
        Self {
            tab_size,
            field_line,
        }
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Field declarations directly inside a type body
    pub fn fields_in<'a>(&'a self, body: &'a str) -> impl Iterator<Item = FieldDecl<'a>> + 'a {
        self.field_line.captures_iter(body).filter_map(|caps| {
            let name = caps.get(1)?;
            Some(FieldDecl {
                name: name.as_str(),
                span: name.range(),
            })
        })
    }

    /// Extract the type set and field map of a whole file
    pub fn extract(&self, content: &str) -> SchemaFile {
        let mut file = SchemaFile::default();

        for block in type_blocks(content) {
            file.types.insert(block.name.to_string());
            let fields = file.fields.entry(block.name.to_string()).or_default();
            for field in self.fields_in(block.body) {
                fields.insert(field.name.to_string());
            }
        }

        file
    }
}

impl Default for SchemaExtractor {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_blocks_report_spans() {
        let content = "type A {\n  id: ID\n}\nextend type A { x: Int }";
        let blocks: Vec<_> = type_blocks(content).collect();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "A");
        assert!(!blocks[0].is_extension);
        assert_eq!(blocks[0].span, 0..19);
        assert_eq!(blocks[0].body, "\n  id: ID\n");
        assert_eq!(blocks[0].body_start, 8);
        assert!(blocks[1].is_extension);
        assert_eq!(blocks[1].span.start, content.find("extend").unwrap());
    }

    #[test]
    fn test_prefixed_words_are_not_type_keywords() {
        let blocks: Vec<_> = type_blocks("subtype Foo {\n  a: Int\n}").collect();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_unterminated_block_runs_to_end() {
        let extractor = SchemaExtractor::default();
        let file = extractor.extract("type Open {\n  a: Int\n  b: Int\n");

        assert!(file.declares("Open"));
        assert_eq!(file.fields["Open"].len(), 2);
    }
}
