use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LensError, Result};
use crate::extract::{type_blocks, LineIndex};
use crate::index::SchemaIndex;

/// Extensions searched for resolver implementations
pub const RESOLVER_EXTENSIONS: &[&str] = &["ts", "js"];

/// A match inside a file, ready for an editor to jump to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub offset: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    fn new(path: &Path, content: &str, range: Range<usize>) -> Self {
        let (line, column) = LineIndex::new(content).line_col(range.start);
        Self {
            path: path.to_path_buf(),
            offset: range.start,
            end: range.end,
            line,
            column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

/// Location of the first `type T {` or `extend type T {` header in the file that declares T
pub async fn find_type(index: &SchemaIndex, type_name: &str) -> Result<Option<Location>> {
    let Some(path) = index.locate_file(type_name).await? else {
        return Ok(None);
    };

    let content = index.source().read_to_string(&path).await?;
    let found = type_blocks(&content)
        .find(|block| block.name == type_name)
        .map(|block| Location::new(&path, &content, block.span.start..block.body_start));
    Ok(found)
}

/// Location of the first field line declaring `field_name` inside a block of `type_name`
pub async fn find_field(
    index: &SchemaIndex,
    type_name: &str,
    field_name: &str,
) -> Result<Option<Location>> {
    for path in index.files_declaring(type_name).await? {
        let content = index.source().read_to_string(&path).await?;
        for block in type_blocks(&content).filter(|b| b.name == type_name) {
            let found = index
                .extractor()
                .fields_in(block.body)
                .find(|field| field.name == field_name);
            if let Some(field) = found {
                let start = block.body_start + field.span.start;
                let end = block.body_start + field.span.end;
                return Ok(Some(Location::new(&path, &content, start..end)));
            }
        }
    }

    debug!("Field {} not found in type {}", field_name, type_name);
    Ok(None)
}

/// Location of a resolver implementation such as `Query: { products(` in `.ts`/`.js` sources
pub async fn find_resolver(
    index: &SchemaIndex,
    type_name: &str,
    field_name: &str,
) -> Result<Option<Location>> {
    let pattern = resolver_pattern(type_name, field_name)?;

    for path in index.source().list_files(RESOLVER_EXTENSIONS).await? {
        let content = index.source().read_to_string(&path).await?;
        if let Some(field) = pattern.captures(&content).and_then(|caps| caps.get(1)) {
            return Ok(Some(Location::new(&path, &content, field.range())));
        }
    }

    debug!("Resolver {}.{} not found", type_name, field_name);
    Ok(None)
}

fn resolver_pattern(type_name: &str, field_name: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?s)\b{}\s*:\s*\{{.*?\b(?:async\s+)?({})\b\s*[(:,]",
        regex::escape(type_name),
        regex::escape(field_name)
    );
    Regex::new(&pattern).map_err(|e| LensError::InvalidTypeName(format!("{}: {}", type_name, e)))
}
