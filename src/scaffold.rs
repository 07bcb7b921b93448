use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tracing::info;

use crate::config::LensConfig;
use crate::error::{LensError, Result};
use crate::index::SCHEMA_EXTENSION;

static TYPE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("type name pattern"));

/// Skeleton written for a new type
pub fn type_template(type_name: &str, tab_size: usize) -> String {
    format!(
        "type {} {{\n{}# Add fields here\n}}\n",
        type_name,
        " ".repeat(tab_size)
    )
}

/// Create `<schema folder>/types/<Type>.gql`; an existing file is never overwritten
pub async fn create_type_file(config: &LensConfig, type_name: &str) -> Result<PathBuf> {
    if !TYPE_NAME.is_match(type_name) {
        return Err(LensError::InvalidTypeName(type_name.to_string()));
    }

    let folder = config.types_folder();
    tokio::fs::create_dir_all(&folder).await?;

    let path = folder.join(format!("{}.{}", type_name, SCHEMA_EXTENSION));
    if tokio::fs::try_exists(&path).await? {
        return Err(LensError::AlreadyExists(path));
    }

    tokio::fs::write(&path, type_template(type_name, config.tab_size)).await?;
    info!("Created GraphQL type {} at {:?}", type_name, path);
    Ok(path)
}
