use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LensError, Result};

/// Name of the optional config file looked up at the workspace root
pub const CONFIG_FILE_NAME: &str = "graphql-lens.config.json";

const DEFAULT_GRAPHQL_FOLDER: &str = "src";
const DEFAULT_SCHEMA_FOLDER: &str = "src/graphql/schema";
const DEFAULT_TAB_SIZE: usize = 2;

/// graphql-lens.config.json structure; every key is optional
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    graphql_folder: String,
    schema_folder: String,
    tab_size: usize,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            graphql_folder: DEFAULT_GRAPHQL_FOLDER.to_string(),
            schema_folder: DEFAULT_SCHEMA_FOLDER.to_string(),
            tab_size: DEFAULT_TAB_SIZE,
        }
    }
}

/// Resolved workspace configuration
#[derive(Debug, Clone)]
pub struct LensConfig {
    pub root_dir: PathBuf,
    /// Folder scanned for `.gql` schema files and resolver sources, relative to the root
    pub graphql_folder: PathBuf,
    /// Folder new type files are scaffolded under, relative to the root
    pub schema_folder: PathBuf,
    /// Indentation width a field line must start with
    pub tab_size: usize,
}

impl LensConfig {
    /// Discover configuration for a workspace root
    pub fn discover(root: &Path) -> Result<Self> {
        let root_dir = root
            .canonicalize()
            .map_err(|_| LensError::NoWorkspace(root.to_path_buf()))?;
        if !root_dir.is_dir() {
            return Err(LensError::NoWorkspace(root_dir));
        }

        let config_path = root_dir.join(CONFIG_FILE_NAME);
        let file = if config_path.exists() {
            debug!("Found {} at {:?}", CONFIG_FILE_NAME, config_path);
            let content = fs::read_to_string(&config_path)
                .map_err(|e| LensError::read(&config_path, e))?;
            serde_json::from_str(&content).map_err(|source| LensError::Config {
                path: config_path.clone(),
                source,
            })?
        } else {
            debug!("No {} found, using defaults", CONFIG_FILE_NAME);
            ConfigFile::default()
        };

        Self::from_file(root_dir, file)
    }

    /// Configuration with every default applied
    pub fn with_defaults(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            graphql_folder: PathBuf::from(DEFAULT_GRAPHQL_FOLDER),
            schema_folder: PathBuf::from(DEFAULT_SCHEMA_FOLDER),
            tab_size: DEFAULT_TAB_SIZE,
        }
    }

    fn from_file(root_dir: PathBuf, file: ConfigFile) -> Result<Self> {
        if file.tab_size == 0 {
            return Err(LensError::InvalidConfig(
                "tabSize must be at least 1".to_string(),
            ));
        }

        Ok(LensConfig {
            root_dir,
            graphql_folder: PathBuf::from(trim_folder(&file.graphql_folder)),
            schema_folder: PathBuf::from(trim_folder(&file.schema_folder)),
            tab_size: file.tab_size,
        })
    }

    /// Absolute folder holding schema files and resolvers
    pub fn graphql_root(&self) -> PathBuf {
        self.root_dir.join(&self.graphql_folder)
    }

    /// Absolute folder new type files are written to
    pub fn types_folder(&self) -> PathBuf {
        self.root_dir.join(&self.schema_folder).join("types")
    }
}

fn trim_folder(folder: &str) -> &str {
    let trimmed = folder.trim_end_matches('/');
    if trimmed.is_empty() {
        "."
    } else {
        trimmed
    }
}
