use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("No workspace folder is open: {0:?} is not a directory")]
    NoWorkspace(PathBuf),
    #[error("Failed to load config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to walk schema folder: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0:?} already exists")]
    AlreadyExists(PathBuf),
    #[error("Invalid type name: {0:?}")]
    InvalidTypeName(String),
}

impl LensError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LensError::Read {
            path: path.into(),
            source,
        }
    }

    /// True when a file read failed because the file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, LensError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, LensError>;
