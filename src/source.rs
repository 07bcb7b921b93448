use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use walkdir::{DirEntry, WalkDir};

use crate::error::{LensError, Result};

/// Where schema and resolver files come from
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// List every file whose extension is one of `extensions`, sorted by path
    async fn list_files(&self, extensions: &[&str]) -> Result<Vec<PathBuf>>;

    /// Read the full text of a file
    async fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Files on disk below a root folder
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SchemaSource for FsSource {
    async fn list_files(&self, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
        tokio::task::spawn_blocking(move || walk_files(&root, &extensions)).await?
    }

    async fn read_to_string(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LensError::read(path, e))
    }
}

fn walk_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored_entry(entry));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_ignored_entry(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && is_ignored_name(&entry.file_name().to_string_lossy())
}

/// Directory names never scanned or watched
pub fn is_ignored_name(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules"
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.as_ref() == ext))
        .unwrap_or(false)
}

/// Files held in memory, for hosts that own the buffers
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<BTreeMap<PathBuf, String>>,
    list_calls: AtomicUsize,
    reads: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.write().insert(path.into(), content.into());
    }

    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.write().remove(path)
    }

    /// Number of `list_files` calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `read_to_string` calls served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaSource for MemorySource {
    async fn list_files(&self, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .files
            .read()
            .keys()
            .filter(|path| has_extension(path, extensions))
            .cloned()
            .collect())
    }

    async fn read_to_string(&self, path: &Path) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files.read().get(path).cloned().ok_or_else(|| {
            LensError::read(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory source"),
            )
        })
    }
}
