use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::LensConfig;
use crate::error::Result;
use crate::extract::{SchemaExtractor, SchemaFile};
use crate::source::{FsSource, SchemaSource};

/// Extension of schema files
pub const SCHEMA_EXTENSION: &str = "gql";

/// Indexed state of one schema file
#[derive(Debug, Clone, Default)]
pub struct FileEntry {
    pub schema: SchemaFile,
    /// Set when the latest re-scan of this file failed; `schema` is the last good content
    pub stale: bool,
}

/// Statistics about the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_types: usize,
    pub total_fields: usize,
    pub indexed_files: usize,
    pub stale_files: usize,
    pub last_updated: SystemTime,
}

/// Schema file -> declared types -> declared fields
#[derive(Clone)]
pub struct SchemaIndex {
    /// File path -> types and fields declared in that file
    files: Arc<DashMap<PathBuf, FileEntry, RandomState>>,

    /// Completed once the first full scan has been committed
    init: Arc<OnceCell<()>>,

    /// Held for every read-then-commit of file entries: the initial scan,
    /// each re-scan and each delete. Waiters are served in arrival order.
    writes: Arc<Mutex<()>>,

    source: Arc<dyn SchemaSource>,
    extractor: Arc<SchemaExtractor>,

    /// Statistics
    stats: Arc<parking_lot::RwLock<IndexStats>>,
}

impl SchemaIndex {
    /// Create a new, uninitialized index
    pub fn new(source: Arc<dyn SchemaSource>, tab_size: usize) -> Self {
        Self {
            files: Arc::new(DashMap::with_hasher(RandomState::new())),
            init: Arc::new(OnceCell::new()),
            writes: Arc::new(Mutex::new(())),
            source,
            extractor: Arc::new(SchemaExtractor::new(tab_size)),
            stats: Arc::new(parking_lot::RwLock::new(IndexStats {
                total_types: 0,
                total_fields: 0,
                indexed_files: 0,
                stale_files: 0,
                last_updated: SystemTime::now(),
            })),
        }
    }

    /// Index over the configured graphql folder on disk
    pub fn for_config(config: &LensConfig) -> Self {
        let source = Arc::new(FsSource::new(config.graphql_root()));
        Self::new(source, config.tab_size)
    }

    pub fn source(&self) -> &Arc<dyn SchemaSource> {
        &self.source
    }

    pub fn extractor(&self) -> &SchemaExtractor {
        &self.extractor
    }

    /// Whether the initial full scan has completed
    pub fn is_ready(&self) -> bool {
        self.init.initialized()
    }

    /// Run the initial full scan, or wait for the one already in flight
    pub async fn ensure_initialized(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| self.scan_all())
            .await
            .map(|_| ())
    }

    async fn scan_all(&self) -> Result<()> {
        // Events arriving mid-scan queue here and apply on top of the snapshot
        let _writes = self.writes.lock().await;

        let files = self.source.list_files(&[SCHEMA_EXTENSION]).await?;
        info!("Building schema index from {} files", files.len());

        let mut scans = JoinSet::new();
        for path in files {
            let source = self.source.clone();
            let extractor = self.extractor.clone();
            scans.spawn(async move {
                let content = source.read_to_string(&path).await?;
                let schema = extractor.extract(&content);
                Ok::<_, crate::error::LensError>((path, schema))
            });
        }

        // Nothing is committed until every file has been read
        let mut scanned = Vec::new();
        while let Some(joined) = scans.join_next().await {
            scanned.push(joined??);
        }

        for (path, schema) in scanned {
            debug!("Indexed {:?}: {} types", path, schema.types.len());
            self.files.insert(path, FileEntry { schema, stale: false });
        }

        self.refresh_stats();
        let stats = self.stats();
        info!(
            "Schema index built: {} types, {} fields in {} files",
            stats.total_types, stats.total_fields, stats.indexed_files
        );
        Ok(())
    }

    /// All type names across tracked files, sorted and deduplicated
    pub async fn list_type_names(&self) -> Result<Vec<String>> {
        self.ensure_initialized().await?;
        Ok(self.type_names().into_iter().collect())
    }

    /// All fields of a type across every file declaring it, sorted and deduplicated
    pub async fn list_fields(&self, type_name: &str) -> Result<Vec<String>> {
        self.ensure_initialized().await?;
        debug!("Listing fields of {}", type_name);

        let mut fields = BTreeSet::new();
        for entry in self.files.iter() {
            if let Some(declared) = entry.value().schema.fields.get(type_name) {
                fields.extend(declared.iter().cloned());
            }
        }
        Ok(fields.into_iter().collect())
    }

    /// One file declaring the type; the smallest path wins when several do
    pub async fn locate_file(&self, type_name: &str) -> Result<Option<PathBuf>> {
        Ok(self.files_declaring(type_name).await?.into_iter().next())
    }

    /// Every tracked file declaring the type, sorted by path
    pub async fn files_declaring(&self, type_name: &str) -> Result<Vec<PathBuf>> {
        self.ensure_initialized().await?;
        let mut paths: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|entry| entry.value().schema.declares(type_name))
            .map(|entry| entry.key().clone())
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Re-scan a file after it changed on disk
    pub async fn notify_changed(&self, path: &Path) -> Result<()> {
        self.rescan_file(path).await
    }

    /// Scan a newly created file
    pub async fn notify_created(&self, path: &Path) -> Result<()> {
        self.rescan_file(path).await
    }

    /// Drop a deleted file; unknown paths are ignored
    pub async fn notify_deleted(&self, path: &Path) {
        let _writes = self.writes.lock().await;
        if self.files.remove(path).is_some() {
            debug!("Removed {:?} from index", path);
            self.refresh_stats();
        }
    }

    async fn rescan_file(&self, path: &Path) -> Result<()> {
        let _writes = self.writes.lock().await;
        debug!("Rescanning {:?}", path);

        let content = match self.source.read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                // Keep the last good entry but remember it no longer matches the file
                if let Some(mut entry) = self.files.get_mut(path) {
                    warn!("Keeping stale entry for {:?}", path);
                    entry.stale = true;
                }
                self.refresh_stats();
                return Err(e);
            }
        };

        let schema = self.extractor.extract(&content);
        self.files
            .insert(path.to_path_buf(), FileEntry { schema, stale: false });
        self.refresh_stats();
        Ok(())
    }

    /// Sorted list of tracked files
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Indexed state of one file, if tracked
    pub fn file_entry(&self, path: &Path) -> Option<FileEntry> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    /// Files whose latest re-scan failed
    pub fn stale_files(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|entry| entry.value().stale)
            .map(|entry| entry.key().clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn is_stale(&self, path: &Path) -> bool {
        self.files.get(path).map(|e| e.stale).unwrap_or(false)
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        self.stats.read().clone()
    }

    fn type_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for entry in self.files.iter() {
            names.extend(entry.value().schema.types.iter().cloned());
        }
        names
    }

    fn refresh_stats(&self) {
        let mut stats = self.stats.write();

        let mut total_fields = 0;
        let mut stale_files = 0;
        for entry in self.files.iter() {
            total_fields += entry.value().schema.field_count();
            if entry.value().stale {
                stale_files += 1;
            }
        }
        stats.total_types = self.type_names().len();
        stats.total_fields = total_fields;
        stats.indexed_files = self.files.len();
        stats.stale_files = stale_files;
        stats.last_updated = SystemTime::now();
    }
}
