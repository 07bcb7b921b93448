use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::index::{SchemaIndex, SCHEMA_EXTENSION};
use crate::source::is_ignored_name;

/// File watcher that monitors schema files and keeps the index in sync
pub struct FileWatcher {
    watch_root: PathBuf,
    index: SchemaIndex,
    watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<WatchEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    FileChanged(PathBuf),
    FileCreated(PathBuf),
    FileRemoved(PathBuf),
}

impl FileWatcher {
    /// Create a new file watcher
    pub fn new(watch_root: PathBuf, index: SchemaIndex) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let root = watch_root.clone();
        let watcher = RecommendedWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) => {
                    for watch_event in process_event(event, &root) {
                        let _ = tx.send(watch_event);
                    }
                }
                Err(e) => error!("Watch error: {}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        Ok(FileWatcher {
            watch_root,
            index,
            watcher,
            rx,
        })
    }

    /// Register the recursive watch; events are buffered until `run`
    pub fn watch(&mut self) -> Result<()> {
        self.watcher.watch(&self.watch_root, RecursiveMode::Recursive)?;
        info!("Started watching {:?} for schema changes", self.watch_root);
        Ok(())
    }

    /// Apply buffered and incoming events until the watcher is dropped
    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.rx.recv().await {
            apply_event(&self.index, event).await;
        }

        Ok(())
    }
}

/// Apply one event to the index, logging failures and carrying on
pub async fn apply_event(index: &SchemaIndex, event: WatchEvent) {
    match event {
        WatchEvent::FileCreated(path) => {
            debug!("Schema file created: {:?}", path);
            match index.notify_created(&path).await {
                Ok(()) => info!("Indexed {:?}", path),
                Err(e) => warn!("Failed to index {:?}: {}", path, e),
            }
        }
        WatchEvent::FileChanged(path) => {
            debug!("Schema file changed: {:?}", path);
            match index.notify_changed(&path).await {
                Ok(()) => info!("Reindexed {:?}", path),
                Err(e) => warn!("Failed to reindex {:?}: {}", path, e),
            }
        }
        WatchEvent::FileRemoved(path) => {
            index.notify_deleted(&path).await;
            info!("Removed {:?} from index", path);
        }
    }
}

/// Translate a notify event into schema file events below `root`
pub fn process_event(event: Event, root: &Path) -> Vec<WatchEvent> {
    let events = match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(WatchEvent::FileCreated).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.into_iter().map(WatchEvent::FileRemoved).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.into_iter().map(WatchEvent::FileCreated).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let mut events = Vec::new();
            if let Some(from) = paths.next() {
                events.push(WatchEvent::FileRemoved(from));
            }
            if let Some(to) = paths.next() {
                events.push(WatchEvent::FileCreated(to));
            }
            events
        }
        EventKind::Modify(_) => event.paths.into_iter().map(WatchEvent::FileChanged).collect(),
        EventKind::Remove(_) => event.paths.into_iter().map(WatchEvent::FileRemoved).collect(),
        _ => Vec::new(),
    };

    events
        .into_iter()
        .filter(|e| is_schema_file(e.path(), root))
        .collect()
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::FileChanged(path)
            | WatchEvent::FileCreated(path)
            | WatchEvent::FileRemoved(path) => path,
        }
    }
}

/// Check if a path is a schema file outside ignored directories
fn is_schema_file(path: &Path, root: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == SCHEMA_EXTENSION)
        .unwrap_or(false)
        && !is_ignored_path(path.strip_prefix(root).unwrap_or(path))
}

fn is_ignored_path(relative: &Path) -> bool {
    let Some(parent) = relative.parent() else {
        return false;
    };
    parent
        .components()
        .filter_map(|component| component.as_os_str().to_str())
        .any(is_ignored_name)
}
