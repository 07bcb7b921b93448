pub mod config;
pub mod daemon;
pub mod error;
pub mod extract;
pub mod index;
pub mod rpc;
pub mod scaffold;
pub mod search;
pub mod source;
pub mod watcher;

pub use config::LensConfig;
pub use error::{LensError, Result};
pub use extract::{SchemaExtractor, SchemaFile};
pub use index::{IndexStats, SchemaIndex};
pub use search::Location;
pub use source::{FsSource, MemorySource, SchemaSource};

use std::path::Path;

/// Open the schema index of a workspace; nothing is scanned until the first query
pub fn open_workspace(root: &Path) -> Result<(LensConfig, SchemaIndex)> {
    let config = LensConfig::discover(root)?;
    let index = SchemaIndex::for_config(&config);
    Ok((config, index))
}
