use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::LensConfig;
use crate::index::SchemaIndex;
use crate::rpc::RpcServer;
use crate::watcher::FileWatcher;

/// Configuration for the daemon
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub socket_path: PathBuf,
    pub pid_file: PathBuf,
    pub idle_timeout: Duration,
    pub project_root: PathBuf,
}

impl DaemonConfig {
    /// Directory holding the socket and PID file
    pub fn runtime_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("graphql-lens")
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let runtime_dir = Self::runtime_dir();

        Self {
            socket_path: runtime_dir.join("lens.sock"),
            pid_file: runtime_dir.join("lens.pid"),
            idle_timeout: Duration::from_secs(300), // 5 minutes
            project_root: PathBuf::from("."),
        }
    }
}

/// Daemon serving one workspace's schema index over a Unix socket
pub struct LensDaemon {
    config: DaemonConfig,
    last_activity: Arc<RwLock<Instant>>,
}

impl LensDaemon {
    /// Create and run the daemon
    pub async fn run(config: DaemonConfig) -> Result<()> {
        info!("Starting graphql-lens daemon");

        let lens_config = LensConfig::discover(&config.project_root)
            .with_context(|| format!("Failed to open workspace {:?}", config.project_root))?;

        for path in [&config.socket_path, &config.pid_file] {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(&config.pid_file, std::process::id().to_string()).await?;
        info!("PID file written to {:?}", config.pid_file);

        let pid_file = config.pid_file.clone();
        let socket_path = config.socket_path.clone();
        ctrlc::set_handler(move || {
            let _ = std::fs::remove_file(&pid_file);
            let _ = std::fs::remove_file(&socket_path);
            info!("Cleaned up PID and socket files");
            std::process::exit(0);
        })?;

        let index = SchemaIndex::for_config(&lens_config);

        // Register the watch before the first scan so no edit falls in between
        let watch_root = lens_config.graphql_root();
        if watch_root.is_dir() {
            let mut watcher = FileWatcher::new(watch_root, index.clone())?;
            watcher.watch()?;
            tokio::spawn(async move {
                if let Err(e) = watcher.run().await {
                    warn!("File watcher stopped: {}", e);
                }
            });
        } else {
            warn!("Schema folder {:?} does not exist, not watching", watch_root);
        }

        // Warm the index; early RPC callers join the same initialization
        let warm = index.clone();
        tokio::spawn(async move {
            if let Err(e) = warm.ensure_initialized().await {
                warn!("Initial schema scan failed: {}", e);
            }
        });

        let daemon = Arc::new(LensDaemon {
            config: config.clone(),
            last_activity: Arc::new(RwLock::new(Instant::now())),
        });

        let daemon_clone = daemon.clone();
        tokio::spawn(async move {
            daemon_clone.idle_checker().await;
        });

        let server = Arc::new(RpcServer::new(index, daemon.last_activity.clone()));
        server.listen_unix(&config.socket_path).await?;

        Ok(())
    }

    /// Check for idle timeout and shutdown if needed
    async fn idle_checker(&self) {
        let interval = self
            .config
            .idle_timeout
            .clamp(Duration::from_secs(1), Duration::from_secs(30));
        loop {
            tokio::time::sleep(interval).await;

            let idle_duration = self.last_activity.read().await.elapsed();
            if idle_duration > self.config.idle_timeout {
                info!("Idle timeout reached ({:?}), shutting down", idle_duration);

                if let Err(e) = self.cleanup().await {
                    warn!("Error during cleanup: {}", e);
                }

                std::process::exit(0);
            }
        }
    }

    /// Remove PID and socket files
    async fn cleanup(&self) -> Result<()> {
        if self.config.pid_file.exists() {
            tokio::fs::remove_file(&self.config.pid_file).await?;
        }

        if self.config.socket_path.exists() {
            tokio::fs::remove_file(&self.config.socket_path).await?;
        }

        info!("Cleanup completed");
        Ok(())
    }
}
