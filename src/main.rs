use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use graphql_lens::daemon::{DaemonConfig, LensDaemon};
use graphql_lens::watcher::FileWatcher;
use graphql_lens::{open_workspace, scaffold, search};

#[derive(Parser)]
#[command(name = "graphql-lens")]
#[command(about = "Jump to GraphQL types, fields and resolvers from the command line or an editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Unix socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    /// PID file path
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// Idle timeout in seconds
    #[arg(long, default_value = "300")]
    idle_timeout: u64,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List every declared type
    Types,
    /// List the fields of a type across all schema files
    Fields {
        type_name: String,
    },
    /// Show where a type is declared
    Locate {
        type_name: String,
    },
    /// Show where a field of a type is declared
    #[command(name = "find-field")]
    FindField {
        type_name: String,
        field_name: String,
    },
    /// Show where the resolver of a field is implemented
    #[command(name = "find-resolver")]
    FindResolver {
        type_name: String,
        field_name: String,
    },
    /// Create a new type file in the schema folder
    #[command(name = "new-type")]
    NewType {
        type_name: String,
    },
    /// Show index statistics
    Stats,
    /// Keep the index in sync with the schema folder and log every update
    Watch,
    /// Start the daemon for editor integration
    Start {
        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Check daemon status
    Status,
    /// Send a JSON-RPC request to the running daemon
    Query {
        /// Method name, e.g. list_fields
        method: String,
        /// Params as a JSON object, e.g. '{"type_name": "Query"}'
        params: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let defaults = DaemonConfig::default();
    let socket = cli.socket.clone().unwrap_or(defaults.socket_path);
    let pid_file = cli.pid_file.clone().unwrap_or(defaults.pid_file);

    match cli.command {
        Some(Commands::Types) => {
            let (_, index) = open(&cli.root)?;
            for name in index.list_type_names().await? {
                println!("{}", name);
            }
            Ok(())
        }
        Some(Commands::Fields { type_name }) => {
            let (_, index) = open(&cli.root)?;
            let fields = index.list_fields(&type_name).await?;
            if fields.is_empty() {
                println!("Type {} not found.", type_name);
            }
            for field in fields {
                println!("{}", field);
            }
            Ok(())
        }
        Some(Commands::Locate { type_name }) => {
            let (_, index) = open(&cli.root)?;
            match search::find_type(&index, &type_name).await? {
                Some(location) => println!("{}", location),
                None => println!("Type {} not found.", type_name),
            }
            Ok(())
        }
        Some(Commands::FindField { type_name, field_name }) => {
            let (_, index) = open(&cli.root)?;
            match search::find_field(&index, &type_name, &field_name).await? {
                Some(location) => println!("{}", location),
                None => println!("Field {} not found in type {}.", field_name, type_name),
            }
            Ok(())
        }
        Some(Commands::FindResolver { type_name, field_name }) => {
            let (_, index) = open(&cli.root)?;
            match search::find_resolver(&index, &type_name, &field_name).await? {
                Some(location) => println!("{}", location),
                None => println!("Resolver {} not found.", field_name),
            }
            Ok(())
        }
        Some(Commands::NewType { type_name }) => {
            let (config, _) = open(&cli.root)?;
            let path = scaffold::create_type_file(&config, &type_name).await?;
            println!("GraphQL type {} created at {}", type_name, path.display());
            Ok(())
        }
        Some(Commands::Stats) => {
            let (config, index) = open(&cli.root)?;
            index.ensure_initialized().await?;
            let stats = index.stats();

            println!("Index Statistics:");
            println!("  Schema folder: {:?}", config.graphql_root());
            println!("  Total types: {}", stats.total_types);
            println!("  Total fields: {}", stats.total_fields);
            println!("  Indexed files: {}", stats.indexed_files);
            println!("  Stale files: {}", stats.stale_files);
            println!("  Last updated: {:?}", stats.last_updated);
            Ok(())
        }
        Some(Commands::Watch) => {
            let (config, index) = open(&cli.root)?;
            let mut watcher = FileWatcher::new(config.graphql_root(), index.clone())?;
            watcher.watch()?;
            index.ensure_initialized().await?;
            watcher.run().await?;
            Ok(())
        }
        Some(Commands::Start { foreground }) => {
            let config = DaemonConfig {
                socket_path: socket,
                pid_file,
                idle_timeout: Duration::from_secs(cli.idle_timeout),
                project_root: cli.root.clone(),
            };

            if foreground {
                return LensDaemon::run(config).await;
            }

            use std::process::Stdio;

            let exe = std::env::current_exe()?;
            let mut cmd = Command::new(exe);
            cmd.arg("--root").arg(&cli.root);
            cmd.arg("--log-level").arg(&cli.log_level);
            cmd.arg("--socket").arg(&config.socket_path);
            cmd.arg("--pid-file").arg(&config.pid_file);
            cmd.arg("--idle-timeout").arg(cli.idle_timeout.to_string());
            cmd.arg("start");
            cmd.arg("--foreground");

            // Detach from terminal
            cmd.stdin(Stdio::null());
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());

            let child = cmd.spawn().context("Failed to start daemon in background")?;
            println!("Daemon started with PID {}", child.id());
            Ok(())
        }
        Some(Commands::Stop) => {
            match read_pid(&pid_file)? {
                Some(pid) => {
                    // Send SIGTERM
                    unsafe {
                        libc::kill(pid, libc::SIGTERM);
                    }
                    fs::remove_file(&pid_file)?;
                    println!("Daemon stopped (PID {})", pid);
                }
                None => println!("Daemon not running (PID file not found)"),
            }
            Ok(())
        }
        Some(Commands::Status) => {
            match read_pid(&pid_file)? {
                Some(pid) => {
                    let running = unsafe { libc::kill(pid, 0) == 0 };
                    if running {
                        println!("Daemon is running (PID {})", pid);
                        println!("Socket: {:?}", socket);
                    } else {
                        println!("Daemon PID file exists but process not running");
                        println!("Cleaning up stale PID file...");
                        fs::remove_file(&pid_file)?;
                    }
                }
                None => println!("Daemon not running"),
            }
            Ok(())
        }
        Some(Commands::Query { method, params }) => {
            use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
            use tokio::net::UnixStream;

            let params: Option<serde_json::Value> = params
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()
                .context("Params must be a JSON object")?;

            let stream = UnixStream::connect(&socket)
                .await
                .context("Failed to connect to daemon socket")?;
            let (reader, mut writer) = stream.into_split();

            let request = serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            });
            writer.write_all(serde_json::to_string(&request)?.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;

            let mut response = String::new();
            BufReader::new(reader).read_line(&mut response).await?;

            let json: serde_json::Value = serde_json::from_str(&response)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(())
        }
        None => {
            let config = DaemonConfig {
                socket_path: socket,
                pid_file,
                idle_timeout: Duration::from_secs(cli.idle_timeout),
                project_root: cli.root,
            };
            LensDaemon::run(config).await
        }
    }
}

fn open(root: &Path) -> Result<(graphql_lens::LensConfig, graphql_lens::SchemaIndex)> {
    open_workspace(root).with_context(|| format!("Failed to open workspace {:?}", root))
}

fn read_pid(pid_file: &Path) -> Result<Option<i32>> {
    if !pid_file.exists() {
        return Ok(None);
    }
    let pid = fs::read_to_string(pid_file)?
        .trim()
        .parse::<i32>()
        .context("Invalid PID in file")?;
    Ok(Some(pid))
}
