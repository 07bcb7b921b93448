use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::LensError;
use crate::index::SchemaIndex;
use crate::search;

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC error
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: format!("Invalid params: {}", message),
            data: None,
        }
    }
}

impl From<LensError> for JsonRpcError {
    fn from(e: LensError) -> Self {
        Self {
            code: -32000,
            message: e.to_string(),
            data: None,
        }
    }
}

impl JsonRpcResponse {
    fn new(id: Option<Value>, result: std::result::Result<Value, JsonRpcError>) -> Self {
        match result {
            Ok(value) => Self {
                jsonrpc: "2.0".to_string(),
                result: Some(value),
                error: None,
                id,
            },
            Err(error) => Self {
                jsonrpc: "2.0".to_string(),
                result: None,
                error: Some(error),
                id,
            },
        }
    }
}

/// RPC server answering schema queries
pub struct RpcServer {
    index: SchemaIndex,
    last_activity: Arc<RwLock<Instant>>,
}

impl RpcServer {
    /// Create a new RPC server
    pub fn new(index: SchemaIndex, last_activity: Arc<RwLock<Instant>>) -> Self {
        Self {
            index,
            last_activity,
        }
    }

    /// Start listening on Unix socket
    pub async fn listen_unix(self: Arc<Self>, socket_path: &std::path::Path) -> Result<()> {
        // Remove old socket if exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }

        let listener = UnixListener::bind(socket_path)?;
        info!("RPC server listening on {:?}", socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream).await {
                            error!("Error handling connection: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// Handle a single connection
    async fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        while reader.read_line(&mut line).await? > 0 {
            debug!("Received request: {}", line.trim());
            *self.last_activity.write().await = Instant::now();

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.process_request(request).await,
                Err(e) => JsonRpcResponse::new(
                    None,
                    Err(JsonRpcError {
                        code: -32700,
                        message: format!("Parse error: {}", e),
                        data: None,
                    }),
                ),
            };

            let response_str = serde_json::to_string(&response)?;
            writer.write_all(response_str.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;

            line.clear();
        }

        Ok(())
    }

    /// Process a JSON-RPC request
    pub async fn process_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params = request.params.as_ref();
        let result = match request.method.as_str() {
            "ping" => Ok(json!({"status": "ok", "ready": self.index.is_ready()})),
            "list_type_names" => self.list_type_names().await,
            "list_fields" => self.list_fields(params).await,
            "locate_file" => self.locate_file(params).await,
            "find_type" => self.find_type(params).await,
            "find_field" => self.find_field(params).await,
            "find_resolver" => self.find_resolver(params).await,
            "stale_files" => Ok(json!(self.index.stale_files())),
            "get_stats" => Ok(json!(self.index.stats())),
            _ => Err(JsonRpcError {
                code: -32601,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        JsonRpcResponse::new(request.id, result)
    }

    async fn list_type_names(&self) -> std::result::Result<Value, JsonRpcError> {
        Ok(json!(self.index.list_type_names().await?))
    }

    async fn list_fields(&self, params: Option<&Value>) -> std::result::Result<Value, JsonRpcError> {
        let type_name = string_param(params, "type_name")?;
        Ok(json!(self.index.list_fields(type_name).await?))
    }

    async fn locate_file(&self, params: Option<&Value>) -> std::result::Result<Value, JsonRpcError> {
        let type_name = string_param(params, "type_name")?;
        Ok(json!(self.index.locate_file(type_name).await?))
    }

    async fn find_type(&self, params: Option<&Value>) -> std::result::Result<Value, JsonRpcError> {
        let type_name = string_param(params, "type_name")?;
        Ok(json!(search::find_type(&self.index, type_name).await?))
    }

    async fn find_field(&self, params: Option<&Value>) -> std::result::Result<Value, JsonRpcError> {
        let type_name = string_param(params, "type_name")?;
        let field_name = string_param(params, "field_name")?;
        Ok(json!(
            search::find_field(&self.index, type_name, field_name).await?
        ))
    }

    async fn find_resolver(&self, params: Option<&Value>) -> std::result::Result<Value, JsonRpcError> {
        let type_name = string_param(params, "type_name")?;
        let field_name = string_param(params, "field_name")?;
        Ok(json!(
            search::find_resolver(&self.index, type_name, field_name).await?
        ))
    }
}

fn string_param<'a>(params: Option<&'a Value>, name: &str) -> std::result::Result<&'a str, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    params[name]
        .as_str()
        .ok_or_else(|| JsonRpcError::invalid_params(&format!("missing {}", name)))
}
