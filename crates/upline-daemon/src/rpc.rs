//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};
use upline_engine::EngineError;
use upline_rates::RateError;

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn new(code: i32, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self::new(-32700, "PARSE_ERROR", None)
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self::new(-32600, "INVALID_REQUEST", None)
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            -32601,
            "METHOD_NOT_FOUND",
            Some(serde_json::json!({"method": method})),
        )
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::new(
            -32602,
            "INVALID_PARAMS",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str, retriable: bool) -> Self {
        Self::new(
            -32603,
            "INTERNAL_ERROR",
            Some(serde_json::json!({"detail": detail, "retriable": retriable})),
        )
    }

    // Domain errors

    /// Unknown member (-32020).
    pub fn unknown_member(address: &str) -> Self {
        Self::new(
            -32020,
            "UNKNOWN_MEMBER",
            Some(serde_json::json!({"address": address})),
        )
    }

    /// Member already registered (-32021).
    pub fn already_registered(address: &str) -> Self {
        Self::new(
            -32021,
            "ALREADY_REGISTERED",
            Some(serde_json::json!({"address": address})),
        )
    }

    /// Referrer already set (-32030).
    pub fn referrer_already_set(member: &str, existing: &str) -> Self {
        Self::new(
            -32030,
            "REFERRER_ALREADY_SET",
            Some(serde_json::json!({"member": member, "referrer": existing})),
        )
    }

    /// Self-referral (-32031).
    pub fn self_referral() -> Self {
        Self::new(-32031, "SELF_REFERRAL", None)
    }

    /// Referral cycle (-32032).
    pub fn referral_cycle(member: &str, referrer: &str) -> Self {
        Self::new(
            -32032,
            "REFERRAL_CYCLE",
            Some(serde_json::json!({"member": member, "referrer": referrer})),
        )
    }

    /// Allocation config rejected (-32040).
    pub fn allocation_rejected(detail: &str) -> Self {
        Self::new(
            -32040,
            "ALLOCATION_REJECTED",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Transaction id re-used with different details (-32050).
    pub fn conflicting_purchase(tx_id: &str) -> Self {
        Self::new(
            -32050,
            "CONFLICTING_PURCHASE",
            Some(serde_json::json!({"tx_id": tx_id})),
        )
    }

    /// A beneficiary's balance is full (-32060).
    pub fn balance_overflow(address: &str) -> Self {
        Self::new(
            -32060,
            "BALANCE_OVERFLOW",
            Some(serde_json::json!({"member": address})),
        )
    }
}

impl From<EngineError> for RpcError {
    fn from(e: EngineError) -> Self {
        match &e {
            EngineError::UnknownMember(address) => RpcError::unknown_member(address.as_str()),
            EngineError::AlreadyRegistered(address) => {
                RpcError::already_registered(address.as_str())
            }
            EngineError::ReferrerAlreadySet { member, existing } => {
                RpcError::referrer_already_set(member.as_str(), existing)
            }
            EngineError::SelfReferral => RpcError::self_referral(),
            EngineError::ReferralCycle { member, referrer } => {
                RpcError::referral_cycle(member.as_str(), referrer.as_str())
            }
            EngineError::Rate(RateError::InvalidFloor(_)) => {
                RpcError::internal_error(&e.to_string(), false)
            }
            EngineError::Rate(_) => RpcError::allocation_rejected(&e.to_string()),
            EngineError::ConflictingPurchase { tx_id } => RpcError::conflicting_purchase(tx_id),
            EngineError::BalanceOverflow(address) => {
                error!(member = %address, "balance overflow, settlement rejected");
                RpcError::balance_overflow(address.as_str())
            }
            EngineError::ZeroAmount | EngineError::AmountTooLarge(_) | EngineError::InvalidInput(_) => {
                RpcError::invalid_params(&e.to_string())
            }
            EngineError::Store(_) => {
                let retriable = e.is_retriable();
                error!(error = %e, retriable, "store failure");
                RpcError::internal_error(&e.to_string(), retriable)
            }
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&state, &line).await;

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Decode one request line and dispatch it.
pub async fn handle_line(state: &Arc<DaemonState>, line: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) if request.jsonrpc != "2.0" => {
            RpcResponse::error(request.id, RpcError::invalid_request())
        }
        Ok(request) => dispatch_request(state, request).await,
        Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: &Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Members & hierarchy
        "register_member" => commands::members::register_member(state, &request.params).await,
        "set_member_tier" => commands::members::set_member_tier(state, &request.params).await,
        "set_referrer" => commands::members::set_referrer(state, &request.params).await,
        "set_allocation_config" => {
            commands::members::set_allocation_config(state, &request.params).await
        }
        "get_member" => commands::members::get_member(state, &request.params).await,

        // Settlement
        "settle_purchase" => commands::settlement::settle_purchase(state, &request.params).await,
        "get_commission_history" => {
            commands::settlement::get_commission_history(state, &request.params).await
        }

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
