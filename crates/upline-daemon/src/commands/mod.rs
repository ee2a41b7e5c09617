//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Handlers
//! decode params, run the engine against the shared connection, and shape
//! the JSON result. Amounts go out as decimal strings.

pub mod members;
pub mod settlement;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::rpc::RpcError;

type Result = std::result::Result<Value, RpcError>;

/// Decode the params object into a typed request.
fn params<T: DeserializeOwned>(params: &Value) -> std::result::Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Current Unix time in seconds.
fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
