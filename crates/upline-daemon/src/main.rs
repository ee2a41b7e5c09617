//! upline-daemon: the commission engine service.
//!
//! Single OS process running a Tokio async runtime. Purchase verifiers and
//! administrative tools talk to it via JSON-RPC over a Unix socket.

mod commands;
mod config;
mod rpc;

use std::sync::Arc;

use tracing::{error, info};
use upline_engine::CommissionEngine;
use upline_rates::schedule::RateSchedule;

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection.
    pub db: Arc<tokio::sync::Mutex<rusqlite::Connection>>,
    /// The engine, holding the configured rate schedule.
    pub engine: CommissionEngine,
}

impl DaemonState {
    pub fn new(conn: rusqlite::Connection, engine: CommissionEngine) -> Self {
        Self {
            db: Arc::new(tokio::sync::Mutex::new(conn)),
            engine,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing at the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("upline={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Upline daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Build the rate schedule; bad floors are fatal
    let schedule = RateSchedule::new(&config.commission)?;
    info!(
        level1_floor = %config.commission.level1_floor,
        level2_floor = %config.commission.level2_floor,
        "rate schedule loaded"
    );

    // 4. Open database
    let db_path = data_dir.join("upline.db");
    let conn = upline_db::open(&db_path)?;
    let state = Arc::new(DaemonState::new(conn, CommissionEngine::new(schedule)));

    // 5. Run the RPC server until shutdown
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state, socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
