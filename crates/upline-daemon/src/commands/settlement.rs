//! Purchase settlement and commission ledger command handlers.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use upline_engine::ApplyOutcome;
use upline_types::amount::{format_units, parse_units};
use upline_types::{Address, PurchaseCategory, PurchaseEvent, PurchaseTxId};

use super::{params, unix_now, Result};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Default and maximum page size for history queries.
const DEFAULT_HISTORY_LIMIT: u32 = 50;
const MAX_HISTORY_LIMIT: u32 = 500;

#[derive(Deserialize)]
struct SettleParams {
    purchaser: Address,
    /// Decimal string, e.g. "1000.5".
    amount: String,
    tx_id: PurchaseTxId,
    category: PurchaseCategory,
}

#[derive(Deserialize)]
struct HistoryParams {
    beneficiary: Address,
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

/// Distribute commissions for a verified purchase.
pub async fn settle_purchase(state: &Arc<DaemonState>, raw: &Value) -> Result {
    let p: SettleParams = params(raw)?;
    let amount = parse_units(&p.amount).map_err(|e| RpcError::invalid_params(&e.to_string()))?;
    let purchase = PurchaseEvent {
        purchaser: p.purchaser,
        amount,
        tx_id: p.tx_id,
        category: p.category,
    };

    let mut db = state.db.lock().await;
    let settlement = state
        .engine
        .settle_purchase(&mut db, &purchase, unix_now())?;

    let status = match settlement.outcome {
        ApplyOutcome::Applied { .. } => "applied",
        ApplyOutcome::AlreadyApplied => "already_applied",
    };
    let allocations: Vec<Value> = settlement
        .allocations
        .iter()
        .map(|a| {
            serde_json::json!({
                "beneficiary": a.beneficiary,
                "depth": a.depth,
                "rate_bps": a.rate.bps(),
                "amount": format_units(a.amount),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "purchase_tx_id": settlement.purchase_tx_id,
        "status": status,
        "total_commission": format_units(settlement.total_commission),
        "allocations": allocations,
    }))
}

/// Most recent commission records credited to a member.
pub async fn get_commission_history(state: &Arc<DaemonState>, raw: &Value) -> Result {
    let p: HistoryParams = params(raw)?;
    let limit = p
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let db = state.db.lock().await;
    let records = state
        .engine
        .commission_history(&db, &p.beneficiary, p.depth, limit)?;

    let result: Vec<Value> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "purchase_tx_id": r.purchase_tx_id,
                "source": r.source,
                "depth": r.depth,
                "rate_bps": r.rate.bps(),
                "amount": format_units(r.amount),
                "category": r.category,
                "created_at": r.created_at,
            })
        })
        .collect();

    Ok(serde_json::json!(result))
}
