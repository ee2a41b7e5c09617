//! Ledger Writer.
//!
//! Applies a purchase's allocations exactly once. The settlement marker,
//! every commission record and every balance credit land in one
//! transaction; a crash or error leaves no partial state behind.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use upline_db::queries::{commissions, members, settlements};
use upline_db::DbError;
use upline_types::{Allocation, CommissionRecord, PurchaseEvent};

use crate::{EngineError, Result};

/// What applying a purchase did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ApplyOutcome {
    /// Records written and balances credited by this call.
    Applied { records: u32, total: u64 },
    /// The purchase had already been settled; nothing changed.
    AlreadyApplied,
}

/// Apply inside a caller-owned transaction.
///
/// The caller commits. A `BEGIN IMMEDIATE` transaction is expected so the
/// settlement marker check and the writes cannot interleave with another
/// writer.
pub fn apply_in(
    tx: &Transaction<'_>,
    purchase: &PurchaseEvent,
    allocations: &[Allocation],
    now: u64,
) -> Result<ApplyOutcome> {
    if !settlements::insert_if_absent(tx, purchase, now)? {
        return Ok(ApplyOutcome::AlreadyApplied);
    }

    let mut records = 0u32;
    let mut total = 0u64;
    for allocation in allocations {
        let record = CommissionRecord {
            beneficiary: allocation.beneficiary.clone(),
            source: purchase.purchaser.clone(),
            amount: allocation.amount,
            rate: allocation.rate,
            depth: allocation.depth,
            category: purchase.category,
            created_at: now,
            purchase_tx_id: purchase.tx_id.clone(),
        };
        if !commissions::insert_if_absent(tx, &record)? {
            tracing::warn!(
                tx_id = %purchase.tx_id,
                beneficiary = %allocation.beneficiary,
                "duplicate commission record skipped"
            );
            continue;
        }
        match members::credit(tx, &allocation.beneficiary, allocation.amount) {
            Ok(()) => {}
            Err(DbError::Overflow(_)) => {
                return Err(EngineError::BalanceOverflow(allocation.beneficiary.clone()))
            }
            Err(e) => return Err(e.into()),
        }
        records += 1;
        total = total.saturating_add(allocation.amount);
    }

    settlements::set_totals(tx, purchase.tx_id.as_str(), total, records)?;
    Ok(ApplyOutcome::Applied { records, total })
}

/// Apply in a fresh immediate transaction and commit.
pub fn apply(
    conn: &mut Connection,
    purchase: &PurchaseEvent,
    allocations: &[Allocation],
    now: u64,
) -> Result<ApplyOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = apply_in(&tx, purchase, allocations, now)?;
    tx.commit()?;
    Ok(outcome)
}
