//! Commission ledger query functions. The table is append-only.

use rusqlite::Connection;
use upline_types::{Address, CommissionRecord};

use crate::Result;

/// Append a commission record unless one already exists for
/// `(beneficiary, purchase_tx_id)`.
///
/// Returns `true` if the row was written.
pub fn insert_if_absent(conn: &Connection, record: &CommissionRecord) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO commission_records
             (beneficiary, source, amount, rate_bps, depth, category, created_at, purchase_tx_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(beneficiary, purchase_tx_id) DO NOTHING",
        rusqlite::params![
            record.beneficiary.as_str(),
            record.source.as_str(),
            record.amount as i64,
            record.rate.bps(),
            record.depth,
            record.category.as_str(),
            record.created_at as i64,
            record.purchase_tx_id.as_str(),
        ],
    )?;
    Ok(inserted == 1)
}

/// All records written for one purchase, nearest ancestor first.
pub fn for_purchase(conn: &Connection, purchase_tx_id: &str) -> Result<Vec<CommissionRow>> {
    let mut stmt = conn.prepare(
        "SELECT beneficiary, source, amount, rate_bps, depth, category, created_at, purchase_tx_id
         FROM commission_records WHERE purchase_tx_id = ?1 ORDER BY depth",
    )?;
    let rows = stmt
        .query_map([purchase_tx_id], map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recent records credited to `beneficiary`, optionally at one depth.
pub fn for_beneficiary(
    conn: &Connection,
    beneficiary: &Address,
    depth: Option<u32>,
    limit: u32,
) -> Result<Vec<CommissionRow>> {
    let mut stmt = conn.prepare(
        "SELECT beneficiary, source, amount, rate_bps, depth, category, created_at, purchase_tx_id
         FROM commission_records
         WHERE beneficiary = ?1 AND (?2 IS NULL OR depth = ?2)
         ORDER BY created_at DESC, id DESC LIMIT ?3",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![beneficiary.as_str(), depth, limit], map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Sum of every commission ever credited to `beneficiary`.
pub fn total_for_beneficiary(conn: &Connection, beneficiary: &Address) -> Result<u64> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM commission_records WHERE beneficiary = ?1",
        [beneficiary.as_str()],
        |row| row.get(0),
    )?;
    Ok(total as u64)
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommissionRow> {
    Ok(CommissionRow {
        beneficiary: row.get(0)?,
        source: row.get(1)?,
        amount: row.get::<_, i64>(2)? as u64,
        rate_bps: row.get(3)?,
        depth: row.get(4)?,
        category: row.get(5)?,
        created_at: row.get::<_, i64>(6)? as u64,
        purchase_tx_id: row.get(7)?,
    })
}

/// A raw commission row.
#[derive(Debug, Clone)]
pub struct CommissionRow {
    pub beneficiary: String,
    pub source: String,
    pub amount: u64,
    pub rate_bps: u32,
    pub depth: u32,
    pub category: String,
    pub created_at: u64,
    pub purchase_tx_id: String,
}
