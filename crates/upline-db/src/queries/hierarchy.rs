//! Referral edge query functions.

use rusqlite::{Connection, OptionalExtension};
use upline_types::Address;

use crate::Result;

/// Insert the upward edge `member -> referrer`.
pub fn insert_edge(
    conn: &Connection,
    member: &Address,
    referrer: &Address,
    created_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO referral_edges (member, referrer, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![member.as_str(), referrer.as_str(), created_at as i64],
    )?;
    Ok(())
}

/// Look up a member's outgoing edge, if any.
pub fn edge(conn: &Connection, member: &Address) -> Result<Option<EdgeRow>> {
    let row = conn
        .query_row(
            "SELECT e.referrer, m.address IS NOT NULL
             FROM referral_edges e
             LEFT JOIN members m ON m.address = e.referrer
             WHERE e.member = ?1",
            [member.as_str()],
            |row| {
                Ok(EdgeRow {
                    referrer: row.get(0)?,
                    referrer_registered: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// A raw edge row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRow {
    pub referrer: String,
    /// Whether the referrer has a member row yet.
    pub referrer_registered: bool,
}
