//! Member query functions.

use rusqlite::Connection;
use upline_types::{Address, MemberTier};

use crate::{not_found, DbError, Result};

/// Register a new member with zero balances.
///
/// # Errors
///
/// - [`DbError::Constraint`] if the address is already registered
pub fn insert(
    conn: &Connection,
    address: &Address,
    tier: MemberTier,
    created_at: u64,
) -> Result<()> {
    let inserted = conn.execute(
        "INSERT INTO members (address, tier, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(address) DO NOTHING",
        rusqlite::params![address.as_str(), tier.as_str(), created_at as i64],
    )?;
    if inserted == 0 {
        return Err(DbError::Constraint(format!(
            "member {address} already registered"
        )));
    }
    Ok(())
}

/// Get a member by address.
pub fn get(conn: &Connection, address: &Address) -> Result<MemberRow> {
    conn.query_row(
        "SELECT address, tier, balance, lifetime_earnings, referrer, created_at
         FROM members WHERE address = ?1",
        [address.as_str()],
        |row| {
            Ok(MemberRow {
                address: row.get(0)?,
                tier: row.get(1)?,
                balance: row.get::<_, i64>(2)? as u64,
                lifetime_earnings: row.get::<_, i64>(3)? as u64,
                referrer: row.get(4)?,
                created_at: row.get::<_, i64>(5)? as u64,
            })
        },
    )
    .map_err(not_found(format!("member {address}")))
}

/// Whether a member row exists.
pub fn exists(conn: &Connection, address: &Address) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM members WHERE address = ?1",
        [address.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Change a member's tier.
pub fn set_tier(conn: &Connection, address: &Address, tier: MemberTier) -> Result<()> {
    let updated = conn.execute(
        "UPDATE members SET tier = ?1 WHERE address = ?2",
        rusqlite::params![tier.as_str(), address.as_str()],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("member {address}")));
    }
    Ok(())
}

/// Atomically add `amount` to both balance and lifetime earnings.
///
/// The increment is evaluated by SQLite against the current row, so
/// concurrent credits never lose updates. SQLite turns an `INTEGER` sum
/// past `i64::MAX` into `REAL`, so the update only matches while both
/// columns have headroom.
///
/// # Errors
///
/// - [`DbError::Overflow`] if either column would pass `i64::MAX`
/// - [`DbError::NotFound`] if the member does not exist
pub fn credit(conn: &Connection, address: &Address, amount: u64) -> Result<()> {
    let amount = i64::try_from(amount)
        .map_err(|_| DbError::Overflow(format!("credit of {amount} to member {address}")))?;
    let updated = conn.execute(
        "UPDATE members
         SET balance = balance + ?1, lifetime_earnings = lifetime_earnings + ?1
         WHERE address = ?2
           AND balance <= ?3 - ?1
           AND lifetime_earnings <= ?3 - ?1",
        rusqlite::params![amount, address.as_str(), i64::MAX],
    )?;
    if updated == 0 {
        if exists(conn, address)? {
            return Err(DbError::Overflow(format!("balance of member {address}")));
        }
        return Err(DbError::NotFound(format!("member {address}")));
    }
    Ok(())
}

/// Set the referrer column if, and only if, it is still unset.
///
/// Returns `false` when the member already has a referrer (or does not
/// exist); the caller distinguishes the two.
pub fn assign_referrer(conn: &Connection, member: &Address, referrer: &Address) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE members SET referrer = ?1 WHERE address = ?2 AND referrer IS NULL",
        rusqlite::params![referrer.as_str(), member.as_str()],
    )?;
    Ok(updated == 1)
}

/// A raw member row.
#[derive(Debug, Clone)]
pub struct MemberRow {
    pub address: String,
    pub tier: String,
    pub balance: u64,
    pub lifetime_earnings: u64,
    pub referrer: Option<String>,
    pub created_at: u64,
}
