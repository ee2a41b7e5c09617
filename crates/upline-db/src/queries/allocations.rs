//! Custom allocation configuration query functions.

use rusqlite::{Connection, OptionalExtension};
use upline_types::{Address, AllocationConfig, Rate};

use crate::{DbError, Result};

/// Insert or replace a member's allocation configuration.
///
/// Budget validation is the caller's job; the table only rejects negatives.
pub fn upsert(
    conn: &Connection,
    member: &Address,
    config: &AllocationConfig,
    updated_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO allocation_configs
             (member, self_bps, level1_bps, level2_bps, partner_bps, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(member) DO UPDATE SET
             self_bps = excluded.self_bps,
             level1_bps = excluded.level1_bps,
             level2_bps = excluded.level2_bps,
             partner_bps = excluded.partner_bps,
             updated_at = excluded.updated_at",
        rusqlite::params![
            member.as_str(),
            config.self_rate.bps(),
            config.level1_bonus.bps(),
            config.level2_bonus.bps(),
            config.partner_bonus.bps(),
            updated_at as i64,
        ],
    )?;
    Ok(())
}

/// Get a member's allocation configuration, if one is stored.
pub fn get(conn: &Connection, member: &Address) -> Result<Option<AllocationConfig>> {
    let raw = conn
        .query_row(
            "SELECT self_bps, level1_bps, level2_bps, partner_bps
             FROM allocation_configs WHERE member = ?1",
            [member.as_str()],
            |row| {
                Ok([
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ])
            },
        )
        .optional()?;

    let Some(raw) = raw else {
        return Ok(None);
    };
    let rate = |bps: i64| {
        u32::try_from(bps)
            .map(Rate::from_bps)
            .map_err(|_| DbError::Corrupt(format!("allocation rate {bps} for {member}")))
    };
    Ok(Some(AllocationConfig {
        self_rate: rate(raw[0])?,
        level1_bonus: rate(raw[1])?,
        level2_bonus: rate(raw[2])?,
        partner_bonus: rate(raw[3])?,
    }))
}

/// Delete a member's allocation configuration. Returns whether one existed.
pub fn remove(conn: &Connection, member: &Address) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM allocation_configs WHERE member = ?1",
        [member.as_str()],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::members;
    use upline_types::MemberTier;

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        members::insert(&conn, &addr("mp"), MemberTier::MarketPartner, 1).expect("insert");
        conn
    }

    fn addr(s: &str) -> Address {
        Address::parse(s).expect("address")
    }

    #[test]
    fn test_get_absent() {
        let conn = test_db();
        assert!(get(&conn, &addr("mp")).expect("get").is_none());
    }

    #[test]
    fn test_upsert_replaces() {
        let conn = test_db();
        let first = AllocationConfig {
            self_rate: Rate::from_bps(500),
            level1_bonus: Rate::from_bps(500),
            ..AllocationConfig::default()
        };
        upsert(&conn, &addr("mp"), &first, 10).expect("upsert");
        assert_eq!(get(&conn, &addr("mp")).expect("get"), Some(first));

        let second = AllocationConfig {
            level2_bonus: Rate::from_bps(1000),
            ..AllocationConfig::default()
        };
        upsert(&conn, &addr("mp"), &second, 20).expect("upsert");
        assert_eq!(get(&conn, &addr("mp")).expect("get"), Some(second));
    }

    #[test]
    fn test_remove() {
        let conn = test_db();
        upsert(&conn, &addr("mp"), &AllocationConfig::default(), 10).expect("upsert");
        assert!(remove(&conn, &addr("mp")).expect("remove"));
        assert!(!remove(&conn, &addr("mp")).expect("remove again"));
    }

    #[test]
    fn test_requires_member() {
        let conn = test_db();
        assert!(upsert(&conn, &addr("ghost"), &AllocationConfig::default(), 10).is_err());
    }
}
