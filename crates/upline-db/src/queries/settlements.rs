//! Settlement markers, one per applied purchase.

use rusqlite::{Connection, OptionalExtension};
use upline_types::PurchaseEvent;

use crate::Result;

/// Claim the settlement slot for a purchase.
///
/// Returns `false` if the purchase was already settled, in which case
/// nothing is written.
pub fn insert_if_absent(conn: &Connection, purchase: &PurchaseEvent, settled_at: u64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO settlements (purchase_tx_id, purchaser, amount, category, settled_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(purchase_tx_id) DO NOTHING",
        rusqlite::params![
            purchase.tx_id.as_str(),
            purchase.purchaser.as_str(),
            purchase.amount as i64,
            purchase.category.as_str(),
            settled_at as i64,
        ],
    )?;
    Ok(inserted == 1)
}

/// Record the totals written for a settlement.
pub fn set_totals(
    conn: &Connection,
    purchase_tx_id: &str,
    total_commission: u64,
    record_count: u32,
) -> Result<()> {
    conn.execute(
        "UPDATE settlements SET total_commission = ?1, record_count = ?2
         WHERE purchase_tx_id = ?3",
        rusqlite::params![total_commission as i64, record_count, purchase_tx_id],
    )?;
    Ok(())
}

/// Get a settlement by purchase transaction id.
pub fn get(conn: &Connection, purchase_tx_id: &str) -> Result<Option<SettlementRow>> {
    let row = conn
        .query_row(
            "SELECT purchase_tx_id, purchaser, amount, category, total_commission,
                    record_count, settled_at
             FROM settlements WHERE purchase_tx_id = ?1",
            [purchase_tx_id],
            |row| {
                Ok(SettlementRow {
                    purchase_tx_id: row.get(0)?,
                    purchaser: row.get(1)?,
                    amount: row.get::<_, i64>(2)? as u64,
                    category: row.get(3)?,
                    total_commission: row.get::<_, i64>(4)? as u64,
                    record_count: row.get(5)?,
                    settled_at: row.get::<_, i64>(6)? as u64,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// A raw settlement row.
#[derive(Debug, Clone)]
pub struct SettlementRow {
    pub purchase_tx_id: String,
    pub purchaser: String,
    pub amount: u64,
    pub category: String,
    pub total_commission: u64,
    pub record_count: u32,
    pub settled_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use upline_types::{Address, PurchaseCategory, PurchaseTxId};

    fn purchase(tx: &str) -> PurchaseEvent {
        PurchaseEvent {
            purchaser: Address::parse("buyer").expect("address"),
            amount: 1_000_000,
            tx_id: PurchaseTxId::parse(tx).expect("tx id"),
            category: PurchaseCategory::Node,
        }
    }

    #[test]
    fn test_insert_once() {
        let conn = crate::open_memory().expect("open");
        assert!(insert_if_absent(&conn, &purchase("tx-1"), 100).expect("insert"));
        assert!(!insert_if_absent(&conn, &purchase("tx-1"), 200).expect("insert again"));

        let row = get(&conn, "tx-1").expect("get").expect("present");
        assert_eq!(row.settled_at, 100);
        assert_eq!(row.category, "node");
        assert_eq!(row.record_count, 0);
    }

    #[test]
    fn test_set_totals() {
        let conn = crate::open_memory().expect("open");
        insert_if_absent(&conn, &purchase("tx-1"), 100).expect("insert");
        set_totals(&conn, "tx-1", 53, 3).expect("totals");

        let row = get(&conn, "tx-1").expect("get").expect("present");
        assert_eq!(row.total_commission, 53);
        assert_eq!(row.record_count, 3);
    }

    #[test]
    fn test_get_absent() {
        let conn = crate::open_memory().expect("open");
        assert!(get(&conn, "missing").expect("get").is_none());
    }
}
