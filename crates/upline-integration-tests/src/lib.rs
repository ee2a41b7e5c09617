//! Integration tests for the Upline commission engine.
//!
//! The library half holds shared fixtures; the scenarios live under
//! `tests/` and drive the engine end to end against real SQLite files.
//!
//! ```sh
//! cargo test -p upline-integration-tests
//! cargo test -p upline-integration-tests -- --ignored
//! ```
//!
//! The long concurrency and random-forest scenarios are `#[ignore]`d;
//! the second form runs only those.

use std::path::PathBuf;

use rusqlite::Connection;
use tempfile::TempDir;
use upline_engine::CommissionEngine;
use upline_types::{
    Address, MemberTier, PurchaseCategory, PurchaseEvent, PurchaseTxId, MICRO_UNITS_PER_UNIT,
};

/// Base timestamp for test scenarios.
pub const BASE_TIME: u64 = 1_700_000_000;

pub fn addr(s: &str) -> Address {
    Address::parse(s).expect("valid test address")
}

/// Whole units to micro-units.
pub fn units(n: u64) -> u64 {
    n * MICRO_UNITS_PER_UNIT
}

pub fn purchase(purchaser: &str, amount: u64, tx_id: &str) -> PurchaseEvent {
    PurchaseEvent {
        purchaser: addr(purchaser),
        amount,
        tx_id: PurchaseTxId::parse(tx_id).expect("valid test tx id"),
        category: PurchaseCategory::Product,
    }
}

/// Register `members` in order and link each one to the next as its
/// referrer. The last entry is the root.
pub fn build_chain(engine: &CommissionEngine, conn: &mut Connection, members: &[(&str, MemberTier)]) {
    for (name, tier) in members {
        engine
            .register_member(conn, &addr(name), *tier, BASE_TIME)
            .expect("register member");
    }
    for pair in members.windows(2) {
        engine
            .set_referrer(conn, &addr(pair[0].0), &addr(pair[1].0), BASE_TIME)
            .expect("link member");
    }
}

pub fn balance(engine: &CommissionEngine, conn: &Connection, member: &str) -> u64 {
    engine.member(conn, &addr(member)).expect("member").balance
}

/// A database file inside its own temporary directory. The directory,
/// including SQLite's WAL and shared-memory files, is removed on drop.
pub struct TempDb {
    dir: TempDir,
}

impl TempDb {
    pub fn new(label: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("upline-{label}-"))
            .tempdir()
            .expect("create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("upline.db")
    }

    /// Open a new connection; migrations run on first open.
    pub fn connect(&self) -> Connection {
        upline_db::open(&self.path()).expect("open file database")
    }
}
