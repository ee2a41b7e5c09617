//! SQL schema definitions.

/// Complete schema for the Upline v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Members & hierarchy
-- ============================================================

CREATE TABLE IF NOT EXISTS members (
    address TEXT PRIMARY KEY,
    tier TEXT NOT NULL DEFAULT 'normal',
    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    lifetime_earnings INTEGER NOT NULL DEFAULT 0 CHECK (lifetime_earnings >= 0),
    referrer TEXT,
    created_at INTEGER NOT NULL,
    CHECK (referrer IS NULL OR referrer <> address)
);

-- Upward adjacency list. The referrer need not be a registered member yet.
CREATE TABLE IF NOT EXISTS referral_edges (
    member TEXT PRIMARY KEY REFERENCES members(address),
    referrer TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    CHECK (member <> referrer)
);

CREATE INDEX IF NOT EXISTS idx_edges_referrer ON referral_edges(referrer);

CREATE TABLE IF NOT EXISTS allocation_configs (
    member TEXT PRIMARY KEY REFERENCES members(address),
    self_bps INTEGER NOT NULL DEFAULT 0 CHECK (self_bps >= 0),
    level1_bps INTEGER NOT NULL DEFAULT 0 CHECK (level1_bps >= 0),
    level2_bps INTEGER NOT NULL DEFAULT 0 CHECK (level2_bps >= 0),
    partner_bps INTEGER NOT NULL DEFAULT 0 CHECK (partner_bps >= 0),
    updated_at INTEGER NOT NULL
);

-- ============================================================
-- Ledger
-- ============================================================

CREATE TABLE IF NOT EXISTS settlements (
    purchase_tx_id TEXT PRIMARY KEY,
    purchaser TEXT NOT NULL,
    amount INTEGER NOT NULL CHECK (amount > 0),
    category TEXT NOT NULL,
    total_commission INTEGER NOT NULL DEFAULT 0,
    record_count INTEGER NOT NULL DEFAULT 0,
    settled_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS commission_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    beneficiary TEXT NOT NULL REFERENCES members(address),
    source TEXT NOT NULL,
    amount INTEGER NOT NULL CHECK (amount > 0),
    rate_bps INTEGER NOT NULL CHECK (rate_bps > 0),
    depth INTEGER NOT NULL CHECK (depth >= 1),
    category TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    purchase_tx_id TEXT NOT NULL,
    UNIQUE (beneficiary, purchase_tx_id),
    CHECK (beneficiary <> source)
);

CREATE INDEX IF NOT EXISTS idx_commissions_beneficiary ON commission_records(beneficiary, depth);
CREATE INDEX IF NOT EXISTS idx_commissions_purchase ON commission_records(purchase_tx_id);
"#;
