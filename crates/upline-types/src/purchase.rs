//! Purchase events and the commission records they produce.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Address, Rate, Result, TypesError};

/// Maximum accepted purchase transaction identifier length.
pub const MAX_TX_ID_LEN: usize = 128;

/// Globally unique identifier of a verified purchase; the idempotency key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PurchaseTxId(String);

impl PurchaseTxId {
    /// # Errors
    ///
    /// - [`TypesError::InvalidTxId`] if empty, longer than [`MAX_TX_ID_LEN`],
    ///   or containing whitespace or non-ASCII characters
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty()
            || raw.len() > MAX_TX_ID_LEN
            || !raw.bytes().all(|b| b.is_ascii_graphic())
        {
            return Err(TypesError::InvalidTxId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PurchaseTxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PurchaseTxId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PurchaseTxId> for String {
    fn from(value: PurchaseTxId) -> Self {
        value.0
    }
}

/// What was bought.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseCategory {
    Membership,
    Node,
    Product,
}

impl PurchaseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseCategory::Membership => "membership",
            PurchaseCategory::Node => "node",
            PurchaseCategory::Product => "product",
        }
    }
}

impl fmt::Display for PurchaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseCategory {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "membership" => Ok(PurchaseCategory::Membership),
            "node" => Ok(PurchaseCategory::Node),
            "product" => Ok(PurchaseCategory::Product),
            other => Err(TypesError::UnknownCategory(other.to_string())),
        }
    }
}

/// A verified, final purchase handed to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    pub purchaser: Address,
    /// Purchase amount in micro-units.
    pub amount: u64,
    pub tx_id: PurchaseTxId,
    pub category: PurchaseCategory,
}

/// Immutable ledger entry: one per (beneficiary, purchase).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub beneficiary: Address,
    /// The purchaser whose purchase generated the commission.
    pub source: Address,
    /// Micro-units.
    pub amount: u64,
    /// Rate the amount was computed at.
    pub rate: Rate,
    pub depth: u32,
    pub category: PurchaseCategory,
    /// Unix epoch seconds.
    pub created_at: u64,
    pub purchase_tx_id: PurchaseTxId,
}
