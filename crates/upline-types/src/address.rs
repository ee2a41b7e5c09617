//! Member wallet addresses.
//!
//! Addresses compare case-insensitively. They are normalized once, on
//! entry, to trimmed lowercase ASCII so every layer below can compare and
//! index them as plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, TypesError};

/// Maximum accepted address length in characters.
pub const MAX_ADDRESS_LEN: usize = 128;

/// A normalized member address.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address.
    ///
    /// # Errors
    ///
    /// - [`TypesError::InvalidAddress`] if the trimmed input is empty, longer
    ///   than [`MAX_ADDRESS_LEN`], or contains anything but ASCII alphanumerics
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > MAX_ADDRESS_LEN
            || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        let a = Address::parse("0xAbCdEf01").expect("parse");
        let b = Address::parse("  0xabcdef01 ").expect("parse");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef01");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Address::parse("").is_err());
        assert!(Address::parse("   ").is_err());
        assert!(Address::parse("0xab cd").is_err());
        assert!(Address::parse("0xab-cd").is_err());
        assert!(Address::parse(&"a".repeat(MAX_ADDRESS_LEN + 1)).is_err());
    }

    #[test]
    fn test_serde_normalizes() {
        let addr: Address = serde_json::from_str("\"0xFEED\"").expect("deserialize");
        assert_eq!(addr.as_str(), "0xfeed");
        assert!(serde_json::from_str::<Address>("\"not valid!\"").is_err());
    }
}
