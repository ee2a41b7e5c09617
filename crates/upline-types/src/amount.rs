//! Fixed-point amounts.
//!
//! Balances, purchase amounts and commissions are all `u64` micro-units
//! ([`MICRO_UNITS_PER_UNIT`] per unit). Values must also fit in an SQLite
//! `INTEGER`, so the usable range stops at `i64::MAX`.

use crate::{Result, TypesError, MICRO_UNITS_PER_UNIT};

/// Number of fractional decimal digits carried by a micro-unit amount.
pub const DECIMALS: usize = 6;

/// Largest amount that can be stored.
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

/// Parse a decimal string such as `"1000"` or `"12.5"` into micro-units.
///
/// # Errors
///
/// - [`TypesError::InvalidAmount`] on a sign, an empty component, more than
///   [`DECIMALS`] fractional digits, non-digit characters, or overflow past
///   [`MAX_AMOUNT`]
pub fn parse_units(raw: &str) -> Result<u64> {
    let invalid = || TypesError::InvalidAmount(raw.to_string());
    let s = raw.trim();

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > DECIMALS
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
        || (s.contains('.') && frac.is_empty())
    {
        return Err(invalid());
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let mut frac_micro: u64 = 0;
    for (i, b) in frac.bytes().enumerate() {
        frac_micro += u64::from(b - b'0') * 10u64.pow((DECIMALS - 1 - i) as u32);
    }

    let total = whole
        .checked_mul(MICRO_UNITS_PER_UNIT)
        .and_then(|w| w.checked_add(frac_micro))
        .ok_or_else(invalid)?;
    if total > MAX_AMOUNT {
        return Err(invalid());
    }
    Ok(total)
}

/// Format micro-units as a decimal string, trimming trailing zeros.
pub fn format_units(micro: u64) -> String {
    let whole = micro / MICRO_UNITS_PER_UNIT;
    let frac = micro % MICRO_UNITS_PER_UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(parse_units("1000").expect("parse"), 1_000_000_000);
        assert_eq!(parse_units("12.5").expect("parse"), 12_500_000);
        assert_eq!(parse_units("0.000001").expect("parse"), 1);
        assert_eq!(parse_units(".25").expect("parse"), 250_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", ".", "-1", "+1", "1.", "1.0000001", "1e6", "12,5", "abc"] {
            assert!(parse_units(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_overflow() {
        assert!(parse_units("99999999999999999999").is_err());
        assert!(parse_units("9223372036855").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_units(30_000_000), "30");
        assert_eq!(format_units(3_500_000), "3.5");
        assert_eq!(format_units(1), "0.000001");
        assert_eq!(format_units(0), "0");
    }
}
