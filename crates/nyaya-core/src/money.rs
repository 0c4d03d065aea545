//! Rupee amounts as integer paise.
//!
//! Every monetary comparison in the evaluators is an integer comparison on
//! minor units; floats never touch a rupee value. Parsing accepts the shapes
//! that appear on Indian receipts: `50`, `49.99`, `1,250.00`, `₹20`, `Rs. 20`.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const PAISE_PER_RUPEE: i64 = 100;

/// Why an amount string or number was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("negative amount: {0}")]
    Negative(String),
    #[error("more than two decimal places: {0}")]
    TooPrecise(String),
    #[error("not a monetary amount: {0}")]
    Malformed(String),
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

/// A non-negative rupee amount stored as integer paise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Build from integer paise; negative paise are rejected.
    pub fn from_paise(paise: i64) -> Result<Self, MoneyError> {
        if paise < 0 {
            return Err(MoneyError::Negative(paise.to_string()));
        }
        Ok(Money(paise))
    }

    /// Build from whole rupees.
    pub fn from_rupees(rupees: i64) -> Result<Self, MoneyError> {
        let paise = rupees
            .checked_mul(PAISE_PER_RUPEE)
            .ok_or_else(|| MoneyError::OutOfRange(rupees.to_string()))?;
        Self::from_paise(paise)
    }

    /// Amount in paise.
    pub const fn paise(self) -> i64 {
        self.0
    }

    /// `self - other`, floored at zero. The overcharge helper: an amount at
    /// or under the cap yields zero excess.
    pub fn excess_over(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Parse a receipt-style amount: optional currency marker, digit
    /// grouping commas, at most two decimal places.
    pub fn parse(raw: &str) -> Result<Self, MoneyError> {
        let trimmed = strip_currency(raw.trim());
        if trimmed.starts_with('-') {
            return Err(MoneyError::Negative(raw.trim().to_string()));
        }
        let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(MoneyError::Malformed(raw.trim().to_string()));
        }

        let (whole, frac) = match cleaned.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (cleaned.as_str(), None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Malformed(raw.trim().to_string()));
        }
        let frac_paise = match frac {
            None => 0,
            Some(f) if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(MoneyError::Malformed(raw.trim().to_string()));
            }
            Some(f) if f.len() > 2 => {
                return Err(MoneyError::TooPrecise(raw.trim().to_string()));
            }
            Some(f) => {
                // "5" means fifty paise, "05" means five.
                let digits: i64 = f.parse().map_err(|_| MoneyError::Malformed(raw.to_string()))?;
                if f.len() == 1 { digits * 10 } else { digits }
            }
        };

        let rupees: i64 = whole
            .parse()
            .map_err(|_| MoneyError::OutOfRange(raw.trim().to_string()))?;
        let paise = rupees
            .checked_mul(PAISE_PER_RUPEE)
            .and_then(|p| p.checked_add(frac_paise))
            .ok_or_else(|| MoneyError::OutOfRange(raw.trim().to_string()))?;
        Ok(Money(paise))
    }

    /// Two-decimal string without a currency marker, e.g. `"49.99"`.
    pub fn to_decimal_string(self) -> String {
        format!("{}.{:02}", self.0 / PAISE_PER_RUPEE, self.0 % PAISE_PER_RUPEE)
    }
}

fn strip_currency(s: &str) -> &str {
    // Dotted markers first so "Rs." never leaves a stray dot behind.
    for marker in ["₹", "Rs.", "RS.", "rs.", "Rs", "RS", "rs", "INR", "inr"] {
        if let Some(rest) = s.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    s
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.to_decimal_string())
    }
}

// Serialize as a plain decimal string: canonical for fingerprinting and
// unambiguous for humans reading a rule file.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a rupee amount as a number or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                let rupees = i64::try_from(v)
                    .map_err(|_| E::custom(MoneyError::OutOfRange(v.to_string())))?;
                Money::from_rupees(rupees).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                if v < 0 {
                    return Err(E::custom(MoneyError::Negative(v.to_string())));
                }
                Money::from_rupees(v).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                // Route through the string parser: the shortest-round-trip
                // Display of an f64 preserves "49.99" exactly, and anything
                // with more precision is rejected rather than rounded.
                Money::parse(&v.to_string()).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                Money::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
