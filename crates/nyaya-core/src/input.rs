//! Normalized transaction input and its validation.
//!
//! `StructuredData` is what an upstream extraction stage hands over: typed
//! fields plus per-field extraction confidence. Deserialization already
//! rejects negative amounts and unknown categories; [`StructuredData::validate`]
//! covers what serde cannot express.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::charge::ChargeCategory;
use crate::money::Money;

/// Why an input was rejected. The one error class callers see verbatim.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("product {index} has an empty name")]
    EmptyProductName { index: usize },
    #[error("confidence for \"{field}\" is {value}, outside 0.0..=1.0")]
    ConfidenceOutOfRange { field: String, value: f32 },
    #[error("query text exceeds {limit} characters")]
    QueryTooLong { limit: usize },
}

/// Longest free-text complaint accepted alongside the structured fields.
pub const MAX_QUERY_LEN: usize = 2_000;

/// One product line as read off a retail bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    pub name: String,
    pub price: Money,
    /// Printed maximum retail price, when legible on the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrp: Option<Money>,
}

/// Normalized facts about one disputed charge.
///
/// Maps are `BTreeMap` so the serialized form is canonical; fingerprints
/// hash these bytes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StructuredData {
    pub charge_type: ChargeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<ProductLine>,
    /// Field name → extraction confidence in `[0, 1]`. Absent means the
    /// extractor did not doubt the field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub confidence: BTreeMap<String, f32>,
}

impl StructuredData {
    /// Checks the constraints serde cannot: non-empty product names and
    /// confidences within `[0, 1]`.
    pub fn validate(&self) -> Result<(), InputError> {
        for (index, product) in self.products.iter().enumerate() {
            if product.name.trim().is_empty() {
                return Err(InputError::EmptyProductName { index });
            }
        }
        for (field, value) in &self.confidence {
            if !(0.0..=1.0).contains(value) {
                return Err(InputError::ConfidenceOutOfRange {
                    field: field.clone(),
                    value: *value,
                });
            }
        }
        Ok(())
    }

    /// Extraction confidence for one field, defaulting to 1.0 when absent.
    pub fn field_confidence(&self, field: &str) -> f32 {
        self.confidence.get(field).copied().unwrap_or(1.0)
    }

    /// Smallest confidence across the named fields; the verdict score is
    /// capped by the shakiest fact it rests on.
    pub fn min_confidence(&self, fields: &[&str]) -> f32 {
        fields
            .iter()
            .map(|f| self.field_confidence(f))
            .fold(1.0, f32::min)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn soap_bill() -> StructuredData {
        serde_json::from_str(
            r#"{
                "charge_type": "mrp",
                "vendor": "Big Mart",
                "products": [{ "name": "Soap", "price": 50, "mrp": 45 }],
                "confidence": { "products": 0.9 }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn accepts_well_formed_input() {
        let data = soap_bill();
        assert!(data.validate().is_ok());
        assert_eq!(data.products[0].price.paise(), 5_000);
        assert_eq!(data.products[0].mrp.unwrap().paise(), 4_500);
    }

    #[test]
    fn rejects_empty_product_name() {
        let mut data = soap_bill();
        data.products[0].name = "   ".into();
        assert!(matches!(
            data.validate(),
            Err(InputError::EmptyProductName { index: 0 })
        ));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut data = soap_bill();
        data.confidence.insert("amount".into(), 1.3);
        assert!(matches!(
            data.validate(),
            Err(InputError::ConfidenceOutOfRange { .. })
        ));
        data.confidence.insert("amount".into(), f32::NAN);
        assert!(data.validate().is_err());
    }

    #[test]
    fn negative_amount_fails_at_deserialization() {
        let parsed: Result<StructuredData, _> =
            serde_json::from_str(r#"{ "charge_type": "mrp", "amount": -10 }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn absent_confidence_defaults_to_full() {
        let data = soap_bill();
        assert_eq!(data.field_confidence("vendor"), 1.0);
        assert_eq!(data.min_confidence(&["products", "vendor"]), 0.9);
    }
}
