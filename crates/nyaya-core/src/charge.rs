//! Charge categories shared by transaction inputs and rule records.

use serde::{Deserialize, Serialize};

/// Category of a disputed charge.
///
/// Closed set: evaluator dispatch is an exhaustive match, so a new
/// category is a code change, never a data change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ChargeCategory {
    /// Retail sale above the printed maximum retail price.
    Mrp,
    /// Restaurant or hotel service charge.
    ServiceCharge,
    /// Traffic fine (e-challan).
    Challan,
    /// Anything not modeled above.
    #[default]
    Other,
}

impl ChargeCategory {
    /// Wire name, as stored on rule records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mrp => "mrp",
            Self::ServiceCharge => "service_charge",
            Self::Challan => "challan",
            Self::Other => "other",
        }
    }

    /// Human words for retrieval text, where `service_charge` would
    /// never match a statute's phrasing.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mrp => "mrp maximum retail price overcharge",
            Self::ServiceCharge => "service charge levy",
            Self::Challan => "challan traffic fine",
            Self::Other => "consumer charge",
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for cat in [
            ChargeCategory::Mrp,
            ChargeCategory::ServiceCharge,
            ChargeCategory::Challan,
            ChargeCategory::Other,
        ] {
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{}\"", cat.as_str()));
            let back: ChargeCategory = serde_json::from_str(&json).unwrap();
            assert_eq!(back, cat);
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let parsed: Result<ChargeCategory, _> = serde_json::from_str("\"parking\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn labels_use_human_words() {
        assert!(ChargeCategory::ServiceCharge.label().contains("service charge"));
        assert!(!ChargeCategory::ServiceCharge.label().contains('_'));
    }
}
