//! Request fingerprints for result caching.
//!
//! The fingerprint hashes the canonical JSON of the request together with
//! the rule-corpus version stamp, so a corpus update silently invalidates
//! every derived cache entry with no sweep.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::input::StructuredData;
use crate::language::Language;

/// Fingerprinting failed to canonicalize the request.
#[derive(Debug, Error)]
#[error("canonicalize request: {0}")]
pub struct FingerprintError(#[from] serde_json::Error);

/// Stable identity of one (input, query, language, corpus-version) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

/// Hash input. Field order is fixed and every map inside `StructuredData`
/// is a `BTreeMap`, so equal requests produce identical bytes.
#[derive(Serialize)]
struct Parts<'a> {
    data: &'a StructuredData,
    query: Option<&'a str>,
    language: Language,
    corpus_stamp: u64,
}

impl Fingerprint {
    pub fn compute(
        data: &StructuredData,
        query: Option<&str>,
        language: Language,
        corpus_stamp: u64,
    ) -> Result<Self, FingerprintError> {
        let bytes = serde_json::to_vec(&Parts { data, query, language, corpus_stamp })?;
        let digest = Sha256::digest(&bytes);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push(HEX[(byte >> 4) as usize] as char);
            hex.push(HEX[(byte & 0x0f) as usize] as char);
        }
        Ok(Fingerprint(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::ChargeCategory;
    use crate::money::Money;

    fn data(amount_rupees: i64) -> StructuredData {
        StructuredData {
            charge_type: ChargeCategory::ServiceCharge,
            amount: Some(Money::from_rupees(amount_rupees).unwrap()),
            vendor: Some("Cafe X".into()),
            ..StructuredData::default()
        }
    }

    #[test]
    fn equal_requests_share_a_fingerprint() {
        let a = Fingerprint::compute(&data(200), Some("is this legal"), Language::En, 7).unwrap();
        let b = Fingerprint::compute(&data(200), Some("is this legal"), Language::En, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn any_field_changes_the_fingerprint() {
        let base = Fingerprint::compute(&data(200), None, Language::En, 7).unwrap();
        let amount = Fingerprint::compute(&data(201), None, Language::En, 7).unwrap();
        let query = Fingerprint::compute(&data(200), Some("q"), Language::En, 7).unwrap();
        let language = Fingerprint::compute(&data(200), None, Language::Hi, 7).unwrap();
        let stamp = Fingerprint::compute(&data(200), None, Language::En, 8).unwrap();
        for other in [&amount, &query, &language, &stamp] {
            assert_ne!(&base, other);
        }
    }

    #[test]
    fn map_insertion_order_does_not_matter() {
        let mut first = data(200);
        first.confidence.insert("amount".into(), 0.8);
        first.confidence.insert("vendor".into(), 0.6);
        let mut second = data(200);
        second.confidence.insert("vendor".into(), 0.6);
        second.confidence.insert("amount".into(), 0.8);

        let a = Fingerprint::compute(&first, None, Language::En, 1).unwrap();
        let b = Fingerprint::compute(&second, None, Language::En, 1).unwrap();
        assert_eq!(a, b);
    }
}
