//! In-memory cosine index over rule retrieval text.
//!
//! The index is an immutable snapshot tied to one rule-corpus stamp.
//! Queries state the stamp they expect; a mismatch is an error, never a
//! silently stale answer. Rebuilds swap the snapshot atomically and are
//! monotonic under races: an older snapshot never replaces a newer one.

use std::sync::{Arc, RwLock};

use nyaya_core::{ChargeCategory, LegalRule, RuleId};
use thiserror::Error;
use tracing::info;

use crate::capability::{CapabilityError, LanguageCapability};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index not built yet")]
    NotBuilt,

    #[error("index is at corpus stamp {index_stamp}, store is at {store_stamp}")]
    Rebuilding { index_stamp: u64, store_stamp: u64 },

    #[error("index is empty")]
    Empty,

    #[error("query vector has {query} lanes, index has {index}")]
    DimMismatch { query: usize, index: usize },

    #[error("index lock poisoned")]
    Poisoned,
}

/// One scored index hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub rule_id: RuleId,
    pub category: ChargeCategory,
    /// Cosine similarity in [-1, 1]; vectors are unit length so this is a
    /// plain dot product.
    pub similarity: f32,
}

#[derive(Debug)]
struct Entry {
    rule_id: RuleId,
    category: ChargeCategory,
    vector: Vec<f32>,
}

#[derive(Debug)]
struct Snapshot {
    stamp: u64,
    dim: usize,
    entries: Vec<Entry>,
}

/// Shared cosine index. `Clone` hands out another handle to the same
/// snapshot slot.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    snapshot: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed every rule's retrieval text and swap in a snapshot stamped
    /// `stamp`. Returns the number of indexed rules.
    ///
    /// Callers read the rules and the stamp from the store before calling,
    /// so a store mutated mid-rebuild simply yields a snapshot whose stamp
    /// no longer matches and the next query reports `Rebuilding`.
    pub async fn rebuild(
        &self,
        rules: &[LegalRule],
        stamp: u64,
        capability: &dyn LanguageCapability,
    ) -> Result<usize, CapabilityError> {
        let texts: Vec<String> = rules.iter().map(|r| r.retrieval_text()).collect();
        let vectors = capability.embed_batch(&texts).await?;
        if vectors.len() != rules.len() {
            return Err(CapabilityError::Unavailable(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                rules.len()
            )));
        }

        let entries = rules
            .iter()
            .zip(vectors)
            .map(|(rule, vector)| Entry {
                rule_id: rule.rule_id.clone(),
                category: rule.category,
                vector,
            })
            .collect::<Vec<_>>();
        let count = entries.len();
        let next = Arc::new(Snapshot { stamp, dim: capability.dim(), entries });

        if let Ok(mut slot) = self.snapshot.write() {
            let superseded = slot.as_ref().is_some_and(|current| current.stamp > stamp);
            if !superseded {
                *slot = Some(next);
                info!(stamp, rules = count, "search index rebuilt");
            }
        }
        Ok(count)
    }

    /// Stamp of the current snapshot, if one has been built.
    pub fn stamp(&self) -> Option<u64> {
        self.snapshot
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|s| s.stamp))
    }

    /// The `k` most similar rules, best first, ties broken by rule id.
    ///
    /// `expected_stamp` must equal the snapshot's stamp; `category` narrows
    /// the candidate set before scoring when given.
    pub fn nearest(
        &self,
        query: &[f32],
        k: usize,
        expected_stamp: u64,
        category: Option<ChargeCategory>,
    ) -> Result<Vec<Neighbor>, IndexError> {
        let slot = self.snapshot.read().map_err(|_| IndexError::Poisoned)?;
        let snapshot = slot.as_ref().ok_or(IndexError::NotBuilt)?;
        if snapshot.stamp != expected_stamp {
            return Err(IndexError::Rebuilding {
                index_stamp: snapshot.stamp,
                store_stamp: expected_stamp,
            });
        }
        if snapshot.entries.is_empty() {
            return Err(IndexError::Empty);
        }
        if query.len() != snapshot.dim {
            return Err(IndexError::DimMismatch { query: query.len(), index: snapshot.dim });
        }

        let mut hits: Vec<Neighbor> = snapshot
            .entries
            .iter()
            .filter(|e| category.is_none_or(|c| e.category == c))
            .map(|e| Neighbor {
                rule_id: e.rule_id.clone(),
                category: e.category,
                similarity: dot(query, &e.vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// ── Tests ──────────────────────────────────────────────────────────────────
