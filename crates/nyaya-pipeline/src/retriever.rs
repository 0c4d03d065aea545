//! Candidate retrieval.
//!
//! The semantic pass embeds the request text and ranks rules by cosine
//! similarity plus a bounded keyword bonus, discarding anything under the
//! relevance floor. The keyword-only pass is the degraded mode for when
//! embeddings are unavailable: substring hits on each rule's violation
//! keywords, scored per hit.

use nyaya_ai::{CapabilityError, IndexError, LanguageCapability, SearchIndex};
use nyaya_core::{ChargeCategory, LegalRule, StructuredData};
use nyaya_store::{RuleStore, StoreError};
use thiserror::Error;
use tracing::debug;

use crate::config::PipelineConfig;

/// One rule proposed for evaluation.
#[derive(Debug, Clone)]
pub struct RetrievalCandidate {
    pub rule: LegalRule,
    /// Similarity plus keyword bonus in the semantic pass, hit score in the
    /// keyword-only pass. Always within [0, 1].
    pub relevance: f32,
    pub keyword_hits: usize,
}

#[derive(Debug, Error)]
pub(crate) enum RetrieveError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lowercased text describing the request, fed to the embedder and scanned
/// by the evaluators. Built from typed fields only, so equal inputs always
/// produce equal text.
pub fn request_text(data: &StructuredData, query: Option<&str>) -> String {
    let mut text = String::from(data.charge_type.label());
    if let Some(vendor) = &data.vendor {
        push_part(&mut text, vendor);
    }
    let mut overcharged = false;
    for product in &data.products {
        push_part(&mut text, &product.name);
        if let Some(mrp) = product.mrp
            && product.price > mrp
        {
            overcharged = true;
        }
    }
    if overcharged {
        push_part(&mut text, "price exceeds declared maximum retail price overcharge");
    }
    if let Some(query) = query {
        push_part(&mut text, query);
    }
    text.to_lowercase()
}

fn push_part(text: &mut String, part: &str) {
    if !part.trim().is_empty() {
        text.push(' ');
        text.push_str(part.trim());
    }
}

/// Known categories narrow the search; `Other` ranges over the whole corpus.
fn category_filter(category: ChargeCategory) -> Option<ChargeCategory> {
    match category {
        ChargeCategory::Other => None,
        known => Some(known),
    }
}

fn keyword_hits(rule: &LegalRule, text: &str) -> usize {
    rule.violation_keywords
        .iter()
        .filter(|k| text.contains(k.as_str()))
        .count()
}

fn sort_candidates(candidates: &mut [RetrievalCandidate]) {
    candidates.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.rule.rule_id.cmp(&b.rule.rule_id))
    });
}

/// Ranks stored rules against request text.
#[derive(Debug, Clone)]
pub struct Retriever {
    store: RuleStore,
    index: SearchIndex,
}

impl Retriever {
    pub fn new(store: RuleStore, index: SearchIndex) -> Self {
        Self { store, index }
    }

    /// Semantic pass at the store's current stamp. Fails rather than serve
    /// results from an index built against different rules.
    pub(crate) async fn semantic(
        &self,
        capability: &dyn LanguageCapability,
        text: &str,
        category: ChargeCategory,
        config: &PipelineConfig,
    ) -> Result<Vec<RetrievalCandidate>, RetrieveError> {
        let stamp = self.store.stamp()?;
        let query = capability.embed(text).await?;
        let neighbors =
            self.index
                .nearest(&query, config.retrieval_k, stamp, category_filter(category))?;

        let mut candidates = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            // The stamp check makes a missing rule unreachable; skip one
            // rather than unwrap if that ever changes.
            let Some(rule) = self.store.get(&neighbor.rule_id)? else {
                continue;
            };
            let hits = keyword_hits(&rule, text);
            let relevance =
                (neighbor.similarity + config.keyword_bonus * hits as f32).clamp(0.0, 1.0);
            if relevance >= config.relevance_floor {
                candidates.push(RetrievalCandidate { rule, relevance, keyword_hits: hits });
            }
        }
        sort_candidates(&mut candidates);
        debug!(count = candidates.len(), "semantic retrieval");
        Ok(candidates)
    }

    /// Keyword-only pass: no embeddings involved, so it works with the
    /// capability down and with an index mid-rebuild.
    pub(crate) fn keyword_only(
        &self,
        text: &str,
        category: ChargeCategory,
        config: &PipelineConfig,
    ) -> Result<Vec<RetrievalCandidate>, RetrieveError> {
        let rules = match category_filter(category) {
            Some(c) => self.store.by_category(c)?,
            None => self.store.all()?,
        };
        let mut candidates: Vec<RetrievalCandidate> = rules
            .into_iter()
            .filter_map(|rule| {
                let hits = keyword_hits(&rule, text);
                (hits > 0).then(|| RetrievalCandidate {
                    relevance: (config.keyword_only_hit_score * hits as f32).min(1.0),
                    rule,
                    keyword_hits: hits,
                })
            })
            .collect();
        sort_candidates(&mut candidates);
        candidates.truncate(config.retrieval_k);
        debug!(count = candidates.len(), "keyword-only retrieval");
        Ok(candidates)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
