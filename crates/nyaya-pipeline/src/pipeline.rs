//! End-to-end analysis pipeline.
//!
//! `analyze` is the one entry point: validate, consult the cache, retrieve,
//! evaluate, compose, cache. The only error callers ever see is invalid
//! input; everything that can fail past validation degrades instead —
//! semantic retrieval falls back to keyword matching, narrative phrasing
//! falls back to templates, and an undecidable case comes back as an
//! `insufficient_info` verdict rather than an error.

use std::sync::Arc;

use nyaya_ai::{CapabilityError, IndexError, LanguageCapability, SearchIndex};
use nyaya_core::{
    ChargeCategory, Fingerprint, InputError, Language, StructuredData, Verdict, MAX_QUERY_LEN,
};
use nyaya_store::{ResultCache, RuleStore, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::compose::compose;
use crate::config::PipelineConfig;
use crate::evaluate::evaluate;
use crate::retriever::{request_text, RetrievalCandidate, RetrieveError, Retriever};

/// One charge to analyze: extracted fields, the complainant's own words,
/// and the language the verdict should be written in.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub data: StructuredData,
    pub query: Option<String>,
    pub language: Language,
}

/// Why an index rebuild did not complete.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

pub struct Pipeline {
    store: RuleStore,
    index: SearchIndex,
    capability: Arc<dyn LanguageCapability>,
    cache: ResultCache,
    retriever: Retriever,
    config: PipelineConfig,
}

impl Pipeline {
    /// Assemble a pipeline and attempt the initial index build. A failed
    /// build is logged, not fatal: retrieval starts keyword-only and the
    /// next analysis retries the build.
    pub async fn new(
        store: RuleStore,
        capability: Arc<dyn LanguageCapability>,
        config: PipelineConfig,
    ) -> Self {
        let index = SearchIndex::new();
        let cache = ResultCache::new(config.cache_capacity, config.cache_ttl);
        let retriever = Retriever::new(store.clone(), index.clone());
        let pipeline = Self { store, index, capability, cache, retriever, config };
        if let Err(e) = pipeline.refresh_index().await {
            warn!(error = %e, "initial index build failed; retrieval starts keyword-only");
        }
        pipeline
    }

    /// Re-embed the current rule corpus. Returns the number of rules
    /// indexed. Safe to call concurrently with `analyze`.
    pub async fn refresh_index(&self) -> Result<usize, RefreshError> {
        let (rules, stamp) = self.store.snapshot()?;
        let indexed = self.index.rebuild(&rules, stamp, self.capability.as_ref()).await?;
        Ok(indexed)
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Analyze one charge. Invalid input is the only error; every internal
    /// failure degrades to a weaker but still truthful verdict.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, InputError> {
        request.data.validate()?;
        if let Some(query) = request.query.as_deref()
            && query.chars().count() > MAX_QUERY_LEN
        {
            return Err(InputError::QueryTooLong { limit: MAX_QUERY_LEN });
        }

        // A stamp or fingerprint failure only costs us caching.
        let stamp = self.store.stamp().ok();
        let fingerprint = stamp.and_then(|s| {
            Fingerprint::compute(&request.data, request.query.as_deref(), request.language, s)
                .ok()
        });
        if let (Some(fp), Some(s)) = (&fingerprint, stamp)
            && let Some(hit) = self.cache.get(fp, s)
        {
            debug!(fingerprint = %fp, "verdict served from cache");
            return Ok(hit);
        }

        let text = request_text(&request.data, request.query.as_deref());
        let (candidates, degraded) = self.retrieve(&text, request.data.charge_type).await;

        let assessment =
            evaluate(&request.data, &text, &candidates, self.config.max_citations);
        let top_relevance = candidates.first().map(|c| c.relevance).unwrap_or(0.0);
        let verdict = compose(
            &assessment,
            &request.data,
            request.language,
            top_relevance,
            self.capability.as_ref(),
            &self.config,
        )
        .await;

        if let (Some(fp), Some(s)) = (fingerprint, stamp) {
            self.cache.put(fp, s, verdict.clone());
        }
        info!(
            status = verdict.status.as_str(),
            category = request.data.charge_type.as_str(),
            confidence = verdict.confidence,
            citations = verdict.citations.len(),
            candidates = candidates.len(),
            degraded,
            "analysis complete"
        );
        Ok(verdict)
    }

    /// Semantic retrieval with a bounded number of attempts, refreshing the
    /// index once if it turns out to be stale, then the keyword-only
    /// fallback. The bool reports whether the result is degraded.
    async fn retrieve(
        &self,
        text: &str,
        category: ChargeCategory,
    ) -> (Vec<RetrievalCandidate>, bool) {
        let mut refreshed = false;
        for attempt in 0..=self.config.capability_retries {
            let outcome = tokio::time::timeout(
                self.config.capability_timeout,
                self.retriever
                    .semantic(self.capability.as_ref(), text, category, &self.config),
            )
            .await;
            match outcome {
                Ok(Ok(candidates)) => return (candidates, false),
                Ok(Err(RetrieveError::Index(e)))
                    if !refreshed
                        && matches!(
                            e,
                            IndexError::Rebuilding { .. } | IndexError::NotBuilt
                        ) =>
                {
                    debug!(error = %e, attempt, "index stale; refreshing");
                    refreshed = true;
                    if let Err(e) = self.refresh_index().await {
                        warn!(error = %e, "index refresh failed");
                        break;
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, attempt, "semantic retrieval failed");
                }
                Err(_) => {
                    warn!(
                        attempt,
                        timeout = ?self.config.capability_timeout,
                        "semantic retrieval timed out"
                    );
                }
            }
        }

        match self.retriever.keyword_only(text, category, &self.config) {
            Ok(candidates) => (candidates, true),
            Err(e) => {
                warn!(error = %e, "keyword retrieval failed; evaluating without candidates");
                (Vec::new(), true)
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
