//! Pipeline tuning knobs, with defaults that hold for the builtin corpus.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Candidates fetched from the index before filtering.
    pub retrieval_k: usize,
    /// Candidates below this relevance are discarded outright.
    pub relevance_floor: f32,
    /// Added per distinct violation keyword found in the request text;
    /// the boosted relevance is capped at 1.0.
    pub keyword_bonus: f32,
    /// Relevance per keyword hit when running without embeddings.
    pub keyword_only_hit_score: f32,
    /// Budget for one capability call (embed or complete).
    pub capability_timeout: Duration,
    /// Extra attempts after a failed capability call.
    pub capability_retries: u32,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    /// Citations carried on a verdict, best first.
    pub max_citations: usize,
    pub completion_max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval_k: 10,
            relevance_floor: 0.15,
            keyword_bonus: 0.10,
            keyword_only_hit_score: 0.25,
            capability_timeout: Duration::from_secs(2),
            capability_retries: 1,
            cache_capacity: 1024,
            cache_ttl: Duration::from_secs(15 * 60),
            max_citations: 3,
            completion_max_tokens: 256,
        }
    }
}
