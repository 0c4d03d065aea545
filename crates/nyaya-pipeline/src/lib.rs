//! From extracted charge data to a cited verdict.
//!
//! Three stages: retrieve candidate rules, evaluate them with
//! category-specific deterministic logic, compose the verdict. [`Pipeline`]
//! wires the stages together with result caching, timeouts and the
//! degradation ladder; it is the only entry point services should need.

mod compose;
mod config;
pub mod evaluate;
mod pipeline;
mod retriever;

pub use config::PipelineConfig;
pub use pipeline::{AnalysisRequest, Pipeline, RefreshError};
pub use retriever::{request_text, RetrievalCandidate};
