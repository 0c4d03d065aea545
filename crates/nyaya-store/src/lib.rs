//! Storage layer: versioned rule corpus and fingerprint-keyed result cache.

mod cache;
mod error;
mod rules;

pub use cache::ResultCache;
pub use error::StoreError;
pub use rules::{LoadIssue, LoadReport, RuleStore};
