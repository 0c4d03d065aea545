use nyaya_core::RuleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rule not found: {0}")]
    RuleNotFound(RuleId),

    #[error("rule {id} has no version {version}")]
    VersionNotFound { id: RuleId, version: u32 },

    #[error("rules file is not a JSON array: {0}")]
    NotAnArray(serde_json::Error),

    #[error("embedded corpus is corrupt: {0} records failed validation")]
    BuiltinCorrupt(usize),

    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}
