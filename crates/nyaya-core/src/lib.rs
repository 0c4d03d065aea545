//! Core domain types for the nyaya violation-detection pipeline.
//!
//! Everything downstream — the rule store, the retrieval index, the
//! evaluators and the composer — speaks these types. The crate has no I/O
//! and no async; it is safe to depend on from anywhere.

pub mod charge;
pub mod fingerprint;
pub mod input;
pub mod language;
pub mod money;
pub mod rule;
pub mod verdict;

pub use charge::ChargeCategory;
pub use fingerprint::{Fingerprint, FingerprintError};
pub use input::{InputError, ProductLine, StructuredData, MAX_QUERY_LEN};
pub use language::Language;
pub use money::{Money, MoneyError};
pub use rule::{LegalRule, RuleId};
pub use verdict::{Citation, Verdict, VerdictStatus, DISCLAIMER};
