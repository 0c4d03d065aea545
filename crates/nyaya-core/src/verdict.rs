//! The verdict value object returned to callers.

use serde::{Deserialize, Serialize};

use crate::rule::RuleId;

/// Fixed disclaimer carried verbatim on every verdict.
pub const DISCLAIMER: &str = "This automated assessment is for information only and is not \
     legal advice. Consult the cited authority or a qualified professional before acting.";

/// Outcome of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// The charge breaches a cited provision.
    ViolationDetected,
    /// The charge is permitted as described.
    Legal,
    /// The modeled rules cannot decide this case.
    InsufficientInfo,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViolationDetected => "violation_detected",
            Self::Legal => "legal",
            Self::InsufficientInfo => "insufficient_info",
        }
    }
}

/// A (law, section) pair resolving to a stored rule row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub rule_id: RuleId,
    pub law: String,
    pub section: String,
}

/// Final decision for one charge.
///
/// A `ViolationDetected` verdict always carries at least one citation;
/// composing one without citations is a bug upstream and is rewritten to
/// `InsufficientInfo` before it can reach a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    /// One-line finding in the requested language.
    pub title: String,
    /// Sectioned explanation: what was found, what the law says, next steps.
    pub explanation: String,
    /// 0–100, floor of retrieval relevance and extraction confidence.
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    pub disclaimer: String,
}

impl Verdict {
    /// True when the verdict claims a violation but cites nothing.
    pub fn is_unbacked_violation(&self) -> bool {
        self.status == VerdictStatus::ViolationDetected && self.citations.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_string(&VerdictStatus::ViolationDetected).unwrap(),
            "\"violation_detected\""
        );
        assert_eq!(
            serde_json::to_string(&VerdictStatus::InsufficientInfo).unwrap(),
            "\"insufficient_info\""
        );
    }

    #[test]
    fn unbacked_violation_is_flagged() {
        let verdict = Verdict {
            status: VerdictStatus::ViolationDetected,
            title: "Overcharge".into(),
            explanation: String::new(),
            confidence: 90,
            citations: vec![],
            disclaimer: DISCLAIMER.into(),
        };
        assert!(verdict.is_unbacked_violation());

        let legal = Verdict {
            status: VerdictStatus::Legal,
            ..verdict.clone()
        };
        assert!(!legal.is_unbacked_violation());
    }
}
