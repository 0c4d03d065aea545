//! Versioned legal-rule records.
//!
//! A rule row is immutable once written: an amendment is a new row with the
//! same `rule_id` and a higher `version`, and the superseded row stays
//! addressable so old verdicts remain explainable. Every legal fact a
//! verdict states must trace back to one of these rows.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::charge::ChargeCategory;
use crate::language::Language;
use crate::money::Money;

/// Stable rule identifier, e.g. `LM-18-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One consumer-protection provision, at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalRule {
    pub rule_id: RuleId,
    pub category: ChargeCategory,
    /// Statute or instrument name, e.g. "Legal Metrology Act, 2009".
    pub law: String,
    /// Section or clause within the law, e.g. "18(1)".
    pub section: String,
    pub description: String,
    /// Hindi rendering of the description, used for Hindi verdicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_hi: Option<String>,
    /// Lowercase phrases whose presence in retrieval text marks relevance.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub violation_keywords: BTreeSet<String>,
    /// Penalty wording quoted in explanations.
    pub penalty: String,
    /// Offence label → statutory fine ceiling. Only challan rules carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_schedule: Option<BTreeMap<String, Money>>,
    /// Where to complain, e.g. "Consumer Forum" or "Traffic Police".
    pub authority: String,
    /// Identifier of the complaint letter template for this rule.
    pub complaint_template_id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl LegalRule {
    /// Text fed to the embedder when indexing this rule: category words,
    /// statute name, description and keywords, lowercased.
    pub fn retrieval_text(&self) -> String {
        let mut text = String::with_capacity(
            self.law.len() + self.description.len() + 64,
        );
        text.push_str(self.category.label());
        text.push(' ');
        text.push_str(&self.law);
        text.push(' ');
        text.push_str(&self.description);
        for keyword in &self.violation_keywords {
            text.push(' ');
            text.push_str(keyword);
        }
        text.to_lowercase()
    }

    /// Description in the requested language, falling back to English when
    /// no Hindi rendering exists.
    pub fn description_for(&self, language: Language) -> &str {
        match language {
            Language::Hi => self.description_hi.as_deref().unwrap_or(&self.description),
            Language::En => &self.description,
        }
    }

    /// True when `self` is a newer version of the same rule as `other`.
    pub fn supersedes(&self, other: &LegalRule) -> bool {
        self.rule_id == other.rule_id && self.version > other.version
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
