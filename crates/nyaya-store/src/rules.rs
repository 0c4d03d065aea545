//! Versioned, append-only rule corpus.
//!
//! Rows are never overwritten: an update appends a new version and the old
//! one stays addressable, so a verdict issued last month still resolves to
//! the exact text it cited. Readers see the latest version of each rule.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use nyaya_core::{ChargeCategory, LegalRule, RuleId};
use serde::Serialize;
use tracing::info;

use crate::StoreError;

/// Starter corpus compiled into the binary, so a fresh deployment answers
/// without a provisioning step.
const BUILTIN_RULES: &str = include_str!("../data/rules.json");

// ── Load reporting ─────────────────────────────────────────────────────────

/// Outcome of a bulk load: how many records landed, how many were stale
/// duplicates, and which failed to parse or validate.
#[derive(Debug, Default, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_stale: usize,
    pub errors: Vec<LoadIssue>,
}

/// One rejected record, by position in the source array.
#[derive(Debug, Serialize)]
pub struct LoadIssue {
    pub index: usize,
    pub error: String,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ── Store ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Corpus {
    /// Rule id → versions, ascending. The last element is current.
    rules: BTreeMap<RuleId, Vec<LegalRule>>,
    /// Bumped on every successful mutation; caches and indexes key off it.
    stamp: u64,
}

/// Handle to the shared rule corpus. `Clone` is cheap and refers to the
/// same underlying data.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    corpus: Arc<RwLock<Corpus>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the embedded corpus. Fails only if the compiled
    /// data is corrupt, which the test suite rules out.
    pub fn builtin() -> Result<Self, StoreError> {
        let store = Self::new();
        let report = store.load_json(BUILTIN_RULES)?;
        if !report.is_clean() {
            return Err(StoreError::BuiltinCorrupt(report.errors.len()));
        }
        Ok(store)
    }

    /// Insert or update a rule. The store assigns the version: one more
    /// than the current latest, or 1 for a new rule id. `created_at` is
    /// preserved from the first version; `updated_at` is set to now.
    /// Returns the assigned version.
    pub fn upsert(&self, mut rule: LegalRule) -> Result<u32, StoreError> {
        let mut corpus = self.corpus.write().map_err(|_| StoreError::Poisoned)?;
        let versions = corpus.rules.entry(rule.rule_id.clone()).or_default();
        let next = versions.last().map(|r| r.version + 1).unwrap_or(1);
        rule.version = next;
        if let Some(first) = versions.first() {
            rule.created_at = first.created_at;
        }
        rule.updated_at = Utc::now();
        versions.push(rule);
        corpus.stamp += 1;
        Ok(next)
    }

    /// Latest version of a rule, if present.
    pub fn get(&self, id: &RuleId) -> Result<Option<LegalRule>, StoreError> {
        let corpus = self.corpus.read().map_err(|_| StoreError::Poisoned)?;
        Ok(corpus.rules.get(id).and_then(|v| v.last()).cloned())
    }

    /// One specific historical version.
    pub fn get_version(&self, id: &RuleId, version: u32) -> Result<LegalRule, StoreError> {
        let corpus = self.corpus.read().map_err(|_| StoreError::Poisoned)?;
        let versions = corpus
            .rules
            .get(id)
            .ok_or_else(|| StoreError::RuleNotFound(id.clone()))?;
        versions
            .iter()
            .find(|r| r.version == version)
            .cloned()
            .ok_or_else(|| StoreError::VersionNotFound { id: id.clone(), version })
    }

    /// Every stored version of one rule, ascending.
    pub fn history(&self, id: &RuleId) -> Result<Vec<LegalRule>, StoreError> {
        let corpus = self.corpus.read().map_err(|_| StoreError::Poisoned)?;
        corpus
            .rules
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::RuleNotFound(id.clone()))
    }

    /// Snapshot of the latest version of every rule, in id order.
    pub fn all(&self) -> Result<Vec<LegalRule>, StoreError> {
        let corpus = self.corpus.read().map_err(|_| StoreError::Poisoned)?;
        Ok(corpus
            .rules
            .values()
            .filter_map(|v| v.last())
            .cloned()
            .collect())
    }

    /// Latest versions of every rule together with the stamp they belong
    /// to, read under a single lock. Index rebuilds use this so the stamp
    /// can never be newer than the rules it describes.
    pub fn snapshot(&self) -> Result<(Vec<LegalRule>, u64), StoreError> {
        let corpus = self.corpus.read().map_err(|_| StoreError::Poisoned)?;
        let rules = corpus
            .rules
            .values()
            .filter_map(|v| v.last())
            .cloned()
            .collect();
        Ok((rules, corpus.stamp))
    }

    /// Latest versions in one category, in id order.
    pub fn by_category(&self, category: ChargeCategory) -> Result<Vec<LegalRule>, StoreError> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|r| r.category == category)
            .collect())
    }

    /// Corpus version stamp. Changes whenever any rule changes, never
    /// otherwise; derived artifacts compare stamps instead of diffing rows.
    pub fn stamp(&self) -> Result<u64, StoreError> {
        let corpus = self.corpus.read().map_err(|_| StoreError::Poisoned)?;
        Ok(corpus.stamp)
    }

    /// Number of distinct rule ids.
    pub fn rule_count(&self) -> Result<usize, StoreError> {
        let corpus = self.corpus.read().map_err(|_| StoreError::Poisoned)?;
        Ok(corpus.rules.len())
    }

    /// Bulk-load a JSON array of rule records.
    ///
    /// Records keep their declared versions and timestamps. A record whose
    /// version is not newer than what the store already holds for that id
    /// is skipped as stale; a record that fails to parse or validate is
    /// reported with its array index. One bad record never aborts the load.
    pub fn load_json(&self, json: &str) -> Result<LoadReport, StoreError> {
        let records: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(StoreError::NotAnArray)?;

        let mut report = LoadReport::default();
        let mut corpus = self.corpus.write().map_err(|_| StoreError::Poisoned)?;
        for (index, record) in records.into_iter().enumerate() {
            let rule = match serde_json::from_value::<LegalRule>(record) {
                Ok(rule) => rule,
                Err(e) => {
                    report.errors.push(LoadIssue { index, error: e.to_string() });
                    continue;
                }
            };
            if let Err(error) = validate_rule(&rule) {
                report.errors.push(LoadIssue { index, error });
                continue;
            }
            let versions = corpus.rules.entry(rule.rule_id.clone()).or_default();
            match versions.last() {
                Some(last) if rule.version <= last.version => report.skipped_stale += 1,
                _ => {
                    versions.push(rule);
                    report.loaded += 1;
                }
            }
        }
        if report.loaded > 0 {
            corpus.stamp += 1;
        }
        drop(corpus);

        info!(
            loaded = report.loaded,
            skipped = report.skipped_stale,
            errors = report.errors.len(),
            "rule corpus loaded"
        );
        Ok(report)
    }

    /// Bulk-load rules from a JSON file on disk.
    pub fn load_path(&self, path: &Path) -> Result<LoadReport, StoreError> {
        let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.load_json(&json)
    }
}

/// Field-level checks serde cannot express.
fn validate_rule(rule: &LegalRule) -> Result<(), String> {
    for (name, value) in [
        ("law", &rule.law),
        ("section", &rule.section),
        ("description", &rule.description),
        ("penalty", &rule.penalty),
        ("authority", &rule.authority),
        ("complaint_template_id", &rule.complaint_template_id),
    ] {
        if value.trim().is_empty() {
            return Err(format!("rule {}: empty {name}", rule.rule_id));
        }
    }
    if rule.violation_keywords.is_empty() {
        return Err(format!("rule {}: no violation keywords", rule.rule_id));
    }
    if let Some(bad) = rule
        .violation_keywords
        .iter()
        .find(|k| k.as_str() != k.to_lowercase())
    {
        return Err(format!("rule {}: keyword not lowercase: {bad:?}", rule.rule_id));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
