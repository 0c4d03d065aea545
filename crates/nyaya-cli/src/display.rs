//! Vertical card display for verdicts and rules.

use nyaya_core::{LegalRule, Verdict};
use nyaya_store::LoadReport;

const MAX_SCHEDULE_ROWS: usize = 12;

// ── Verdicts ──

/// Print a verdict as a card: headline, explanation, citations, disclaimer.
pub fn print_verdict(verdict: &Verdict) {
    println!("=== {} ===", verdict.title);
    println!("  {:<12} {}", "status", verdict.status.as_str());
    println!("  {:<12} {}/100", "confidence", verdict.confidence);
    println!();

    for line in verdict.explanation.lines() {
        println!("{line}");
    }
    println!();

    if !verdict.citations.is_empty() {
        println!("Citations");
        for citation in &verdict.citations {
            println!(
                "  {:<14} {}, Section {}",
                citation.rule_id.as_str(),
                citation.law,
                citation.section
            );
        }
        println!();
    }

    println!("{}", verdict.disclaimer);
}

// ── Rules ──

/// Print one rule as a card, penalty schedule included.
pub fn print_rule(rule: &LegalRule) {
    println!("=== {} (v{}) ===", rule.rule_id, rule.version);
    println!("  {:<12} {}", "category", rule.category.as_str());
    println!("  {:<12} {}", "law", rule.law);
    println!("  {:<12} {}", "section", rule.section);
    println!("  {:<12} {}", "description", rule.description);
    if let Some(hindi) = &rule.description_hi {
        println!("  {:<12} {}", "hindi", hindi);
    }
    if !rule.violation_keywords.is_empty() {
        let keywords: Vec<&str> = rule.violation_keywords.iter().map(String::as_str).collect();
        println!("  {:<12} {}", "keywords", keywords.join(", "));
    }
    println!("  {:<12} {}", "penalty", rule.penalty);
    println!("  {:<12} {}", "authority", rule.authority);
    println!("  {:<12} {}", "template", rule.complaint_template_id);
    println!("  {:<12} {}", "updated", rule.updated_at.format("%Y-%m-%d"));

    if let Some(schedule) = &rule.penalty_schedule
        && !schedule.is_empty()
    {
        println!("Schedule ({} offences)", schedule.len());
        for (offence, ceiling) in schedule.iter().take(MAX_SCHEDULE_ROWS) {
            println!("  {:<24} {}", offence, ceiling);
        }
        if schedule.len() > MAX_SCHEDULE_ROWS {
            println!("  ... and {} more", schedule.len() - MAX_SCHEDULE_ROWS);
        }
    }
    println!();
}

/// One row per rule: id, category, law, section, version.
pub fn print_rule_table(rules: &[LegalRule]) {
    if rules.is_empty() {
        println!("(no rules)");
        return;
    }
    println!(
        "{:<14} {:<15} {:<44} {:<36} {:>3}",
        "ID", "CATEGORY", "LAW", "SECTION", "VER"
    );
    for rule in rules {
        println!(
            "{:<14} {:<15} {:<44} {:<36} {:>3}",
            rule.rule_id.as_str(),
            rule.category.as_str(),
            rule.law,
            rule.section,
            rule.version
        );
    }
    println!();
    println!("{} rules", rules.len());
}

// ── Load reports ──

pub fn print_load_report(report: &LoadReport) {
    println!(
        "loaded {}, skipped {} stale, {} errors",
        report.loaded,
        report.skipped_stale,
        report.errors.len()
    );
    for issue in &report.errors {
        println!("  record {}: {}", issue.index, issue.error);
    }
}
