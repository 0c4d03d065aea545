//! Verdict composition.
//!
//! Status, citations and confidence come from the evaluator untouched; the
//! model is only ever asked to rephrase rendered facts, and whatever it
//! returns must pass a grounding filter before it is used. Any failure on
//! the narrative path falls back to bilingual templates, so composition
//! as a whole cannot fail.

use std::collections::HashSet;
use std::sync::LazyLock;

use nyaya_ai::{CompletionRequest, LanguageCapability};
use nyaya_core::{Citation, Language, StructuredData, Verdict, VerdictStatus, DISCLAIMER};
use regex::Regex;
use tracing::{debug, error, warn};

use crate::config::PipelineConfig;
use crate::evaluate::{Assessment, Fact};

/// Compose the final verdict for an assessment. Never fails: every
/// failure mode inside degrades to template prose.
pub(crate) async fn compose(
    assessment: &Assessment,
    data: &StructuredData,
    language: Language,
    top_relevance: f32,
    capability: &dyn LanguageCapability,
    config: &PipelineConfig,
) -> Verdict {
    let citations: Vec<Citation> = assessment
        .cited
        .iter()
        .map(|rule| Citation {
            rule_id: rule.rule_id.clone(),
            law: rule.law.clone(),
            section: rule.section.clone(),
        })
        .collect();
    let confidence = confidence_score(top_relevance, data, &assessment.consumed_fields);

    let findings = assessment
        .facts
        .iter()
        .map(|f| render_fact(f, language))
        .collect::<Vec<_>>()
        .join(" ");

    let narrative = if assessment.facts.is_empty() {
        None
    } else {
        try_narrative(capability, &findings, &citations, language, config).await
    };
    let lead = narrative.unwrap_or_else(|| findings.clone());

    let mut sections = vec![lead];
    if !assessment.cited.is_empty() {
        let heading = match language {
            Language::En => "What the law says:",
            Language::Hi => "कानून क्या कहता है:",
        };
        for rule in &assessment.cited {
            sections.push(format!(
                "{heading} {}, Section {} — {}",
                rule.law,
                rule.section,
                rule.description_for(language)
            ));
        }
        let primary = &assessment.cited[0];
        sections.push(match language {
            Language::En => format!("Penalty: {}", primary.penalty),
            Language::Hi => format!("दंड: {}", primary.penalty),
        });
        sections.push(match language {
            Language::En => format!("Where to complain: {}", primary.authority),
            Language::Hi => format!("शिकायत कहाँ करें: {}", primary.authority),
        });
        sections.push(match language {
            Language::En => format!(
                "Next steps: file a complaint with {} using template {}.",
                primary.authority, primary.complaint_template_id
            ),
            Language::Hi => format!(
                "अगला कदम: टेम्पलेट {} के साथ {} में शिकायत दर्ज करें।",
                primary.complaint_template_id, primary.authority
            ),
        });
    } else if assessment.status == VerdictStatus::InsufficientInfo {
        sections.push(next_steps_hint(language).to_string());
    }

    let mut verdict = Verdict {
        status: assessment.status,
        title: title_for(assessment, language).to_string(),
        explanation: sections.join("\n"),
        confidence,
        citations,
        disclaimer: DISCLAIMER.to_string(),
    };

    // A violation with no citations must never leave the pipeline,
    // whatever an evaluator did upstream.
    if verdict.is_unbacked_violation() {
        error!("composed a violation without citations; failing closed");
        verdict = insufficient_fallback(language);
    }
    verdict
}

/// Fixed bilingual non-answer used when a verdict cannot be stated safely.
pub(crate) fn insufficient_fallback(language: Language) -> Verdict {
    let (title, body) = match language {
        Language::En => (
            "Not enough information to decide",
            "The available rules cannot decide this case from the details given.",
        ),
        Language::Hi => (
            "निर्णय के लिए पर्याप्त जानकारी नहीं",
            "दिए गए विवरण से उपलब्ध नियम इस मामले का निर्णय नहीं कर सकते।",
        ),
    };
    Verdict {
        status: VerdictStatus::InsufficientInfo,
        title: title.to_string(),
        explanation: format!("{body}\n{}", next_steps_hint(language)),
        confidence: 0,
        citations: Vec::new(),
        disclaimer: DISCLAIMER.to_string(),
    }
}

fn next_steps_hint(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Next steps: provide more detail — for a challan the offence named on it, \
             for an MRP dispute the printed MRP — and try again."
        }
        Language::Hi => {
            "अगला कदम: अधिक विवरण दें — चालान के लिए उस पर लिखा अपराध, एमआरपी विवाद के लिए छपा एमआरपी — और पुनः प्रयास करें।"
        }
    }
}

/// Confidence is the floor of how well the rules matched and how sure the
/// extractor was about the fields the decision consumed, scaled to 0–100.
fn confidence_score(top_relevance: f32, data: &StructuredData, consumed: &[&str]) -> u8 {
    let fields = data.min_confidence(consumed).clamp(0.0, 1.0);
    let grounded = top_relevance.clamp(0.0, 1.0).min(fields);
    (grounded * 100.0).round() as u8
}

fn title_for(assessment: &Assessment, language: Language) -> &'static str {
    use VerdictStatus::*;
    match (assessment.status, language) {
        (ViolationDetected, Language::En) => match assessment.facts.first() {
            Some(Fact::Overcharge { .. }) => "MRP overcharge detected",
            Some(Fact::OffenceExceedsCeiling { .. }) => "Challan exceeds the scheduled fine",
            _ => "Forced service charge detected",
        },
        (ViolationDetected, Language::Hi) => match assessment.facts.first() {
            Some(Fact::Overcharge { .. }) => "एमआरपी से अधिक वसूली पाई गई",
            Some(Fact::OffenceExceedsCeiling { .. }) => "चालान अनुसूचित जुर्माने से अधिक है",
            _ => "जबरन सेवा शुल्क पाया गया",
        },
        (Legal, Language::En) => "No violation found",
        (Legal, Language::Hi) => "कोई उल्लंघन नहीं पाया गया",
        (InsufficientInfo, Language::En) => "Not enough information to decide",
        (InsufficientInfo, Language::Hi) => "निर्णय के लिए पर्याप्त जानकारी नहीं",
    }
}

// ── Fact rendering ─────────────────────────────────────────────────────────

fn render_fact(fact: &Fact, language: Language) -> String {
    match language {
        Language::En => match fact {
            Fact::Overcharge { product, price, mrp, excess } => format!(
                "{product} was billed at {price} against a printed MRP of {mrp}, an overcharge of {excess}."
            ),
            Fact::WithinMrp { product, price, mrp } => {
                format!("{product} was billed at {price}, within the printed MRP of {mrp}.")
            }
            Fact::MrpNotLegible { product } => {
                format!("No printed MRP is legible for {product}.")
            }
            Fact::NoProducts => "No product lines were provided.".to_string(),
            Fact::MandatoryWording { phrase } => format!(
                "The bill presents the service charge as unavoidable (\"{phrase}\")."
            ),
            Fact::VoluntaryWording { phrase } => {
                format!("The service charge is described as discretionary (\"{phrase}\").")
            }
            Fact::NoMandatoryWording => {
                "Nothing shows the service charge was forced; such a charge is voluntary."
                    .to_string()
            }
            Fact::AmountCharged { amount } => format!("The charge in question is {amount}."),
            Fact::OffenceWithinCeiling { offence, ceiling, charged } => format!(
                "The challan of {charged} for \"{offence}\" is within the scheduled maximum of {ceiling}."
            ),
            Fact::OffenceExceedsCeiling { offence, ceiling, charged, excess } => format!(
                "The challan demands {charged} for \"{offence}\" but the schedule caps it at {ceiling}, {excess} too much."
            ),
            Fact::NoOffenceIdentified => {
                "The offence behind this challan could not be identified from the details given."
                    .to_string()
            }
            Fact::AmountMissing => "No challan amount was provided.".to_string(),
            Fact::NoApplicableRules => {
                "No stored rule covers this charge closely enough to judge it.".to_string()
            }
            Fact::UnmodeledCategory => {
                "This charge type is outside the modeled rules.".to_string()
            }
        },
        Language::Hi => match fact {
            Fact::Overcharge { product, price, mrp, excess } => format!(
                "{product} के लिए {price} लिया गया जबकि छपा एमआरपी {mrp} है, यानी {excess} अधिक।"
            ),
            Fact::WithinMrp { product, price, mrp } => {
                format!("{product} के लिए {price} लिया गया, जो छपे एमआरपी {mrp} के भीतर है।")
            }
            Fact::MrpNotLegible { product } => {
                format!("{product} पर छपा एमआरपी स्पष्ट नहीं है।")
            }
            Fact::NoProducts => "कोई उत्पाद विवरण नहीं दिया गया।".to_string(),
            Fact::MandatoryWording { phrase } => {
                format!("बिल में सेवा शुल्क को अनिवार्य बताया गया है (\"{phrase}\")।")
            }
            Fact::VoluntaryWording { phrase } => {
                format!("सेवा शुल्क को स्वैच्छिक बताया गया है (\"{phrase}\")।")
            }
            Fact::NoMandatoryWording => {
                "ऐसा कुछ नहीं दिखता कि सेवा शुल्क जबरन लिया गया; ऐसा शुल्क स्वैच्छिक होता है।".to_string()
            }
            Fact::AmountCharged { amount } => format!("विवादित राशि {amount} है।"),
            Fact::OffenceWithinCeiling { offence, ceiling, charged } => format!(
                "\"{offence}\" के लिए {charged} का चालान अनुसूचित अधिकतम {ceiling} के भीतर है।"
            ),
            Fact::OffenceExceedsCeiling { offence, ceiling, charged, excess } => format!(
                "\"{offence}\" के लिए चालान {charged} मांगता है जबकि अनुसूची की सीमा {ceiling} है, यानी {excess} अधिक।"
            ),
            Fact::NoOffenceIdentified => {
                "दी गई जानकारी से चालान का अपराध पहचाना नहीं जा सका।".to_string()
            }
            Fact::AmountMissing => "चालान की राशि नहीं दी गई।".to_string(),
            Fact::NoApplicableRules => {
                "इस शुल्क पर निर्णय देने लायक कोई संग्रहीत नियम नहीं मिला।".to_string()
            }
            Fact::UnmodeledCategory => {
                "यह शुल्क प्रकार उपलब्ध नियमों की सीमा से बाहर है।".to_string()
            }
        },
    }
}

// ── Narrative phrasing ─────────────────────────────────────────────────────

async fn try_narrative(
    capability: &dyn LanguageCapability,
    findings: &str,
    citations: &[Citation],
    language: Language,
    config: &PipelineConfig,
) -> Option<String> {
    let mut facts = findings.to_string();
    if !citations.is_empty() {
        facts.push_str(" Citations:");
        for citation in citations {
            facts.push_str(&format!(" {}, Section {};", citation.law, citation.section));
        }
    }
    let instructions = match language {
        Language::En => {
            "Rewrite the findings below as two or three plain sentences for a consumer. \
             Use only the facts and citations given: no new numbers, no new laws."
        }
        Language::Hi => {
            "नीचे दिए निष्कर्षों को उपभोक्ता के लिए दो-तीन सरल वाक्यों में लिखिए। केवल दिए गए तथ्य और उद्धरण इस्तेमाल कीजिए: कोई नई संख्या, कोई नया कानून नहीं।"
        }
    };
    let request = CompletionRequest {
        instructions: instructions.to_string(),
        facts: facts.clone(),
        language,
        max_tokens: config.completion_max_tokens,
        temperature: 0.0,
    };

    for attempt in 0..=config.capability_retries {
        match tokio::time::timeout(config.capability_timeout, capability.complete(&request)).await
        {
            Ok(Ok(text)) => {
                let text = text.trim().to_string();
                if narrative_is_grounded(&text, &facts, citations) {
                    return Some(text);
                }
                // Filter rejections are final; only capability failures retry.
                warn!("narrative failed the grounding filter; using template prose");
                return None;
            }
            Ok(Err(e)) => {
                debug!(error = %e, attempt, "narrative completion failed");
            }
            Err(_) => {
                warn!(timeout = ?config.capability_timeout, attempt, "narrative timed out");
            }
        }
    }
    debug!("no narrative available; using template prose");
    None
}

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("static regex"));

/// Words that only appear when naming a statute. Checked after the cited
/// law names are stripped out, so any remaining match is an invention.
static STATUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(act|rules|guidelines|code)\b|अधिनियम|नियम|संहिता").expect("static regex"));

/// True when the narrative introduces no number and no statute beyond what
/// the facts block already contains.
fn narrative_is_grounded(narrative: &str, facts: &str, citations: &[Citation]) -> bool {
    if narrative.is_empty() || narrative.chars().count() > 2_000 {
        return false;
    }
    let allowed: HashSet<String> = NUMBER_RE
        .find_iter(facts)
        .map(|m| normalize_number(m.as_str()))
        .collect();
    for number in NUMBER_RE.find_iter(narrative) {
        if !allowed.contains(&normalize_number(number.as_str())) {
            return false;
        }
    }

    let mut stripped = narrative.to_string();
    for citation in citations {
        stripped = stripped.replace(&citation.law, " ");
    }
    !STATUTE_RE.is_match(&stripped)
}

/// "1,000.00", "1000.0" and "1000" all compare equal.
fn normalize_number(raw: &str) -> String {
    let mut s: String = raw.chars().filter(|c| *c != ',').collect();
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::testutil::rule;
    use async_trait::async_trait;
    use nyaya_ai::{CapabilityError, LexicalCapability};
    use nyaya_core::{ChargeCategory, Money, RuleId};

    fn mrp_assessment() -> Assessment {
        let mut cited = rule("LM-18-1", ChargeCategory::Mrp);
        cited.law = "Legal Metrology Act, 2009".into();
        cited.section = "18(1)".into();
        Assessment {
            status: VerdictStatus::ViolationDetected,
            facts: vec![Fact::Overcharge {
                product: "Soap".into(),
                price: Money::from_rupees(50).unwrap(),
                mrp: Money::from_rupees(45).unwrap(),
                excess: Money::from_rupees(5).unwrap(),
            }],
            cited: vec![cited],
            consumed_fields: vec!["products"],
        }
    }

    fn soap_data() -> StructuredData {
        let mut data = StructuredData {
            charge_type: ChargeCategory::Mrp,
            ..StructuredData::default()
        };
        data.confidence.insert("products".into(), 0.9);
        data
    }

    /// Capability whose `complete` returns a canned narrative.
    struct Scripted(&'static str);

    #[async_trait]
    impl LanguageCapability for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn dim(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
            Ok(vec![0.0; 4])
        }
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CapabilityError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn template_verdict_carries_law_penalty_and_disclaimer() {
        let capability = LexicalCapability::default();
        let verdict = compose(
            &mrp_assessment(),
            &soap_data(),
            Language::En,
            0.8,
            &capability,
            &PipelineConfig::default(),
        )
        .await;

        assert_eq!(verdict.status, VerdictStatus::ViolationDetected);
        assert_eq!(verdict.title, "MRP overcharge detected");
        assert!(verdict.explanation.contains("₹50.00"));
        assert!(verdict.explanation.contains("Legal Metrology Act, 2009"));
        assert!(verdict.explanation.contains("Section 18(1)"));
        assert!(verdict.explanation.contains("Penalty:"));
        assert!(verdict.explanation.contains("Where to complain:"));
        assert_eq!(verdict.disclaimer, DISCLAIMER);
        assert_eq!(verdict.citations.len(), 1);
        assert_eq!(verdict.citations[0].rule_id, RuleId::new("LM-18-1"));
        // min(relevance 0.8, products confidence 0.9) → 80.
        assert_eq!(verdict.confidence, 80);
    }

    #[tokio::test]
    async fn hindi_verdict_uses_hindi_rendering() {
        let capability = LexicalCapability::default();
        let mut assessment = mrp_assessment();
        assessment.cited[0].description_hi = Some("एमआरपी से अधिक बिक्री वर्जित है।".into());
        let verdict = compose(
            &assessment,
            &soap_data(),
            Language::Hi,
            0.8,
            &capability,
            &PipelineConfig::default(),
        )
        .await;

        assert_eq!(verdict.title, "एमआरपी से अधिक वसूली पाई गई");
        assert!(verdict.explanation.contains("एमआरपी से अधिक बिक्री वर्जित है।"));
        assert!(verdict.explanation.contains("कानून क्या कहता है:"));
        // Citations stay in statutory form.
        assert_eq!(verdict.citations[0].law, "Legal Metrology Act, 2009");
    }

    #[tokio::test]
    async fn grounded_narrative_is_accepted() {
        let capability = Scripted(
            "Soap was billed at ₹50 against a printed MRP of ₹45, which the Legal Metrology Act, 2009 does not permit.",
        );
        let verdict = compose(
            &mrp_assessment(),
            &soap_data(),
            Language::En,
            0.8,
            &capability,
            &PipelineConfig::default(),
        )
        .await;
        assert!(verdict.explanation.starts_with("Soap was billed at ₹50"));
    }

    #[tokio::test]
    async fn narrative_with_invented_number_is_rejected() {
        let capability = Scripted("You are owed ₹999 in damages for the Soap.");
        let verdict = compose(
            &mrp_assessment(),
            &soap_data(),
            Language::En,
            0.8,
            &capability,
            &PipelineConfig::default(),
        )
        .await;
        // Fell back to the rendered facts.
        assert!(verdict.explanation.starts_with("Soap was billed at ₹50.00"));
        assert!(!verdict.explanation.contains("999"));
    }

    #[tokio::test]
    async fn narrative_with_uncited_statute_is_rejected() {
        let capability = Scripted("This violates the Indian Penal Code and the cited law.");
        let verdict = compose(
            &mrp_assessment(),
            &soap_data(),
            Language::En,
            0.8,
            &capability,
            &PipelineConfig::default(),
        )
        .await;
        assert!(!verdict.explanation.contains("Indian Penal Code"));
    }

    #[tokio::test]
    async fn unbacked_violation_fails_closed() {
        let mut assessment = mrp_assessment();
        assessment.cited.clear();
        let capability = LexicalCapability::default();
        let verdict = compose(
            &assessment,
            &soap_data(),
            Language::En,
            0.9,
            &capability,
            &PipelineConfig::default(),
        )
        .await;
        assert_eq!(verdict.status, VerdictStatus::InsufficientInfo);
        assert!(verdict.citations.is_empty());
    }

    #[test]
    fn number_normalization_equates_renderings() {
        assert_eq!(normalize_number("1,000.00"), "1000");
        assert_eq!(normalize_number("49.90"), "49.9");
        assert_eq!(normalize_number("18"), "18");
    }

    #[test]
    fn grounding_filter_checks_numbers_and_statutes() {
        let citations = vec![Citation {
            rule_id: RuleId::new("LM-18-1"),
            law: "Legal Metrology Act, 2009".into(),
            section: "18(1)".into(),
        }];
        let facts = "Soap was billed at ₹50.00 against ₹45.00. Citations: Legal Metrology Act, 2009, Section 18(1);";
        assert!(narrative_is_grounded(
            "Paying ₹50 for soap marked ₹45 breaks the Legal Metrology Act, 2009.",
            facts,
            &citations
        ));
        assert!(!narrative_is_grounded("A fine of ₹25,000 applies.", facts, &citations));
        assert!(!narrative_is_grounded(
            "The Consumer Code forbids this.",
            facts,
            &citations
        ));
        assert!(!narrative_is_grounded("", facts, &citations));
    }
}
