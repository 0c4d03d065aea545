//! Deterministic category evaluators.
//!
//! An evaluator is a pure function of the input, the request text and the
//! retrieved candidates: same arguments, same assessment. No clock, no
//! randomness, no model. Evaluators emit typed [`Fact`]s; narrative prose
//! may restate facts but can never add to them.

mod challan;
mod mrp;
mod service;

pub use service::{MANDATORY_WORDING, VOLUNTARY_WORDING};

use nyaya_core::{ChargeCategory, LegalRule, Money, StructuredData, VerdictStatus};
use serde::Serialize;

use crate::retriever::RetrievalCandidate;

/// A verified finding. This closed set is everything a verdict is allowed
/// to claim. Serializable so audit logs can carry the reasoning verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    Overcharge { product: String, price: Money, mrp: Money, excess: Money },
    WithinMrp { product: String, price: Money, mrp: Money },
    MrpNotLegible { product: String },
    NoProducts,
    MandatoryWording { phrase: String },
    VoluntaryWording { phrase: String },
    NoMandatoryWording,
    AmountCharged { amount: Money },
    OffenceWithinCeiling { offence: String, ceiling: Money, charged: Money },
    OffenceExceedsCeiling { offence: String, ceiling: Money, charged: Money, excess: Money },
    NoOffenceIdentified,
    AmountMissing,
    NoApplicableRules,
    UnmodeledCategory,
}

/// Evaluator output: the status, the facts that justify it, the rules that
/// back it, and which input fields the decision consumed (these cap the
/// verdict confidence).
#[derive(Debug, Clone)]
pub struct Assessment {
    pub status: VerdictStatus,
    pub facts: Vec<Fact>,
    pub cited: Vec<LegalRule>,
    pub consumed_fields: Vec<&'static str>,
}

impl Assessment {
    fn insufficient(facts: Vec<Fact>, consumed_fields: Vec<&'static str>) -> Self {
        Self {
            status: VerdictStatus::InsufficientInfo,
            facts,
            cited: Vec::new(),
            consumed_fields,
        }
    }
}

/// Dispatch on the charge category. Total by construction: every category
/// has an evaluator and every evaluator returns an assessment, so analysis
/// always reaches composition. A request no stored rule is relevant to is
/// not judged at all — neither "legal" nor "violation" may be pronounced
/// without a rule to pronounce it from.
pub fn evaluate(
    data: &StructuredData,
    request_text: &str,
    candidates: &[RetrievalCandidate],
    max_citations: usize,
) -> Assessment {
    match data.charge_type {
        ChargeCategory::Other => {
            Assessment::insufficient(vec![Fact::UnmodeledCategory], Vec::new())
        }
        _ if candidates.is_empty() => {
            Assessment::insufficient(vec![Fact::NoApplicableRules], Vec::new())
        }
        ChargeCategory::Mrp => mrp::evaluate(data, candidates, max_citations),
        ChargeCategory::ServiceCharge => {
            service::evaluate(data, request_text, candidates, max_citations)
        }
        ChargeCategory::Challan => challan::evaluate(data, request_text, candidates),
    }
}

/// Top candidates in one category, cloned for citation.
fn cite(
    candidates: &[RetrievalCandidate],
    category: ChargeCategory,
    max: usize,
) -> Vec<LegalRule> {
    candidates
        .iter()
        .filter(|c| c.rule.category == category)
        .take(max)
        .map(|c| c.rule.clone())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testutil::candidate;
    use super::*;

    #[test]
    fn other_category_is_never_judged() {
        let data = StructuredData {
            charge_type: ChargeCategory::Other,
            amount: Some(Money::from_rupees(999).unwrap()),
            ..StructuredData::default()
        };
        let candidates = vec![candidate("CPA-35", ChargeCategory::Other, 0.9)];
        let assessment = evaluate(&data, "consumer charge", &candidates, 3);
        assert_eq!(assessment.status, VerdictStatus::InsufficientInfo);
        assert_eq!(assessment.facts, vec![Fact::UnmodeledCategory]);
        assert!(assessment.cited.is_empty());
    }

    #[test]
    fn no_candidates_means_no_pronouncement() {
        let data = StructuredData {
            charge_type: ChargeCategory::ServiceCharge,
            amount: Some(Money::from_rupees(200).unwrap()),
            ..StructuredData::default()
        };
        let assessment = evaluate(&data, "service charge levy", &[], 3);
        assert_eq!(assessment.status, VerdictStatus::InsufficientInfo);
        assert_eq!(assessment.facts, vec![Fact::NoApplicableRules]);
        assert!(assessment.cited.is_empty());
    }

    #[test]
    fn facts_serialize_with_snake_case_tags() {
        let fact = Fact::Overcharge {
            product: "Soap".into(),
            price: Money::from_rupees(50).unwrap(),
            mrp: Money::from_rupees(45).unwrap(),
            excess: Money::from_rupees(5).unwrap(),
        };
        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["overcharge"]["excess"], "5.00");
        assert_eq!(
            serde_json::to_value(&Fact::NoOffenceIdentified).unwrap(),
            serde_json::Value::String("no_offence_identified".into())
        );
    }

    #[test]
    fn cite_filters_by_category_and_caps() {
        let candidates = vec![
            candidate("A", ChargeCategory::Mrp, 0.9),
            candidate("B", ChargeCategory::ServiceCharge, 0.8),
            candidate("C", ChargeCategory::Mrp, 0.7),
            candidate("D", ChargeCategory::Mrp, 0.6),
        ];
        let cited = cite(&candidates, ChargeCategory::Mrp, 2);
        assert_eq!(cited.len(), 2);
        assert_eq!(cited[0].rule_id.as_str(), "A");
        assert_eq!(cited[1].rule_id.as_str(), "C");
    }
}
