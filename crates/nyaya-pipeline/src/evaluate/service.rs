//! Service-charge evaluator: wording decides, not the amount.
//!
//! Since the 2022 CCPA guidelines a service charge is lawful only as a
//! voluntary payment. The evaluator scans the request text for wording
//! showing the levy was presented as unavoidable; absent such wording, or
//! with an explicit voluntary marking present, the charge stays lawful.

use nyaya_core::{ChargeCategory, StructuredData, VerdictStatus};

use super::{cite, Assessment, Fact};
use crate::retriever::RetrievalCandidate;

/// Phrases that mark a levy as forced. Matched as substrings of the
/// lowercased request text.
pub const MANDATORY_WORDING: &[&str] = &[
    "mandatory",
    "compulsory",
    "service charge included",
    "service charge added",
    "forcibly",
];

/// Phrases that mark a levy as discretionary.
pub const VOLUNTARY_WORDING: &[&str] = &[
    "voluntary",
    "optional",
    "at your discretion",
    "may be removed",
];

pub(super) fn evaluate(
    data: &StructuredData,
    request_text: &str,
    candidates: &[RetrievalCandidate],
    max_citations: usize,
) -> Assessment {
    let consumed = vec!["amount", "vendor"];
    let mut facts = Vec::new();
    if let Some(amount) = data.amount {
        facts.push(Fact::AmountCharged { amount });
    }

    let mandatory = MANDATORY_WORDING.iter().find(|p| request_text.contains(**p));
    let voluntary = VOLUNTARY_WORDING.iter().find(|p| request_text.contains(**p));
    let cited = cite(candidates, ChargeCategory::ServiceCharge, max_citations);

    if let Some(phrase) = mandatory {
        facts.push(Fact::MandatoryWording { phrase: (*phrase).to_string() });
    }
    if let Some(phrase) = voluntary {
        facts.push(Fact::VoluntaryWording { phrase: (*phrase).to_string() });
    }

    // A violation needs forced wording AND no voluntary framing anywhere
    // in the text; a levy marked voluntary is lawful however it is styled.
    match (mandatory, voluntary) {
        (Some(_), None) => {
            if cited.is_empty() {
                return Assessment::insufficient(facts, consumed);
            }
            Assessment {
                status: VerdictStatus::ViolationDetected,
                facts,
                cited,
                consumed_fields: consumed,
            }
        }
        (None, None) => {
            facts.push(Fact::NoMandatoryWording);
            Assessment {
                status: VerdictStatus::Legal,
                facts,
                cited,
                consumed_fields: consumed,
            }
        }
        _ => Assessment {
            status: VerdictStatus::Legal,
            facts,
            cited,
            consumed_fields: consumed,
        },
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::testutil::candidate;
    use super::*;
    use nyaya_core::Money;

    fn cafe_bill() -> StructuredData {
        StructuredData {
            charge_type: ChargeCategory::ServiceCharge,
            amount: Some(Money::from_rupees(200).unwrap()),
            vendor: Some("Cafe X".into()),
            ..StructuredData::default()
        }
    }

    fn sc_candidates() -> Vec<RetrievalCandidate> {
        vec![candidate("CCPA-SC-4", ChargeCategory::ServiceCharge, 0.7)]
    }

    #[test]
    fn forced_wording_is_a_violation() {
        let assessment = evaluate(
            &cafe_bill(),
            "service charge levy cafe x the bill says service charge is mandatory",
            &sc_candidates(),
            3,
        );
        assert_eq!(assessment.status, VerdictStatus::ViolationDetected);
        assert!(assessment
            .facts
            .iter()
            .any(|f| matches!(f, Fact::MandatoryWording { phrase } if phrase == "mandatory")));
        assert_eq!(assessment.cited[0].rule_id.as_str(), "CCPA-SC-4");
    }

    #[test]
    fn plain_levy_without_wording_is_legal() {
        let assessment = evaluate(
            &cafe_bill(),
            "service charge levy cafe x",
            &sc_candidates(),
            3,
        );
        assert_eq!(assessment.status, VerdictStatus::Legal);
        assert!(assessment.facts.contains(&Fact::NoMandatoryWording));
        assert!(assessment
            .facts
            .iter()
            .any(|f| matches!(f, Fact::AmountCharged { amount } if amount.paise() == 20_000)));
    }

    #[test]
    fn voluntary_wording_is_legal() {
        let assessment = evaluate(
            &cafe_bill(),
            "service charge levy the menu says service charge is optional",
            &sc_candidates(),
            3,
        );
        assert_eq!(assessment.status, VerdictStatus::Legal);
        assert!(assessment
            .facts
            .iter()
            .any(|f| matches!(f, Fact::VoluntaryWording { phrase } if phrase == "optional")));
    }

    #[test]
    fn voluntary_framing_defeats_forced_wording() {
        let assessment = evaluate(
            &cafe_bill(),
            "menu says optional but the bill made it compulsory",
            &sc_candidates(),
            3,
        );
        assert_eq!(assessment.status, VerdictStatus::Legal);
        assert!(assessment
            .facts
            .iter()
            .any(|f| matches!(f, Fact::MandatoryWording { .. })));
        assert!(assessment
            .facts
            .iter()
            .any(|f| matches!(f, Fact::VoluntaryWording { .. })));
    }

    #[test]
    fn forced_wording_without_citable_rules_stays_unasserted() {
        let assessment = evaluate(&cafe_bill(), "service charge mandatory", &[], 3);
        assert_eq!(assessment.status, VerdictStatus::InsufficientInfo);
    }
}
