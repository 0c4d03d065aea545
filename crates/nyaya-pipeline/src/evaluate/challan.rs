//! Challan evaluator: the demanded amount against the statutory schedule.
//!
//! The offence is identified by matching schedule labels against the
//! request text: the longest matching label wins, ties go to the higher
//! ceiling. No match means no judgement; the schedule is the only ground
//! truth for what a challan may demand.

use nyaya_core::{ChargeCategory, LegalRule, Money, StructuredData, VerdictStatus};

use super::{Assessment, Fact};
use crate::retriever::RetrievalCandidate;

pub(super) fn evaluate(
    data: &StructuredData,
    request_text: &str,
    candidates: &[RetrievalCandidate],
) -> Assessment {
    let consumed = vec!["amount"];
    let Some(amount) = data.amount else {
        return Assessment::insufficient(vec![Fact::AmountMissing], consumed);
    };

    let mut best: Option<(&str, Money, &LegalRule)> = None;
    for candidate in candidates.iter().filter(|c| c.rule.category == ChargeCategory::Challan) {
        let Some(schedule) = &candidate.rule.penalty_schedule else {
            continue;
        };
        for (offence, ceiling) in schedule {
            if !request_text.contains(offence.as_str()) {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_offence, best_ceiling, _)) => {
                    offence.len() > best_offence.len()
                        || (offence.len() == best_offence.len() && *ceiling > best_ceiling)
                }
            };
            if better {
                best = Some((offence, *ceiling, &candidate.rule));
            }
        }
    }

    match best {
        None => Assessment::insufficient(
            vec![Fact::AmountCharged { amount }, Fact::NoOffenceIdentified],
            consumed,
        ),
        Some((offence, ceiling, rule)) if amount > ceiling => Assessment {
            status: VerdictStatus::ViolationDetected,
            facts: vec![Fact::OffenceExceedsCeiling {
                offence: offence.to_string(),
                ceiling,
                charged: amount,
                excess: amount.excess_over(ceiling),
            }],
            cited: vec![rule.clone()],
            consumed_fields: consumed,
        },
        Some((offence, ceiling, rule)) => Assessment {
            status: VerdictStatus::Legal,
            facts: vec![Fact::OffenceWithinCeiling {
                offence: offence.to_string(),
                ceiling,
                charged: amount,
            }],
            cited: vec![rule.clone()],
            consumed_fields: consumed,
        },
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
