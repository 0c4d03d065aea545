//! MRP evaluator: integer comparison of billed price against printed MRP,
//! per product line.

use nyaya_core::{ChargeCategory, StructuredData, VerdictStatus};

use super::{cite, Assessment, Fact};
use crate::retriever::RetrievalCandidate;

pub(super) fn evaluate(
    data: &StructuredData,
    candidates: &[RetrievalCandidate],
    max_citations: usize,
) -> Assessment {
    let consumed = vec!["products"];
    if data.products.is_empty() {
        return Assessment::insufficient(vec![Fact::NoProducts], consumed);
    }

    let mut facts = Vec::with_capacity(data.products.len());
    let mut overcharged = false;
    let mut judged = false;
    for product in &data.products {
        match product.mrp {
            Some(mrp) if product.price > mrp => {
                overcharged = true;
                judged = true;
                facts.push(Fact::Overcharge {
                    product: product.name.clone(),
                    price: product.price,
                    mrp,
                    excess: product.price.excess_over(mrp),
                });
            }
            Some(mrp) => {
                judged = true;
                facts.push(Fact::WithinMrp {
                    product: product.name.clone(),
                    price: product.price,
                    mrp,
                });
            }
            None => facts.push(Fact::MrpNotLegible { product: product.name.clone() }),
        }
    }

    let cited = cite(candidates, ChargeCategory::Mrp, max_citations);
    if overcharged {
        // A violation claim must cite law; with nothing retrieved the
        // arithmetic finding alone cannot be asserted.
        if cited.is_empty() {
            return Assessment::insufficient(facts, consumed);
        }
        return Assessment {
            status: VerdictStatus::ViolationDetected,
            facts,
            cited,
            consumed_fields: consumed,
        };
    }
    if judged {
        return Assessment {
            status: VerdictStatus::Legal,
            facts,
            cited,
            consumed_fields: consumed,
        };
    }
    // Products present but no legible MRP on any of them.
    Assessment::insufficient(facts, consumed)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::testutil::candidate;
    use super::*;
    use nyaya_core::{ChargeCategory, Money, ProductLine};

    fn bill(lines: Vec<ProductLine>) -> StructuredData {
        StructuredData {
            charge_type: ChargeCategory::Mrp,
            products: lines,
            ..StructuredData::default()
        }
    }

    fn line(name: &str, price: i64, mrp: Option<i64>) -> ProductLine {
        ProductLine {
            name: name.into(),
            price: Money::from_rupees(price).unwrap(),
            mrp: mrp.map(|m| Money::from_rupees(m).unwrap()),
        }
    }

    fn mrp_candidates() -> Vec<RetrievalCandidate> {
        vec![candidate("LM-18-1", ChargeCategory::Mrp, 0.8)]
    }

    #[test]
    fn price_above_mrp_is_a_violation() {
        let data = bill(vec![line("Soap", 50, Some(45))]);
        let assessment = evaluate(&data, &mrp_candidates(), 3);
        assert_eq!(assessment.status, VerdictStatus::ViolationDetected);
        assert_eq!(assessment.cited[0].rule_id.as_str(), "LM-18-1");
        assert!(matches!(
            &assessment.facts[0],
            Fact::Overcharge { excess, .. } if excess.paise() == 500
        ));
    }

    #[test]
    fn price_at_mrp_is_legal() {
        let data = bill(vec![line("Soap", 45, Some(45))]);
        let assessment = evaluate(&data, &mrp_candidates(), 3);
        assert_eq!(assessment.status, VerdictStatus::Legal);
        assert!(matches!(&assessment.facts[0], Fact::WithinMrp { .. }));
    }

    #[test]
    fn one_overcharged_line_decides_the_bill() {
        let data = bill(vec![
            line("Soap", 45, Some(45)),
            line("Shampoo", 120, Some(99)),
            line("Loose rice", 80, None),
        ]);
        let assessment = evaluate(&data, &mrp_candidates(), 3);
        assert_eq!(assessment.status, VerdictStatus::ViolationDetected);
        assert_eq!(assessment.facts.len(), 3);
    }

    #[test]
    fn no_legible_mrp_is_insufficient() {
        let data = bill(vec![line("Loose rice", 80, None)]);
        let assessment = evaluate(&data, &mrp_candidates(), 3);
        assert_eq!(assessment.status, VerdictStatus::InsufficientInfo);
        assert!(matches!(&assessment.facts[0], Fact::MrpNotLegible { .. }));
    }

    #[test]
    fn no_products_is_insufficient() {
        let data = bill(vec![]);
        let assessment = evaluate(&data, &mrp_candidates(), 3);
        assert_eq!(assessment.status, VerdictStatus::InsufficientInfo);
        assert_eq!(assessment.facts, vec![Fact::NoProducts]);
    }

    #[test]
    fn overcharge_without_citable_rules_stays_unasserted() {
        let data = bill(vec![line("Soap", 50, Some(45))]);
        let assessment = evaluate(&data, &[], 3);
        assert_eq!(assessment.status, VerdictStatus::InsufficientInfo);
    }
}
