//! Cascade pass: dependent totals computed from collected aggregates
//!
//! Runs strictly after the aggregation formulas of the same batch; it reads
//! their outputs from the collector instead of recomputing them. The
//! classic instance is the service-tax rule: for every contract, sum the
//! SUM-aggregates of its services and multiply by the contract's ISS rate.

use formular_model::EntityStore;
use rust_decimal::Decimal;

use crate::collector::ResultCollector;

/// Marker substring that queues a formula for the cascade pass
pub const CASCADE_MARKER: &str = "TotalDosServicos";

/// Configuration of the cascade computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeRule {
    /// Type tag of the entities receiving the dependent total
    pub aggregator_type: String,
    /// Type tag of the related entities whose aggregates are summed
    pub leaf_type: String,
    /// Rate attribute read from the aggregator entity
    pub rate_attr: String,
    /// Description prefix selecting the source aggregate on each leaf
    pub source_prefix: String,
    /// Key of the computed attribute attached to the aggregator
    pub output_key: String,
}

impl Default for CascadeRule {
    fn default() -> Self {
        Self {
            aggregator_type: "Contract".to_string(),
            leaf_type: "Servico".to_string(),
            rate_attr: "ISS".to_string(),
            source_prefix: "SUM".to_string(),
            output_key: "Tributo".to_string(),
        }
    }
}

impl CascadeRule {
    /// Whether a formula belongs to the cascade pass
    pub fn matches(&self, formula: &str) -> bool {
        formula.contains(CASCADE_MARKER)
    }
}

/// One computed dependent total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeRecord {
    pub entity_id: String,
    /// Derivation trace embedding both operands
    pub description: String,
    pub value: Decimal,
}

/// Compute the dependent total for every aggregator entity
///
/// Per leaf, the first computed attribute whose description starts with the
/// configured prefix contributes its value; leaves without one (or with a
/// non-numeric one) contribute zero, as does a missing or non-numeric rate
/// attribute. No related leaves means a total of zero.
pub fn evaluate_cascade(
    store: &EntityStore,
    rule: &CascadeRule,
    collector: &ResultCollector,
) -> Vec<CascadeRecord> {
    let mut records = Vec::new();

    for aggregator in store.of_type(&rule.aggregator_type) {
        let leaves = store.related(&aggregator.id, &rule.leaf_type);

        let total: Decimal = leaves
            .iter()
            .map(|leaf| {
                collector
                    .computed_for(&leaf.id)
                    .iter()
                    .find(|computed| computed.description.starts_with(&rule.source_prefix))
                    .and_then(|computed| computed.value.as_decimal())
                    .unwrap_or_default()
            })
            .sum();

        let rate = aggregator
            .attribute(&rule.rate_attr)
            .ok()
            .and_then(|attr| attr.typed_value().ok())
            .and_then(|value| value.as_decimal())
            .unwrap_or_default();

        records.push(CascadeRecord {
            entity_id: aggregator.id.clone(),
            description: format!("{} ({}) * {} ({})", rule.rate_attr, rate, CASCADE_MARKER, total),
            value: rate * total,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{ComputedAttribute, ResultValue};
    use formular_model::{Attribute, Entity};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    fn store() -> EntityStore {
        EntityStore::index(vec![
            Entity::new("C1", "Contract").with_attribute(Attribute::number("ISS", "0.05")),
            Entity::new("S1", "Servico").with_attribute(Attribute::text("contractId", "C1")),
            Entity::new("S2", "Servico").with_attribute(Attribute::text("contractId", "C1")),
        ])
        .unwrap()
    }

    fn attach_sum(collector: &mut ResultCollector, entity_id: &str, value: &str) {
        collector.attach(
            entity_id,
            ComputedAttribute {
                key: "SUM(qtd * valor)".to_string(),
                value: ResultValue::Number(dec(value)),
                description: "SUM(qtd * valor)".to_string(),
            },
        );
    }

    #[test]
    fn multiplies_rate_by_summed_leaf_aggregates() {
        let store = store();
        let mut collector = ResultCollector::new(&store);
        attach_sum(&mut collector, "S1", "25.0");
        attach_sum(&mut collector, "S2", "5.0");

        let records = evaluate_cascade(&store, &CascadeRule::default(), &collector);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_id, "C1");
        assert_eq!(records[0].value, dec("1.5"));
        assert_eq!(
            records[0].description,
            "ISS (0.05) * TotalDosServicos (30.0)"
        );
    }

    #[test]
    fn only_prefix_matching_attributes_contribute() {
        let store = store();
        let mut collector = ResultCollector::new(&store);
        collector.attach(
            "S1",
            ComputedAttribute {
                key: "AVG(qtd * valor)".to_string(),
                value: ResultValue::Number(dec("100")),
                description: "AVG(qtd * valor)".to_string(),
            },
        );
        attach_sum(&mut collector, "S1", "25.0");

        let records = evaluate_cascade(&store, &CascadeRule::default(), &collector);
        assert_eq!(records[0].value, dec("1.250"));
    }

    #[test]
    fn first_matching_attribute_wins() {
        let store = store();
        let mut collector = ResultCollector::new(&store);
        attach_sum(&mut collector, "S1", "25.0");
        attach_sum(&mut collector, "S1", "99.0");

        let records = evaluate_cascade(&store, &CascadeRule::default(), &collector);
        assert_eq!(records[0].value, dec("1.250"));
    }

    #[test]
    fn no_leaves_means_zero() {
        let store =
            EntityStore::index(vec![Entity::new("C1", "Contract")
                .with_attribute(Attribute::number("ISS", "0.05"))])
            .unwrap();
        let collector = ResultCollector::new(&store);
        let records = evaluate_cascade(&store, &CascadeRule::default(), &collector);
        assert_eq!(records[0].value, Decimal::ZERO);
    }

    #[test]
    fn missing_rate_defaults_to_zero() {
        let store = EntityStore::index(vec![
            Entity::new("C1", "Contract"),
            Entity::new("S1", "Servico").with_attribute(Attribute::text("contractId", "C1")),
        ])
        .unwrap();
        let mut collector = ResultCollector::new(&store);
        attach_sum(&mut collector, "S1", "25.0");
        let records = evaluate_cascade(&store, &CascadeRule::default(), &collector);
        assert_eq!(records[0].value, Decimal::ZERO);
    }

    #[test]
    fn marker_detection_is_substring_based() {
        let rule = CascadeRule::default();
        assert!(rule.matches("Contract.ISS * TotalDosServicos"));
        assert!(!rule.matches("Contract.ISS * Total"));
    }
}
