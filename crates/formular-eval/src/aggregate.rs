//! Aggregation over relationship chains and references
//!
//! Both variants gather a list of numeric products and reduce it with one
//! of the five aggregation functions. Coercion policy: an attribute that is
//! present but not numeric contributes zero. Lookup policy differs by
//! variant: the path walk defaults missing attributes to zero, the
//! reference walk skips the child on any failed lookup.

use formular_ast::{AggregateFn, PathAggregation, ReferenceAggregation};
use formular_model::{Entity, EntityStore};
use rust_decimal::Decimal;

/// One reduced aggregate, ready to be recorded and attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRecord {
    /// Entity the aggregate belongs to
    pub entity_id: String,
    /// Synthesized description, e.g. `SUM(qtd * valor)`
    pub description: String,
    /// Reduced value
    pub value: Decimal,
}

/// Reduce a product list with the given aggregation function
///
/// Empty inputs reduce to zero for every function.
pub fn reduce(function: AggregateFn, values: &[Decimal]) -> Decimal {
    match function {
        AggregateFn::Sum => values.iter().copied().sum(),
        AggregateFn::Count => Decimal::from(values.len() as u64),
        AggregateFn::Avg => {
            if values.is_empty() {
                Decimal::ZERO
            } else {
                values.iter().copied().sum::<Decimal>() / Decimal::from(values.len() as u64)
            }
        }
        AggregateFn::Max => values.iter().copied().max().unwrap_or(Decimal::ZERO),
        AggregateFn::Min => values.iter().copied().min().unwrap_or(Decimal::ZERO),
    }
}

/// Numeric attribute with the path-walk default: missing or non-numeric
/// values contribute zero.
fn numeric_or_zero(entity: &Entity, key: &str) -> Decimal {
    entity
        .attribute(key)
        .ok()
        .and_then(|attr| attr.typed_value().ok())
        .and_then(|value| value.as_decimal())
        .unwrap_or_default()
}

/// Evaluate a path aggregation against the store
///
/// The grouping level follows the right-hand path: with deeper segments the
/// aggregate is recorded per child over its leaves; with a bare attribute it
/// is recorded per parent over its children.
pub fn evaluate_path(store: &EntityStore, aggregation: &PathAggregation) -> Vec<AggregateRecord> {
    let description = aggregation.description();
    let mut records = Vec::new();

    for parent in store.of_type(&aggregation.parent_type) {
        let children = store.related(&parent.id, &aggregation.child_type);

        if aggregation.grand_path.is_empty() {
            // Two-level form: both operands live on the child; one
            // aggregate per parent
            let products: Vec<Decimal> = children
                .iter()
                .map(|child| {
                    numeric_or_zero(child, &aggregation.left_attr)
                        * numeric_or_zero(child, &aggregation.right_attr)
                })
                .collect();
            records.push(AggregateRecord {
                entity_id: parent.id.clone(),
                description: description.clone(),
                value: reduce(aggregation.function, &products),
            });
        } else {
            // Deeper form: left operand on the child, right operand on the
            // leaves reached through the remaining path; one aggregate per
            // child
            for child in children {
                let left = numeric_or_zero(child, &aggregation.left_attr);
                let leaves = walk_path(store, child, &aggregation.grand_path);
                let products: Vec<Decimal> = leaves
                    .iter()
                    .map(|leaf| left * numeric_or_zero(leaf, &aggregation.right_attr))
                    .collect();
                records.push(AggregateRecord {
                    entity_id: child.id.clone(),
                    description: description.clone(),
                    value: reduce(aggregation.function, &products),
                });
            }
        }
    }

    records
}

/// Follow the relationship chain hop by hop
fn walk_path<'a>(store: &'a EntityStore, from: &'a Entity, path: &[String]) -> Vec<&'a Entity> {
    let mut current = vec![from];
    for segment in path {
        current = current
            .iter()
            .flat_map(|entity| store.related(&entity.id, segment))
            .collect();
    }
    current
}

/// Evaluate a reference aggregation against the store
///
/// One record per parent; a child with any failed lookup (missing left,
/// missing reference attribute, or dangling referenced id) is skipped.
pub fn evaluate_reference(
    store: &EntityStore,
    aggregation: &ReferenceAggregation,
) -> Vec<AggregateRecord> {
    let description = aggregation.description();
    let mut records = Vec::new();

    for parent in store.of_type(&aggregation.parent_type) {
        let mut products = Vec::new();

        for child in store.related(&parent.id, &aggregation.child_type) {
            let Ok(left_attr) = child.attribute(&aggregation.left_attr) else {
                continue;
            };
            let Ok(ref_attr) = child.attribute(&aggregation.ref_attr) else {
                continue;
            };
            let Some(target) = store.get(&ref_attr.value) else {
                continue;
            };
            let Ok(right_attr) = target.attribute(&aggregation.right_attr) else {
                continue;
            };

            let left = left_attr
                .typed_value()
                .ok()
                .and_then(|v| v.as_decimal())
                .unwrap_or_default();
            let right = right_attr
                .typed_value()
                .ok()
                .and_then(|v| v.as_decimal())
                .unwrap_or_default();
            products.push(left * right);
        }

        records.push(AggregateRecord {
            entity_id: parent.id.clone(),
            description: description.clone(),
            value: reduce(aggregation.function, &products),
        });
    }

    records
}
