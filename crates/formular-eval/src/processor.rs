//! Processing run orchestration
//!
//! One processor handles one request's entities and formulas, in two strict
//! phases: phase 1 evaluates direct and aggregation formulas in list order,
//! phase 2 runs the cascade for marker formulas, also in list order.
//! Nothing is shared across runs; concurrent runs each build their own
//! processor.

use log::{debug, trace};
use serde::Serialize;

use formular_ast::{AttributeToken, Expression, Formula};
use formular_model::{Entity, EntityStore, ModelError};
use formular_parser::{classify, ClassifyError};

use crate::aggregate::{evaluate_path, evaluate_reference, AggregateRecord};
use crate::cascade::{evaluate_cascade, CascadeRule};
use crate::collector::{
    ComputedAttribute, EntityView, FormulaResult, ResultCollector, ResultValue,
};
use crate::engine::{render_resolved, Bindings, ExpressionEngine};
use crate::value::Value;

/// Final output of a processing run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    /// Deduplicated per-formula-per-entity outcomes
    pub direct_results: Vec<FormulaResult>,
    /// Entities with at least one computed attribute
    pub aggregated_entities: Vec<EntityView>,
}

/// Evaluates a batch of formulas against a request-scoped entity set
#[derive(Debug)]
pub struct FormulaProcessor {
    store: EntityStore,
    engine: ExpressionEngine,
    cascade_rule: CascadeRule,
}

impl FormulaProcessor {
    /// Build a processor over the given entities
    ///
    /// The only fatal error: duplicate entity ids.
    pub fn new(entities: Vec<Entity>) -> Result<Self, ModelError> {
        Ok(Self {
            store: EntityStore::index(entities)?,
            engine: ExpressionEngine::new(),
            cascade_rule: CascadeRule::default(),
        })
    }

    /// Override the cascade rule
    pub fn with_cascade_rule(mut self, rule: CascadeRule) -> Self {
        self.cascade_rule = rule;
        self
    }

    /// Run both phases and assemble the output
    pub fn process(&self, formulas: &[String]) -> RunOutput {
        let mut collector = ResultCollector::new(&self.store);

        debug!("phase 1: evaluating {} formulas", formulas.len());
        for formula in formulas {
            match classify(formula) {
                Ok(Formula::Direct { expr, tokens }) => {
                    trace!("direct: {formula}");
                    self.run_direct(formula, &expr, &tokens, &mut collector);
                }
                Ok(Formula::PathAggregation(aggregation)) => {
                    trace!("path aggregation: {formula}");
                    let records = evaluate_path(&self.store, &aggregation);
                    record_aggregates(&mut collector, formula, records);
                }
                Ok(Formula::ReferenceAggregation(aggregation)) => {
                    trace!("reference aggregation: {formula}");
                    let records = evaluate_reference(&self.store, &aggregation);
                    record_aggregates(&mut collector, formula, records);
                }
                Err(ClassifyError::Malformed { tokens, message }) => {
                    trace!("malformed: {formula}");
                    self.run_malformed(formula, &tokens, &message, &mut collector);
                }
                Err(ClassifyError::Unrecognized) => {
                    debug!("dropping unrecognized formula: {formula}");
                }
            }
        }

        let cascade_formulas: Vec<&String> = formulas
            .iter()
            .filter(|f| self.cascade_rule.matches(f))
            .collect();
        debug!("phase 2: {} cascade formulas", cascade_formulas.len());
        for formula in cascade_formulas {
            let records = evaluate_cascade(&self.store, &self.cascade_rule, &collector);
            for record in records {
                collector.push(FormulaResult::success(
                    &record.entity_id,
                    formula,
                    &record.description,
                    ResultValue::Number(record.value),
                ));
                collector.attach(
                    &record.entity_id,
                    ComputedAttribute {
                        key: self.cascade_rule.output_key.clone(),
                        value: ResultValue::Number(record.value),
                        description: record.description,
                    },
                );
            }
        }

        RunOutput {
            direct_results: collector.summarize(),
            aggregated_entities: collector.aggregated_entities(),
        }
    }

    /// Evaluate a direct formula: one result per entity of each distinct
    /// token type, in first-appearance order
    fn run_direct(
        &self,
        formula: &str,
        expr: &Expression,
        tokens: &[AttributeToken],
        collector: &mut ResultCollector,
    ) {
        for entity_type in distinct_types(tokens) {
            for entity in self.store.of_type(entity_type) {
                let mut bindings = Bindings::new();
                let mut bind_error: Option<String> = None;

                for token in tokens.iter().filter(|t| t.entity_type == entity_type) {
                    match entity.attribute_value(&token.attribute) {
                        Ok(value) => bindings.insert(token.clone(), Value::from(value)),
                        Err(e) => {
                            bind_error.get_or_insert_with(|| e.to_string());
                        }
                    }
                }

                let resolved = render_resolved(expr, &bindings);
                if let Some(error) = bind_error {
                    collector.push(FormulaResult::failure(&entity.id, formula, resolved, error));
                    continue;
                }

                match self.engine.evaluate(expr, &bindings) {
                    Ok(value) => collector.push(FormulaResult::success(
                        &entity.id,
                        formula,
                        resolved,
                        ResultValue::from(value),
                    )),
                    Err(e) => collector.push(FormulaResult::failure(
                        &entity.id,
                        formula,
                        resolved,
                        e.to_string(),
                    )),
                }
            }
        }
    }

    /// Record a failure per matching entity for text that carried tokens
    /// but did not parse
    fn run_malformed(
        &self,
        formula: &str,
        tokens: &[AttributeToken],
        message: &str,
        collector: &mut ResultCollector,
    ) {
        for entity_type in distinct_types(tokens) {
            for entity in self.store.of_type(entity_type) {
                collector.push(FormulaResult::failure(&entity.id, formula, formula, message));
            }
        }
    }
}

/// Distinct entity types among the tokens, first appearance first
fn distinct_types(tokens: &[AttributeToken]) -> Vec<&str> {
    let mut types: Vec<&str> = Vec::new();
    for token in tokens {
        if !types.contains(&token.entity_type.as_str()) {
            types.push(&token.entity_type);
        }
    }
    types
}

/// Record aggregation outputs and attach them to their entity views
fn record_aggregates(
    collector: &mut ResultCollector,
    formula: &str,
    records: Vec<AggregateRecord>,
) {
    for record in records {
        collector.push(FormulaResult::success(
            &record.entity_id,
            formula,
            &record.description,
            ResultValue::Number(record.value),
        ));
        collector.attach(
            &record.entity_id,
            ComputedAttribute {
                key: record.description.clone(),
                value: ResultValue::Number(record.value),
                description: record.description,
            },
        );
    }
}
