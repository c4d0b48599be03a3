//! Per-run result accumulation
//!
//! The collector owns all mutable state of a processing run: the flat list
//! of formula results and the per-entity views that accumulate computed
//! attributes. Results append without deduplication; `summarize` dedups at
//! the end, and `aggregated_entities` keeps only entities that actually
//! computed something.

use std::collections::HashSet;

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use formular_model::EntityStore;

use crate::value::Value;

/// A recorded result value
///
/// Numeric outcomes are normalized to `Number` regardless of their integer
/// or decimal origin; booleans and text pass through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Number(Decimal),
    Text(String),
    Bool(bool),
}

impl ResultValue {
    /// Wire name of the result type
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "float",
            Self::Text(_) => "string",
            Self::Bool(_) => "bool",
        }
    }

    /// Numeric view, used by the cascade pass
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<Value> for ResultValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Integer(i) => Self::Number(Decimal::from(i)),
            Value::Decimal(d) => Self::Number(d),
            Value::Text(s) => Self::Text(s),
            Value::Bool(b) => Self::Bool(b),
        }
    }
}

impl Serialize for ResultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(d) => match d.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&d.to_string()),
            },
            Self::Text(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// A derived value attached to an entity view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedAttribute {
    /// Label of the derived value
    pub key: String,
    pub value: ResultValue,
    /// Human-readable derivation trace
    pub description: String,
}

/// Output view of an entity with its computed attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: String,
    pub entity_type: Vec<String>,
    pub computed: Vec<ComputedAttribute>,
}

/// Outcome of evaluating one formula against one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaResult {
    pub entity_id: String,
    /// Original formula text
    pub formula: String,
    /// Text after substitution, or the synthesized aggregation description
    pub resolved_formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
}

impl FormulaResult {
    /// Successful outcome
    pub fn success(
        entity_id: impl Into<String>,
        formula: impl Into<String>,
        resolved_formula: impl Into<String>,
        result: ResultValue,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            formula: formula.into(),
            resolved_formula: resolved_formula.into(),
            result_type: Some(result.type_name().to_string()),
            result: Some(result),
            error: None,
            success: true,
        }
    }

    /// Failed outcome; the run continues
    pub fn failure(
        entity_id: impl Into<String>,
        formula: impl Into<String>,
        resolved_formula: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            formula: formula.into(),
            resolved_formula: resolved_formula.into(),
            result: None,
            result_type: None,
            error: Some(error.into()),
            success: false,
        }
    }
}

/// Accumulates results and entity views for one processing run
#[derive(Debug, Default)]
pub struct ResultCollector {
    results: Vec<FormulaResult>,
    views: IndexMap<String, EntityView>,
}

impl ResultCollector {
    /// Create a collector with an empty view for every stored entity
    pub fn new(store: &EntityStore) -> Self {
        let views = store
            .iter()
            .map(|entity| {
                (
                    entity.id.clone(),
                    EntityView {
                        id: entity.id.clone(),
                        entity_type: entity.entity_type.clone(),
                        computed: Vec::new(),
                    },
                )
            })
            .collect();
        Self {
            results: Vec::new(),
            views,
        }
    }

    /// Append a result as produced, without deduplication
    pub fn push(&mut self, result: FormulaResult) {
        self.results.push(result);
    }

    /// Attach a computed attribute to an entity's view
    pub fn attach(&mut self, entity_id: &str, computed: ComputedAttribute) {
        if let Some(view) = self.views.get_mut(entity_id) {
            view.computed.push(computed);
        }
    }

    /// Computed attributes recorded so far for an entity
    ///
    /// The cascade pass reads aggregation outputs through this instead of
    /// recomputing them.
    pub fn computed_for(&self, entity_id: &str) -> &[ComputedAttribute] {
        self.views
            .get(entity_id)
            .map(|view| view.computed.as_slice())
            .unwrap_or(&[])
    }

    /// Deduplicated results, first occurrence wins, insertion order kept
    ///
    /// The deduplication key is `(entity_id, formula, resolved_formula)`.
    pub fn summarize(&self) -> Vec<FormulaResult> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for result in &self.results {
            let key = (
                result.entity_id.as_str(),
                result.formula.as_str(),
                result.resolved_formula.as_str(),
            );
            if seen.insert(key) {
                out.push(result.clone());
            }
        }
        out
    }

    /// Views of entities with at least one computed attribute
    pub fn aggregated_entities(&self) -> Vec<EntityView> {
        self.views
            .values()
            .filter(|view| !view.computed.is_empty())
            .cloned()
            .collect()
    }
}
