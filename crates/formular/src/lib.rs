//! Formular: computed attributes for entity graphs
//!
//! An external collaborator supplies a list of typed entities and a list of
//! formula strings; this crate classifies each formula, resolves the entity
//! relationships it implies, evaluates it, and returns per-formula results
//! plus the views of every entity that gained a computed attribute.
//!
//! ```
//! use formular::{Attribute, Entity, FormulaProcessor};
//!
//! let entities = vec![
//!     Entity::new("C1", "Contract").with_attribute(Attribute::number("ISS", "0.05")),
//!     Entity::new("S1", "Servico").with_attribute(Attribute::text("contractId", "C1")),
//!     Entity::new("M1", "Medicao")
//!         .with_attribute(Attribute::text("serviceId", "S1"))
//!         .with_attribute(Attribute::number("qtd", "10"))
//!         .with_attribute(Attribute::number("valor", "2.5")),
//! ];
//! let formulas = vec![
//!     "SUM(Servico.Medicao.qtd * Servico.Medicao.valor)".to_string(),
//!     "Contract.ISS * TotalDosServicos".to_string(),
//! ];
//!
//! let processor = FormulaProcessor::new(entities).unwrap();
//! let output = processor.process(&formulas);
//! assert_eq!(output.aggregated_entities.len(), 2);
//! ```

pub use formular_ast::{
    AggregateFn, AttributeToken, Expression, Formula, PathAggregation, ReferenceAggregation,
};
pub use formular_eval::{
    CascadeRule, ComputedAttribute, EntityView, EvalError, ExpressionEngine, FormulaProcessor,
    FormulaResult, FunctionRegistry, ResultValue, RunOutput, Value, CASCADE_MARKER,
};
pub use formular_model::{
    Attribute, AttributeKind, AttributeValue, Entity, EntityStore, ModelError,
};
pub use formular_parser::{classify, parse_expression, ClassifyError, ParseError};
