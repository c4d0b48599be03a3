//! Formula evaluation engine
//!
//! This crate evaluates classified formulas against a request-scoped entity
//! store:
//!
//! - **Direct formulas**: the expression tree is bound to one entity's
//!   attribute values and evaluated, one result per matching entity
//! - **Path aggregation**: products gathered along a parent → child (→
//!   deeper) relationship chain, reduced with SUM/AVG/COUNT/MAX/MIN
//! - **Reference aggregation**: products gathered through an id-valued
//!   reference attribute, reduced per parent
//! - **Cascade pass**: a second, dependent pass that reads the collector's
//!   accumulated aggregation outputs to compute a derived total per
//!   aggregator entity
//!
//! # Example
//!
//! ```
//! use formular_eval::FormulaProcessor;
//! use formular_model::{Attribute, Entity};
//!
//! let entities = vec![Entity::new("P1", "Produto")
//!     .with_attribute(Attribute::number("preco", "10.5"))
//!     .with_attribute(Attribute::number("qtd", "3"))];
//! let processor = FormulaProcessor::new(entities).unwrap();
//! let output = processor.process(&["Produto.preco * Produto.qtd".to_string()]);
//! assert!(output.direct_results[0].success);
//! ```
//!
//! # Failure model
//!
//! Per-entity problems (missing attributes, type mismatches, division by
//! zero, unknown names) become failed results and never abort the run; the
//! only fatal error is a duplicate entity id at store construction.

pub mod aggregate;
pub mod cascade;
pub mod collector;
pub mod engine;
pub mod error;
pub mod processor;
pub mod registry;
pub mod value;

pub use cascade::{CascadeRule, CASCADE_MARKER};
pub use collector::{ComputedAttribute, EntityView, FormulaResult, ResultCollector, ResultValue};
pub use engine::{Bindings, ExpressionEngine};
pub use error::{EvalError, EvalResult};
pub use processor::{FormulaProcessor, RunOutput};
pub use registry::FunctionRegistry;
pub use value::Value;
