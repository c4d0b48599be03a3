//! Formula AST definitions
//!
//! A formula string classifies into one of three evaluation strategies,
//! represented here as a tagged [`Formula`] variant:
//!
//! - **Direct**: an arithmetic/string expression over `Type.attribute`
//!   tokens, parsed once into an [`Expression`] tree and evaluated per
//!   matching entity
//! - **Path aggregation**: `FN(Parent.Child.left * Parent.Child.….right)`,
//!   reducing products gathered along a relationship chain
//! - **Reference aggregation**: `FN(Parent.Child.left * @ref.right)`,
//!   reducing products gathered through an id-valued reference attribute
//!
//! The AST is produced by `formular-parser` and consumed by
//! `formular-eval`; it carries no evaluation logic of its own.

pub mod expression;
pub mod formula;

pub use expression::{
    AttributeToken, BinaryExpr, BinaryOp, CallExpr, Expression, Literal, UnaryExpr, UnaryOp,
};
pub use formula::{AggregateFn, Formula, PathAggregation, ReferenceAggregation};
