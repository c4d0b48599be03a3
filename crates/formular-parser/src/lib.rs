//! Formula parsing for the formular engine
//!
//! This crate turns formula strings into `formular-ast` values using winnow
//! with recursive descent and precedence climbing. Classification tries the
//! three formula shapes in fixed precedence:
//!
//! 1. Path aggregation: `FN(Parent.Child.left * Parent.Child.….right)`
//! 2. Reference aggregation: `FN(Parent.Child.left * @ref.right)`
//! 3. Direct: any text containing at least one `Type.attribute` token
//!
//! Text matching none of the shapes is reported as unrecognized; text that
//! carries tokens but fails the expression grammar is reported as malformed
//! together with its token list, so the evaluator can record per-entity
//! failures instead of dropping the formula.

mod combinators;
mod expression;
mod formula;

pub use expression::parse_expression;
pub use formula::{attribute_tokens, classify, ClassifyError};

use thiserror::Error;

/// Expression syntax error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("syntax error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
