//! Formula classification
//!
//! Tries the aggregation shapes first (path, then reference), falling back
//! to direct classification when the text carries `Type.attribute` tokens.

use formular_ast::{AggregateFn, AttributeToken, Formula, PathAggregation, ReferenceAggregation};
use thiserror::Error;
use winnow::combinator::alt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

use crate::combinators::{identifier, lit, type_name, ws, Input, PResult};
use crate::expression::parse_expression;

/// Why a formula could not be classified
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// No recognizable `Type.attribute` tokens; the formula is dropped
    #[error("formula contains no attribute tokens")]
    Unrecognized,

    /// Tokens are present but the expression grammar rejects the text;
    /// the evaluator records a failure per matching entity
    #[error("malformed formula: {message}")]
    Malformed {
        tokens: Vec<AttributeToken>,
        message: String,
    },
}

/// Classify a formula string into its evaluation strategy
pub fn classify(source: &str) -> Result<Formula, ClassifyError> {
    let text = source.trim();

    if let Some(aggregation) = parse_complete(path_aggregation, text) {
        return Ok(Formula::PathAggregation(aggregation));
    }

    if let Some(aggregation) = parse_complete(reference_aggregation, text) {
        return Ok(Formula::ReferenceAggregation(aggregation));
    }

    let tokens = attribute_tokens(text);
    if tokens.is_empty() {
        return Err(ClassifyError::Unrecognized);
    }

    match parse_expression(text) {
        Ok(expr) => Ok(Formula::Direct { expr, tokens }),
        Err(e) => Err(ClassifyError::Malformed {
            tokens,
            message: e.to_string(),
        }),
    }
}

/// Scan for distinct `Type.attribute` tokens in first-appearance order
///
/// A token is a letters-only type name immediately followed by a dot and an
/// identifier, both starting at a word boundary. `Servico.Medicao.qtd`
/// yields the single token `Servico.Medicao`; the trailing `.qtd` is not a
/// token of its own.
pub fn attribute_tokens(text: &str) -> Vec<AttributeToken> {
    let bytes = text.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut tokens: Vec<AttributeToken> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let at_boundary = i == 0 || !is_word(bytes[i - 1]);
        if !at_boundary || !bytes[i].is_ascii_alphabetic() {
            i += 1;
            continue;
        }

        let type_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }

        // A letters-only run counts as a type name only when a dot follows
        if i >= bytes.len() || bytes[i] != b'.' {
            while i < bytes.len() && is_word(bytes[i]) {
                i += 1;
            }
            continue;
        }
        let type_end = i;

        let attr_start = i + 1;
        if attr_start >= bytes.len()
            || !(bytes[attr_start].is_ascii_alphabetic() || bytes[attr_start] == b'_')
        {
            i += 1;
            continue;
        }
        let mut attr_end = attr_start + 1;
        while attr_end < bytes.len() && is_word(bytes[attr_end]) {
            attr_end += 1;
        }

        let token = AttributeToken::new(&text[type_start..type_end], &text[attr_start..attr_end]);
        if !tokens.contains(&token) {
            tokens.push(token);
        }
        i = attr_end;
    }

    tokens
}

/// Run an anchored parser: succeed only when it consumes the whole text
fn parse_complete<T>(parser: fn(&mut Input<'_>) -> PResult<T>, text: &str) -> Option<T> {
    let mut input: Input<'_> = text;
    let value = parser(&mut input).ok()?;
    input.is_empty().then_some(value)
}

fn aggregate_fn<'a>(input: &mut Input<'a>) -> PResult<AggregateFn> {
    alt((
        lit("SUM").value(AggregateFn::Sum),
        lit("AVG").value(AggregateFn::Avg),
        lit("COUNT").value(AggregateFn::Count),
        lit("MAX").value(AggregateFn::Max),
        lit("MIN").value(AggregateFn::Min),
    ))
    .parse_next(input)
}

/// Shared left side of both aggregation shapes:
/// `FN(Parent.Child.leftAttr *`
fn aggregation_head<'a>(
    input: &mut Input<'a>,
) -> PResult<(AggregateFn, &'a str, &'a str, &'a str)> {
    let function = aggregate_fn(input)?;
    lit("(").parse_next(input)?;
    let parent_type = type_name(input)?;
    lit(".").parse_next(input)?;
    let child_type = type_name(input)?;
    lit(".").parse_next(input)?;
    let left_attr = identifier(input)?;
    ws(input)?;
    lit("*").parse_next(input)?;
    ws(input)?;
    Ok((function, parent_type, child_type, left_attr))
}

fn path_aggregation<'a>(input: &mut Input<'a>) -> PResult<PathAggregation> {
    let (function, parent_type, child_type, left_attr) = aggregation_head(input)?;

    // The Parent.Child prefix must repeat identically on the right
    let right_parent = type_name(input)?;
    lit(".").parse_next(input)?;
    let right_child = type_name(input)?;
    if right_parent != parent_type || right_child != child_type {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    lit(".").parse_next(input)?;

    let mut segments = vec![identifier(input)?];
    while lit(".").parse_next(input).is_ok() {
        segments.push(identifier(input)?);
    }
    lit(")").parse_next(input)?;

    let right_attr = segments
        .pop()
        .ok_or_else(|| ErrMode::Backtrack(ContextError::new()))?;

    Ok(PathAggregation {
        function,
        parent_type: parent_type.to_string(),
        child_type: child_type.to_string(),
        left_attr: left_attr.to_string(),
        grand_path: segments.iter().map(|s| s.to_string()).collect(),
        right_attr: right_attr.to_string(),
    })
}

fn reference_aggregation<'a>(input: &mut Input<'a>) -> PResult<ReferenceAggregation> {
    let (function, parent_type, child_type, left_attr) = aggregation_head(input)?;

    lit("@").parse_next(input)?;
    let ref_attr = identifier(input)?;
    lit(".").parse_next(input)?;
    let right_attr = identifier(input)?;
    lit(")").parse_next(input)?;

    Ok(ReferenceAggregation {
        function,
        parent_type: parent_type.to_string(),
        child_type: child_type.to_string(),
        left_attr: left_attr.to_string(),
        ref_attr: ref_attr.to_string(),
        right_attr: right_attr.to_string(),
    })
}
