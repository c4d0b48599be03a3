//! Common parser combinators for the formula grammar

use std::str::FromStr;

use formular_ast::Literal;
use rust_decimal::Decimal;
use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_while};

/// Parser input type
pub type Input<'a> = &'a str;

/// Parser result type
pub type PResult<T> = winnow::ModalResult<T>;

/// Consume optional whitespace
pub fn ws<'a>(input: &mut Input<'a>) -> PResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

/// Match a literal token
pub fn lit<'a>(token: &'static str) -> impl Parser<Input<'a>, &'a str, ErrMode<ContextError>> {
    literal(token)
}

/// Parse an entity type name (letters only)
pub fn type_name<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

/// Parse an identifier: letter or underscore, then word characters
pub fn identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Parse a numeric literal
///
/// A decimal point selects `Literal::Decimal`; otherwise the text parses as
/// a 64-bit integer.
pub fn number<'a>(input: &mut Input<'a>) -> PResult<Literal> {
    alt((
        (digit1, lit("."), digit1)
            .take()
            .try_map(|s: &str| Decimal::from_str(s).map(Literal::Decimal)),
        digit1.try_map(|s: &str| s.parse::<i64>().map(Literal::Integer)),
    ))
    .parse_next(input)
}

/// Parse a string literal, single- or double-quoted
pub fn string_literal<'a>(input: &mut Input<'a>) -> PResult<String> {
    alt((
        delimited(lit("'"), take_while(0.., |c: char| c != '\''), lit("'")),
        delimited(lit("\""), take_while(0.., |c: char| c != '"'), lit("\"")),
    ))
    .map(str::to_string)
    .parse_next(input)
}
