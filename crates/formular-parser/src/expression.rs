//! Expression parser using recursive descent with precedence climbing
//!
//! Precedence, loosest first: comparison, additive, multiplicative, unary,
//! primary. Each level is an explicit loop over its operators, producing a
//! left-associative tree.

use formular_ast::{
    AttributeToken, BinaryExpr, BinaryOp, CallExpr, Expression, Literal, UnaryExpr, UnaryOp,
};
use winnow::combinator::opt;
use winnow::prelude::*;

use crate::combinators::{identifier, lit, number, string_literal, ws, Input, PResult};
use crate::ParseError;

/// Parse a complete expression, requiring the full input to be consumed
pub fn parse_expression(source: &str) -> Result<Expression, ParseError> {
    let mut input: Input<'_> = source.trim();
    let expr =
        expression(&mut input).map_err(|_| ParseError::new("unparseable expression"))?;
    let _ = ws(&mut input);
    if !input.is_empty() {
        return Err(ParseError::new(format!(
            "unexpected trailing input: '{input}'"
        )));
    }
    Ok(expr)
}

/// Top-level expression entry point for nested contexts
pub(crate) fn expression<'a>(input: &mut Input<'a>) -> PResult<Expression> {
    comparison_expression(input)
}

fn comparison_expression<'a>(input: &mut Input<'a>) -> PResult<Expression> {
    let mut left = additive_expression(input)?;

    loop {
        ws(input)?;

        // Two-character operators before their one-character prefixes
        let op = if lit("==").parse_next(input).is_ok() {
            Some(BinaryOp::Equal)
        } else if lit("!=").parse_next(input).is_ok() {
            Some(BinaryOp::NotEqual)
        } else if lit("<=").parse_next(input).is_ok() {
            Some(BinaryOp::LessOrEqual)
        } else if lit(">=").parse_next(input).is_ok() {
            Some(BinaryOp::GreaterOrEqual)
        } else if lit("<").parse_next(input).is_ok() {
            Some(BinaryOp::Less)
        } else if lit(">").parse_next(input).is_ok() {
            Some(BinaryOp::Greater)
        } else {
            None
        };

        if let Some(op) = op {
            let right = additive_expression(input)?;
            left = Expression::Binary(BinaryExpr::new(left, op, right));
        } else {
            break;
        }
    }

    Ok(left)
}

fn additive_expression<'a>(input: &mut Input<'a>) -> PResult<Expression> {
    let mut left = multiplicative_expression(input)?;

    loop {
        ws(input)?;

        let op = if lit("+").parse_next(input).is_ok() {
            Some(BinaryOp::Add)
        } else if lit("-").parse_next(input).is_ok() {
            Some(BinaryOp::Subtract)
        } else {
            None
        };

        if let Some(op) = op {
            let right = multiplicative_expression(input)?;
            left = Expression::Binary(BinaryExpr::new(left, op, right));
        } else {
            break;
        }
    }

    Ok(left)
}

fn multiplicative_expression<'a>(input: &mut Input<'a>) -> PResult<Expression> {
    let mut left = unary_expression(input)?;

    loop {
        ws(input)?;

        let op = if lit("*").parse_next(input).is_ok() {
            Some(BinaryOp::Multiply)
        } else if lit("/").parse_next(input).is_ok() {
            Some(BinaryOp::Divide)
        } else if lit("%").parse_next(input).is_ok() {
            Some(BinaryOp::Modulo)
        } else {
            None
        };

        if let Some(op) = op {
            let right = unary_expression(input)?;
            left = Expression::Binary(BinaryExpr::new(left, op, right));
        } else {
            break;
        }
    }

    Ok(left)
}

fn unary_expression<'a>(input: &mut Input<'a>) -> PResult<Expression> {
    ws(input)?;
    if lit("-").parse_next(input).is_ok() {
        let operand = unary_expression(input)?;
        return Ok(Expression::Unary(UnaryExpr {
            op: UnaryOp::Negate,
            operand: Box::new(operand),
        }));
    }
    primary_expression(input)
}

fn primary_expression<'a>(input: &mut Input<'a>) -> PResult<Expression> {
    ws(input)?;

    // Parenthesized group, kept as a node so rendering can reproduce it
    if lit("(").parse_next(input).is_ok() {
        let inner = expression(input)?;
        ws(input)?;
        lit(")").parse_next(input)?;
        return Ok(Expression::Group(Box::new(inner)));
    }

    if let Some(text) = opt(string_literal).parse_next(input)? {
        return Ok(Expression::Literal(Literal::Text(text)));
    }

    if let Some(value) = opt(number).parse_next(input)? {
        return Ok(Expression::Literal(value));
    }

    // Identifier-led forms: call, attribute reference, bare identifier
    let name = identifier(input)?;

    if lit("(").parse_next(input).is_ok() {
        let args = call_arguments(input)?;
        return Ok(Expression::Call(CallExpr {
            name: name.to_string(),
            args,
        }));
    }

    if lit(".").parse_next(input).is_ok() {
        let attribute = identifier(input)?;
        return Ok(Expression::AttributeRef(AttributeToken::new(
            name, attribute,
        )));
    }

    Ok(Expression::Identifier(name.to_string()))
}

fn call_arguments<'a>(input: &mut Input<'a>) -> PResult<Vec<Expression>> {
    let mut args = Vec::new();
    ws(input)?;
    if lit(")").parse_next(input).is_ok() {
        return Ok(args);
    }
    loop {
        args.push(expression(input)?);
        ws(input)?;
        if lit(",").parse_next(input).is_ok() {
            continue;
        }
        lit(")").parse_next(input)?;
        return Ok(args);
    }
}
