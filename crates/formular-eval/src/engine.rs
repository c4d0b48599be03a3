//! Expression evaluation against bound attribute values
//!
//! The formula is parsed once; this module binds its attribute tokens to a
//! concrete entity's values and walks the tree. Rendering of the resolved
//! text (the audit/display form with literals substituted) lives here too,
//! next to the binding rules it mirrors.

use std::collections::HashMap;

use formular_ast::{AttributeToken, BinaryExpr, BinaryOp, CallExpr, Expression, Literal, UnaryOp};
use rust_decimal::Decimal;

use crate::error::{EvalError, EvalResult};
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// Attribute-token bindings for one entity
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    values: HashMap<AttributeToken, Value>,
}

impl Bindings {
    /// Create an empty binding set
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a token to a value
    pub fn insert(&mut self, token: AttributeToken, value: Value) {
        self.values.insert(token, value);
    }

    /// Look up a token's bound value
    pub fn get(&self, token: &AttributeToken) -> Option<&Value> {
        self.values.get(token)
    }
}

/// The expression engine
///
/// Holds the closed function registry; everything else is per-call state.
#[derive(Debug)]
pub struct ExpressionEngine {
    registry: FunctionRegistry,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine {
    /// Create an engine with the standard built-ins
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::standard(),
        }
    }

    /// Create an engine with a custom registry
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate an expression with the given bindings
    pub fn evaluate(&self, expr: &Expression, bindings: &Bindings) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(literal_value(lit)),
            Expression::AttributeRef(token) => bindings
                .get(token)
                .cloned()
                .ok_or_else(|| EvalError::unresolved_reference(token.to_string())),
            Expression::Identifier(name) => Err(EvalError::unresolved_reference(name)),
            Expression::Group(inner) => self.evaluate(inner, bindings),
            Expression::Unary(unary) => {
                let operand = self.evaluate(&unary.operand, bindings)?;
                match unary.op {
                    UnaryOp::Negate => negate(operand),
                }
            }
            Expression::Binary(binary) => self.eval_binary(binary, bindings),
            Expression::Call(call) => self.eval_call(call, bindings),
        }
    }

    fn eval_binary(&self, expr: &BinaryExpr, bindings: &Bindings) -> EvalResult<Value> {
        let left = self.evaluate(&expr.left, bindings)?;
        let right = self.evaluate(&expr.right, bindings)?;

        match expr.op {
            BinaryOp::Add => add(left, right),
            BinaryOp::Subtract => arithmetic("-", left, right, i64::checked_sub, Decimal::checked_sub),
            BinaryOp::Multiply => arithmetic("*", left, right, i64::checked_mul, Decimal::checked_mul),
            BinaryOp::Divide => divide(left, right),
            BinaryOp::Modulo => modulo(left, right),
            BinaryOp::Equal => Ok(Value::Bool(values_equal(&left, &right))),
            BinaryOp::NotEqual => Ok(Value::Bool(!values_equal(&left, &right))),
            BinaryOp::Less
            | BinaryOp::LessOrEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterOrEqual => compare(expr.op, left, right),
        }
    }

    fn eval_call(&self, call: &CallExpr, bindings: &Bindings) -> EvalResult<Value> {
        let args: Vec<Value> = call
            .args
            .iter()
            .map(|arg| self.evaluate(arg, bindings))
            .collect::<EvalResult<_>>()?;

        let implementation = self
            .registry
            .get(&call.name)
            .ok_or_else(|| EvalError::undefined_function(&call.name))?;
        implementation(&args)
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Decimal(d) => Value::Decimal(*d),
        Literal::Text(s) => Value::Text(s.clone()),
    }
}

fn negate(value: Value) -> EvalResult<Value> {
    match value {
        Value::Integer(i) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| EvalError::overflow("negation")),
        Value::Decimal(d) => Ok(Value::Decimal(-d)),
        other => Err(EvalError::invalid_operand(
            "unary -",
            format!("expected a number, found {}", other.type_name()),
        )),
    }
}

/// Addition also concatenates text
fn add(left: Value, right: Value) -> EvalResult<Value> {
    match (&left, &right) {
        (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{a}{b}"))),
        _ => arithmetic("+", left, right, i64::checked_add, Decimal::checked_add),
    }
}

/// Shared arithmetic ladder: Integer ⊕ Integer stays Integer (checked),
/// any Decimal operand promotes, everything else is a type mismatch.
fn arithmetic(
    operator: &str,
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    dec_op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> EvalResult<Value> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => int_op(*a, *b)
            .map(Value::Integer)
            .ok_or_else(|| EvalError::overflow(operator)),
        _ => {
            let (a, b) = numeric_pair(operator, &left, &right)?;
            dec_op(a, b)
                .map(Value::Decimal)
                .ok_or_else(|| EvalError::overflow(operator))
        }
    }
}

/// Division always produces a decimal, even for integer operands
fn divide(left: Value, right: Value) -> EvalResult<Value> {
    let (a, b) = numeric_pair("/", &left, &right)?;
    if b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }
    a.checked_div(b)
        .map(Value::Decimal)
        .ok_or_else(|| EvalError::overflow("/"))
}

fn modulo(left: Value, right: Value) -> EvalResult<Value> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_rem(*b)
                .map(Value::Integer)
                .ok_or_else(|| EvalError::overflow("%"))
        }
        _ => {
            let (a, b) = numeric_pair("%", &left, &right)?;
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_rem(b)
                .map(Value::Decimal)
                .ok_or_else(|| EvalError::overflow("%"))
        }
    }
}

fn numeric_pair(operator: &str, left: &Value, right: &Value) -> EvalResult<(Decimal, Decimal)> {
    match (left.as_decimal(), right.as_decimal()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::type_mismatch(
            operator,
            left.type_name(),
            right.type_name(),
        )),
    }
}

/// Equality across kinds is false, never an error; numerics compare by value
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => match (left.as_decimal(), right.as_decimal()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Ordering comparisons require two numbers or two strings
fn compare(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    use std::cmp::Ordering;

    let ordering = match (&left, &right) {
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        _ => {
            let (a, b) = numeric_pair(op.symbol(), &left, &right)?;
            a.cmp(&b)
        }
    };

    let result = match op {
        BinaryOp::Less => ordering == Ordering::Less,
        BinaryOp::LessOrEqual => ordering != Ordering::Greater,
        BinaryOp::Greater => ordering == Ordering::Greater,
        BinaryOp::GreaterOrEqual => ordering != Ordering::Less,
        _ => unreachable!("compare only handles ordering operators"),
    };
    Ok(Value::Bool(result))
}

/// Render the formula text with bound tokens replaced by literals
///
/// Bound text values are double-quoted; numbers render bare; unbound tokens
/// and identifiers keep their source form. This is the `resolved_formula`
/// recorded on results and used as part of the deduplication key.
pub fn render_resolved(expr: &Expression, bindings: &Bindings) -> String {
    match expr {
        Expression::Literal(Literal::Integer(i)) => i.to_string(),
        Expression::Literal(Literal::Decimal(d)) => d.to_string(),
        Expression::Literal(Literal::Text(s)) => format!("'{s}'"),
        Expression::AttributeRef(token) => match bindings.get(token) {
            Some(Value::Text(s)) => format!("\"{s}\""),
            Some(value) => value.to_string(),
            None => token.to_string(),
        },
        Expression::Identifier(name) => name.clone(),
        Expression::Unary(unary) => format!("-{}", render_resolved(&unary.operand, bindings)),
        Expression::Binary(binary) => format!(
            "{} {} {}",
            render_resolved(&binary.left, bindings),
            binary.op,
            render_resolved(&binary.right, bindings)
        ),
        Expression::Group(inner) => format!("({})", render_resolved(inner, bindings)),
        Expression::Call(call) => {
            let args: Vec<String> = call
                .args
                .iter()
                .map(|arg| render_resolved(arg, bindings))
                .collect();
            format!("{}({})", call.name, args.join(", "))
        }
    }
}
