//! Closed function registry for the expression engine
//!
//! The formula language exposes a fixed set of built-ins; nothing here is
//! reflective or extensible from formula text. Custom engines can register
//! additional functions explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// Type alias for function implementations
pub type FunctionImpl = Arc<dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync>;

/// Registry mapping function names to implementations
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionImpl>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard built-ins: `len`, `sum`, `max`, `min`
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("len", Arc::new(builtin_len));
        registry.register("sum", Arc::new(builtin_sum));
        registry.register("max", Arc::new(builtin_max));
        registry.register("min", Arc::new(builtin_min));
        registry
    }

    /// Register a function implementation
    pub fn register(&mut self, name: impl Into<String>, implementation: FunctionImpl) {
        self.functions.insert(name.into(), implementation);
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionImpl> {
        self.functions.get(name)
    }
}

fn builtin_len(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Text(s)] => Ok(Value::Integer(s.chars().count() as i64)),
        [other] => Err(EvalError::invalid_argument(
            "len",
            format!("expected a string, found {}", other.type_name()),
        )),
        _ => Err(EvalError::invalid_argument(
            "len",
            "takes exactly one argument",
        )),
    }
}

fn numeric_args(function: &str, args: &[Value]) -> EvalResult<Vec<Decimal>> {
    if args.is_empty() {
        return Err(EvalError::invalid_argument(
            function,
            "requires at least one argument",
        ));
    }
    args.iter()
        .map(|v| {
            v.as_decimal().ok_or_else(|| {
                EvalError::invalid_argument(
                    function,
                    format!("expected numeric arguments, found {}", v.type_name()),
                )
            })
        })
        .collect()
}

fn builtin_sum(args: &[Value]) -> EvalResult<Value> {
    // All-integer input stays integer, like integer addition
    if args.iter().all(|v| matches!(v, Value::Integer(_))) && !args.is_empty() {
        let mut total: i64 = 0;
        for value in args {
            if let Value::Integer(i) = value {
                total = total
                    .checked_add(*i)
                    .ok_or_else(|| EvalError::overflow("sum"))?;
            }
        }
        return Ok(Value::Integer(total));
    }
    let values = numeric_args("sum", args)?;
    let mut total = Decimal::ZERO;
    for value in values {
        total = total
            .checked_add(value)
            .ok_or_else(|| EvalError::overflow("sum"))?;
    }
    Ok(Value::Decimal(total))
}

fn extremum(function: &str, args: &[Value], want_max: bool) -> EvalResult<Value> {
    let values = numeric_args(function, args)?;
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        let better = if want_max {
            value > &values[best]
        } else {
            value < &values[best]
        };
        if better {
            best = i;
        }
    }
    Ok(args[best].clone())
}

fn builtin_max(args: &[Value]) -> EvalResult<Value> {
    extremum("max", args, true)
}

fn builtin_min(args: &[Value]) -> EvalResult<Value> {
    extremum("min", args, false)
}
