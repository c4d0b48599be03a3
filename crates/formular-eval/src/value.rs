//! Runtime values

use std::fmt;

use formular_model::AttributeValue;
use rust_decimal::Decimal;

/// A value produced while evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Runtime type name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "int",
            Self::Decimal(_) => "float",
            Self::Text(_) => "string",
            Self::Bool(_) => "bool",
        }
    }

    /// Whether this value participates in arithmetic
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal(_))
    }

    /// Decimal view of a numeric value
    ///
    /// Text deliberately does not coerce here: expression evaluation is
    /// strict, only the aggregation paths coerce numeric-looking text (via
    /// [`AttributeValue::as_decimal`]).
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<AttributeValue> for Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Integer(i) => Self::Integer(i),
            AttributeValue::Decimal(d) => Self::Decimal(d),
            AttributeValue::Text(s) => Self::Text(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Integer(3).as_decimal(), Some(Decimal::from(3)));
        assert_eq!(
            Value::Decimal(Decimal::from_str("2.5").unwrap()).as_decimal(),
            Some(Decimal::from_str("2.5").unwrap())
        );
        assert_eq!(Value::Text("2.5".to_string()).as_decimal(), None);
        assert_eq!(Value::Bool(true).as_decimal(), None);
    }

    #[test]
    fn display_keeps_raw_scale() {
        assert_eq!(
            Value::Decimal(Decimal::from_str("10.5").unwrap()).to_string(),
            "10.5"
        );
        assert_eq!(Value::Integer(3).to_string(), "3");
    }
}
