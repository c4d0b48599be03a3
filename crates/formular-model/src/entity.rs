//! Entities and typed attribute values

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Declared attribute type on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Numeric value (integer or decimal, decided by the raw text)
    Number,
    /// Plain text value
    String,
}

/// A typed key/value fact attached to an entity
///
/// Values arrive as strings; [`Attribute::typed_value`] performs the explicit
/// conversion dictated by the declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
}

impl Attribute {
    /// Create a numeric attribute
    pub fn number(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            kind: AttributeKind::Number,
        }
    }

    /// Create a text attribute
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            kind: AttributeKind::String,
        }
    }

    /// Convert the raw value according to the declared kind
    ///
    /// Numbers parse to [`AttributeValue::Integer`] when the raw text has no
    /// decimal point and to [`AttributeValue::Decimal`] otherwise. Text never
    /// fails.
    pub fn typed_value(&self) -> Result<AttributeValue, ModelError> {
        match self.kind {
            AttributeKind::String => Ok(AttributeValue::Text(self.value.clone())),
            AttributeKind::Number => {
                let raw = self.value.trim();
                if raw.contains('.') {
                    Decimal::from_str(raw)
                        .map(AttributeValue::Decimal)
                        .map_err(|_| ModelError::invalid_number(&self.key, &self.value))
                } else {
                    raw.parse::<i64>()
                        .map(AttributeValue::Integer)
                        .map_err(|_| ModelError::invalid_number(&self.key, &self.value))
                }
            }
        }
    }
}

/// A converted attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    Decimal(Decimal),
    Text(String),
}

impl AttributeValue {
    /// Numeric view of the value, if there is one
    ///
    /// Text coerces when it parses as a number; this is the single numeric
    /// coercion point used by the aggregation paths.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            Self::Text(s) => Decimal::from_str(s.trim()).ok(),
        }
    }

    /// Text view of the value, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A typed, attributed node in the business graph
///
/// An entity may carry multiple type tags. Attribute keys need not be
/// unique; lookup returns the first match in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub entity_type: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entity {
    /// Create an entity with a single type tag and no attributes
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: vec![entity_type.into()],
            attributes: Vec::new(),
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Whether this entity carries the given type tag
    pub fn has_type(&self, tag: &str) -> bool {
        self.entity_type.iter().any(|t| t == tag)
    }

    /// First attribute with the given key
    pub fn attribute(&self, key: &str) -> Result<&Attribute, ModelError> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .ok_or_else(|| ModelError::attribute_not_found(&self.id, key))
    }

    /// Typed value of the first attribute with the given key
    pub fn attribute_value(&self, key: &str) -> Result<AttributeValue, ModelError> {
        self.attribute(key)?.typed_value()
    }
}
