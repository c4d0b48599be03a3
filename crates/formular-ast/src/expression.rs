//! Expression AST nodes for direct formulas

use std::fmt;

use rust_decimal::Decimal;

/// A `Type.attribute` token inside a formula
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeToken {
    /// Entity type tag the token belongs to
    pub entity_type: String,
    /// Attribute key read from the matching entity
    pub attribute: String,
}

impl AttributeToken {
    pub fn new(entity_type: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for AttributeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.attribute)
    }
}

/// All expression node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // === Leaves ===
    /// Literal value
    Literal(Literal),
    /// Attribute reference, bound to an entity value at evaluation time
    AttributeRef(AttributeToken),
    /// Bare identifier; never resolvable, fails per entity at evaluation
    Identifier(String),

    // === Operators ===
    /// Unary operation
    Unary(UnaryExpr),
    /// Binary operation
    Binary(BinaryExpr),
    /// Parenthesized group, preserved so rendered text keeps the
    /// author's grouping
    Group(Box<Expression>),

    // === Calls ===
    /// Registry function invocation
    Call(CallExpr),
}

/// Literal value kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(Decimal),
    Text(String),
}

/// Unary operation
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expression>,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation
    Negate,
}

/// Binary operation
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expression>,
    pub op: BinaryOp,
    pub right: Box<Expression>,
}

impl BinaryExpr {
    pub fn new(left: Expression, op: BinaryOp, right: Expression) -> Self {
        Self {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // === Arithmetic ===
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // === Comparison ===
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl BinaryOp {
    /// Source-text symbol for this operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Function invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expression>,
}

impl Expression {
    /// Collect every attribute token in the tree, left to right
    pub fn attribute_tokens(&self) -> Vec<&AttributeToken> {
        let mut tokens = Vec::new();
        self.collect_tokens(&mut tokens);
        tokens
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a AttributeToken>) {
        match self {
            Self::AttributeRef(token) => out.push(token),
            Self::Literal(_) | Self::Identifier(_) => {}
            Self::Unary(u) => u.operand.collect_tokens(out),
            Self::Binary(b) => {
                b.left.collect_tokens(out);
                b.right.collect_tokens(out);
            }
            Self::Group(inner) => inner.collect_tokens(out),
            Self::Call(c) => {
                for arg in &c.args {
                    arg.collect_tokens(out);
                }
            }
        }
    }
}
