//! Expressions and conditions.
//!
//! [`Expression`] is a named fragment of SQL text; [`Condition`] is a binary
//! node over operands that may themselves be nested conditions, which is how
//! chained `where` calls fold into a single tree. Rendering is `Display`
//! driven and degrades gracefully: a condition missing one side renders the
//! other side alone, and one missing both renders as empty text.

use std::fmt;

/// A boxed piece of SQL text, compared by rendered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    value: String,
}

impl Expression {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ==================== Operators ====================

/// A comparison operator usable in `where` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The token joining two conditions in a `where` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Conditions ====================

/// One side of a [`Condition`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Pre-rendered text (a qualified column name, a placeholder, ...).
    Text(String),
    /// A named expression.
    Expr(Expression),
    /// A nested condition; this is what chained conditions fold into.
    Nested(Box<Condition>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Expr(e) => e.fmt(f),
            Self::Nested(c) => c.fmt(f),
        }
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Self::Expr(e)
    }
}

impl From<Condition> for Operand {
    fn from(c: Condition) -> Self {
        Self::Nested(Box::new(c))
    }
}

/// A binary condition: `left op right`, either side optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Option<Operand>,
    pub op: String,
    pub right: Option<Operand>,
}

impl Condition {
    pub fn new(
        left: impl Into<Operand>,
        op: impl Into<String>,
        right: impl Into<Operand>,
    ) -> Self {
        Self {
            left: Some(left.into()),
            op: op.into(),
            right: Some(right.into()),
        }
    }

    /// A plain comparison between two rendered operands.
    pub fn compare(left: impl Into<Operand>, op: Op, right: impl Into<Operand>) -> Self {
        Self::new(left, op.as_str(), right)
    }

    /// Fold two conditions into one, joined by `logic`. Chained `where`
    /// calls apply this left-to-right, so insertion order is preserved.
    pub fn fold(left: Condition, right: Condition, logic: Logic) -> Self {
        Self::new(left, logic.as_str(), right)
    }

    /// Wrap a bare expression as a one-sided condition.
    pub fn from_expression(expr: Expression) -> Self {
        Self {
            left: Some(Operand::Expr(expr)),
            op: String::new(),
            right: None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.left, &self.right) {
            (Some(l), Some(r)) => write!(f, "{l} {} {r}", self.op),
            (Some(l), None) => l.fmt(f),
            (None, Some(r)) => r.fmt(f),
            (None, None) => Ok(()),
        }
    }
}
