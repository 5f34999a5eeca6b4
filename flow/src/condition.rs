use std::fmt;

use crate::token::Token;

/// Comparison operator of a conditional header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperation {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
}

impl CompareOperation {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(CompareOperation::Equals),
            "!=" => Some(CompareOperation::NotEquals),
            ">" => Some(CompareOperation::GreaterThan),
            "<" => Some(CompareOperation::LessThan),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOperation::Equals => "==",
            CompareOperation::NotEquals => "!=",
            CompareOperation::GreaterThan => ">",
            CompareOperation::LessThan => "<",
        }
    }

    /// Lowercase operation name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            CompareOperation::Equals => "equals",
            CompareOperation::NotEquals => "not-equals",
            CompareOperation::GreaterThan => "greater-than",
            CompareOperation::LessThan => "less-than",
        }
    }

    pub fn apply(&self, a: i64, b: i64) -> bool {
        match self {
            CompareOperation::Equals => a == b,
            CompareOperation::NotEquals => a != b,
            CompareOperation::GreaterThan => a > b,
            CompareOperation::LessThan => a < b,
        }
    }
}

/// The `<op> <a> <b>` part of an `if`, `while` or `dowhile` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub operation: CompareOperation,
    pub a: Vec<Token>,
    pub b: Vec<Token>,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation.symbol())?;
        for token in self.a.iter().chain(&self.b) {
            write!(f, " {}", token)?;
        }
        Ok(())
    }
}
