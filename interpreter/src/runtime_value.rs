use std::fmt;

use flow::statement::VariableKind;

/// The value held by a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeValue {
    Integer(i64),
    String(String),
}

impl RuntimeValue {
    pub fn kind(&self) -> VariableKind {
        match self {
            RuntimeValue::Integer(_) => VariableKind::Integer,
            RuntimeValue::String(_) => VariableKind::String,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().keyword()
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RuntimeValue::Integer(n) => Some(*n),
            RuntimeValue::String(_) => None,
        }
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Integer(n) => write!(f, "{}", n),
            RuntimeValue::String(s) => write!(f, "{}", s),
        }
    }
}
