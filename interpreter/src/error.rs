use std::fmt;
use std::ops::Range;

use flow::parser::ParseError;
use flow::statement::StatementError;

#[derive(Debug)]
pub enum RuntimeError {
    TypeError { expected: String, got: String },
    UndeclaredVariable(String),
    /// A comparison or integer operand did not resolve to a base-10 integer.
    NonNumericOperand { operation: String, value: String },
    UnsupportedStatement(String),
    MalformedStatement(String),
    DivisionByZero,
    IntegerOverflow(String),
    /// Blocks nested past the executor's scope limit.
    StackOverflow,
    /// A block body failed to rebuild.
    Structure(ParseError),
    IoError(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeError { expected, got } => {
                write!(f, "type error: expected {}, got {}", expected, got)
            }
            RuntimeError::UndeclaredVariable(name) => write!(f, "undeclared variable: {}", name),
            RuntimeError::NonNumericOperand { operation, value } => {
                write!(
                    f,
                    "attempted to use {} on non-integer value '{}'",
                    operation, value
                )
            }
            RuntimeError::UnsupportedStatement(keyword) => {
                write!(f, "unsupported statement keyword: {}", keyword)
            }
            RuntimeError::MalformedStatement(msg) => write!(f, "{}", msg),
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::IntegerOverflow(op) => write!(f, "integer overflow in {}", op),
            RuntimeError::StackOverflow => write!(f, "stack overflow: blocks nested too deeply"),
            RuntimeError::Structure(err) => write!(f, "{}", err),
            RuntimeError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<StatementError> for RuntimeError {
    fn from(error: StatementError) -> Self {
        match error {
            StatementError::UnsupportedKeyword(keyword) => {
                RuntimeError::UnsupportedStatement(keyword)
            }
            malformed @ StatementError::Malformed { .. } => {
                RuntimeError::MalformedStatement(malformed.to_string())
            }
        }
    }
}

/// A runtime error enriched with source location information.
#[derive(Debug)]
pub struct DiagnosticError {
    pub error: RuntimeError,
    pub span: Option<Range<usize>>,
    pub source_id: usize,
}

impl DiagnosticError {
    /// Attach a location unless the error already carries one.
    pub fn at(mut self, span: Range<usize>, source_id: usize) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
            self.source_id = source_id;
        }
        self
    }
}

impl From<RuntimeError> for DiagnosticError {
    fn from(error: RuntimeError) -> Self {
        DiagnosticError {
            error,
            span: None,
            source_id: 0,
        }
    }
}

impl From<ParseError> for DiagnosticError {
    fn from(error: ParseError) -> Self {
        let span = Some(error.span.clone());
        let source_id = error.file_id;
        DiagnosticError {
            error: RuntimeError::Structure(error),
            span,
            source_id,
        }
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for DiagnosticError {}
