//! Primitive statements carried by `Line` blocks.
//!
//! Statements are parsed when the line runs, not when the tree is built, so
//! an unknown keyword inside a branch that never executes is not an error.

use std::fmt;

use crate::token::{Token, tokenize};

/// Declared kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Integer,
    String,
}

impl VariableKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            VariableKind::Integer => "int",
            VariableKind::String => "string",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// In-place integer update applied by `add`, `sub`, `mul`, `div` and `mod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOperator {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "add" => Some(ArithmeticOperator::Add),
            "sub" => Some(ArithmeticOperator::Subtract),
            "mul" => Some(ArithmeticOperator::Multiply),
            "div" => Some(ArithmeticOperator::Divide),
            "mod" => Some(ArithmeticOperator::Modulo),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "add",
            ArithmeticOperator::Subtract => "sub",
            ArithmeticOperator::Multiply => "mul",
            ArithmeticOperator::Divide => "div",
            ArithmeticOperator::Modulo => "mod",
        }
    }

    /// `None` on overflow or a zero divisor.
    pub fn apply(&self, a: i64, b: i64) -> Option<i64> {
        match self {
            ArithmeticOperator::Add => a.checked_add(b),
            ArithmeticOperator::Subtract => a.checked_sub(b),
            ArithmeticOperator::Multiply => a.checked_mul(b),
            ArithmeticOperator::Divide => a.checked_div(b),
            ArithmeticOperator::Modulo => a.checked_rem(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `int <name> = <value...>` / `string <name> = <value...>`
    Declare {
        kind: VariableKind,
        name: String,
        value: Vec<Token>,
    },
    /// `set <name> = <value...>`
    Assign { name: String, value: Vec<Token> },
    /// `add <name> <value...>` and friends
    Arithmetic {
        operator: ArithmeticOperator,
        name: String,
        operand: Vec<Token>,
    },
    /// `print <value...>`
    Print(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementError {
    /// The leading word is not a statement keyword.
    UnsupportedKeyword(String),
    /// A known keyword with the wrong shape.
    Malformed { keyword: String, usage: &'static str },
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementError::UnsupportedKeyword(keyword) => {
                write!(f, "unsupported statement keyword: {}", keyword)
            }
            StatementError::Malformed { keyword, usage } => {
                write!(f, "malformed `{}` statement, expected: {}", keyword, usage)
            }
        }
    }
}

impl std::error::Error for StatementError {}

impl Statement {
    pub fn parse(text: &str) -> Result<Statement, StatementError> {
        let tokens = tokenize(text);
        let keyword = match tokens.first() {
            Some(Token::Word(word)) => word.as_str(),
            Some(other) => return Err(StatementError::UnsupportedKeyword(other.to_string())),
            None => return Err(StatementError::UnsupportedKeyword(String::new())),
        };
        let rest = &tokens[1..];

        match keyword {
            "int" | "string" => {
                let kind = if keyword == "int" {
                    VariableKind::Integer
                } else {
                    VariableKind::String
                };
                let usage = if kind == VariableKind::Integer {
                    "int <name> = <value>"
                } else {
                    "string <name> = <value>"
                };
                let (name, value) = split_assignment(keyword, rest, usage)?;
                Ok(Statement::Declare { kind, name, value })
            }
            "set" => {
                let (name, value) = split_assignment(keyword, rest, "set <name> = <value>")?;
                Ok(Statement::Assign { name, value })
            }
            "print" => Ok(Statement::Print(rest.to_vec())),
            other => {
                let Some(operator) = ArithmeticOperator::from_keyword(other) else {
                    return Err(StatementError::UnsupportedKeyword(other.to_string()));
                };
                match rest {
                    [Token::Word(name), operand @ ..] if !operand.is_empty() => {
                        Ok(Statement::Arithmetic {
                            operator,
                            name: name.clone(),
                            operand: operand.to_vec(),
                        })
                    }
                    _ => Err(StatementError::Malformed {
                        keyword: other.to_string(),
                        usage: "<add|sub|mul|div|mod> <name> <value>",
                    }),
                }
            }
        }
    }
}

/// Split `<name> = <value...>`.
fn split_assignment(
    keyword: &str,
    tokens: &[Token],
    usage: &'static str,
) -> Result<(String, Vec<Token>), StatementError> {
    match tokens {
        [Token::Word(name), Token::Word(eq), value @ ..] if eq == "=" && is_identifier(name) => {
            Ok((name.clone(), value.to_vec()))
        }
        _ => Err(StatementError::Malformed {
            keyword: keyword.to_string(),
            usage,
        }),
    }
}

/// Variable names start with a letter or `_` and continue with
/// letters, digits or `_`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
