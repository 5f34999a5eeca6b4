use flow::condition::Condition;
use flow::token::Token;

use crate::environment::{Environment, ScopeId};
use crate::error::RuntimeError;

/// Resolve a token sequence to one string.
///
/// A bare word naming a variable visible from `scope` is replaced by the
/// variable's value; everything else is taken literally. The pieces are
/// joined with single spaces and the result is trimmed.
pub fn resolve(tokens: &[Token], env: &Environment, scope: ScopeId) -> String {
    let pieces: Vec<String> = tokens
        .iter()
        .map(|token| match token {
            Token::Word(word) => match env.lookup(scope, word) {
                Ok(variable) => variable.value.to_string(),
                Err(_) => word.clone(),
            },
            Token::Quoted(text) => text.clone(),
        })
        .collect();
    pieces.join(" ").trim().to_string()
}

/// Resolve a token sequence and parse it as a base-10 integer.
/// `operation` names what needed the integer, for the error message.
pub fn resolve_integer(
    tokens: &[Token],
    env: &Environment,
    scope: ScopeId,
    operation: &str,
) -> Result<i64, RuntimeError> {
    let text = resolve(tokens, env, scope);
    text.parse::<i64>()
        .map_err(|_| RuntimeError::NonNumericOperand {
            operation: operation.to_string(),
            value: text,
        })
}

/// Evaluate the comparison of an `if`, `while` or `dowhile` header.
pub fn evaluate_condition(
    condition: &Condition,
    env: &Environment,
    scope: ScopeId,
) -> Result<bool, RuntimeError> {
    let operation = condition.operation.name();
    let a = resolve_integer(&condition.a, env, scope, operation)?;
    let b = resolve_integer(&condition.b, env, scope, operation)?;
    let result = condition.operation.apply(a, b);
    tracing::trace!(a, b, op = condition.operation.symbol(), result, "comparison");
    Ok(result)
}
