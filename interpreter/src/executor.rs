use std::io::Write;

use flow::Program;
use flow::block::{Block, BlockKind};
use flow::condition::Condition;
use flow::source::SourceLine;
use flow::statement::{ArithmeticOperator, Statement, VariableKind};

use crate::environment::{Environment, ScopeId, Variable};
use crate::error::{DiagnosticError, RuntimeError};
use crate::evaluator::{evaluate_condition, resolve, resolve_integer};
use crate::runtime_value::RuntimeValue;

/// Scope frames allowed below the root before execution stops.
const MAX_DEPTH: usize = flow::parser::MAX_NESTING;

/// Parse and run program text. Parse errors are returned as diagnostics.
pub fn run_source(
    source: &str,
    output: &mut dyn Write,
) -> Result<Vec<Variable>, DiagnosticError> {
    let program = flow::parser::Parser::new(source.to_string(), 0)
        .parse()
        .map_err(|errors| match errors.into_iter().next() {
            Some(first) => DiagnosticError::from(first),
            None => RuntimeError::MalformedStatement("program failed to parse".to_string()).into(),
        })?;
    execute_program(&program, output)
}

/// Execute a program from its root block.
///
/// Returns the variables of the root scope as they were when the program
/// finished. Output written before a failure stays written.
#[tracing::instrument(level = "debug", skip_all, fields(source_id = program.source_id))]
pub fn execute_program(
    program: &Program,
    output: &mut dyn Write,
) -> Result<Vec<Variable>, DiagnosticError> {
    let mut env = Environment::new();
    let root = env.push_scope(None, program.root.kind.name());

    let result = run_body(&program.root, root, &mut env, output);

    let globals = env
        .pop_scope()
        .map(|scope| scope.into_variables())
        .unwrap_or_default();
    result?;
    tracing::debug!(globals = globals.len(), "program finished");
    Ok(globals)
}

/// Run one block whose enclosing scope is `scope`.
pub fn execute_block(
    block: &Block,
    scope: ScopeId,
    env: &mut Environment,
    output: &mut dyn Write,
) -> Result<(), DiagnosticError> {
    match &block.kind {
        BlockKind::Line => match &block.header {
            Some(line) => execute_line(line, block, scope, env, output),
            None => Err(located(
                RuntimeError::MalformedStatement("statement block has no text".to_string()),
                block,
            )),
        },
        BlockKind::If {
            condition,
            otherwise,
        } => {
            let taken = evaluate_condition(condition, env, scope)
                .map_err(|e| located(e, block))?;
            tracing::debug!(line = block.line_number(), taken, "if");
            if taken {
                run_in_new_scope(block, scope, env, output)
            } else if let Some(otherwise) = otherwise {
                run_in_new_scope(otherwise, scope, env, output)
            } else {
                Ok(())
            }
        }
        BlockKind::While(condition) => {
            let frame = enter_scope(block, scope, env)?;
            let result = run_while(block, condition, frame, env, output);
            env.pop_scope();
            result
        }
        BlockKind::DoWhile(condition) => {
            let frame = enter_scope(block, scope, env)?;
            let result = run_do_while(block, condition, frame, env, output);
            env.pop_scope();
            result
        }
        BlockKind::Else | BlockKind::Program => run_in_new_scope(block, scope, env, output),
    }
}

/// Rebuild `block`'s children and run them in order within `scope`.
fn run_body(
    block: &Block,
    scope: ScopeId,
    env: &mut Environment,
    output: &mut dyn Write,
) -> Result<(), DiagnosticError> {
    let children = block.children()?;
    for child in &children {
        execute_block(child, scope, env, output)?;
    }
    Ok(())
}

fn run_in_new_scope(
    block: &Block,
    parent: ScopeId,
    env: &mut Environment,
    output: &mut dyn Write,
) -> Result<(), DiagnosticError> {
    let frame = enter_scope(block, parent, env)?;
    let result = run_body(block, frame, env, output);
    env.pop_scope();
    result
}

/// Push a frame for `block`, refusing to nest past [`MAX_DEPTH`].
fn enter_scope(
    block: &Block,
    parent: ScopeId,
    env: &mut Environment,
) -> Result<ScopeId, DiagnosticError> {
    if env.depth() > MAX_DEPTH {
        return Err(located(RuntimeError::StackOverflow, block));
    }
    Ok(env.push_scope(Some(parent), block.kind.name()))
}

/// Pretest loop. The body is rebuilt from its raw lines before every
/// comparison; only variables in `frame` and its ancestors carry over.
fn run_while(
    block: &Block,
    condition: &Condition,
    frame: ScopeId,
    env: &mut Environment,
    output: &mut dyn Write,
) -> Result<(), DiagnosticError> {
    let mut iterations = 0u64;
    loop {
        let children = block.children()?;
        if !evaluate_condition(condition, env, frame).map_err(|e| located(e, block))? {
            break;
        }
        iterations += 1;
        tracing::trace!(line = block.line_number(), iterations, "while iteration");
        for child in &children {
            execute_block(child, frame, env, output)?;
        }
    }
    tracing::debug!(line = block.line_number(), iterations, "while finished");
    Ok(())
}

/// Post-test loop: the body always runs once before the first comparison.
fn run_do_while(
    block: &Block,
    condition: &Condition,
    frame: ScopeId,
    env: &mut Environment,
    output: &mut dyn Write,
) -> Result<(), DiagnosticError> {
    let mut iterations = 0u64;
    loop {
        iterations += 1;
        tracing::trace!(line = block.line_number(), iterations, "dowhile iteration");
        run_body(block, frame, env, output)?;
        if !evaluate_condition(condition, env, frame).map_err(|e| located(e, block))? {
            break;
        }
    }
    tracing::debug!(line = block.line_number(), iterations, "dowhile finished");
    Ok(())
}

fn execute_line(
    line: &SourceLine,
    block: &Block,
    scope: ScopeId,
    env: &mut Environment,
    output: &mut dyn Write,
) -> Result<(), DiagnosticError> {
    execute_statement(&line.text, scope, env, output).map_err(|e| located(e, block))
}

/// Execute one primitive statement.
pub fn execute_statement(
    text: &str,
    scope: ScopeId,
    env: &mut Environment,
    output: &mut dyn Write,
) -> Result<(), RuntimeError> {
    match Statement::parse(text)? {
        Statement::Declare { kind, name, value } => {
            let value = match kind {
                VariableKind::Integer => {
                    RuntimeValue::Integer(resolve_integer(&value, env, scope, "int")?)
                }
                VariableKind::String => RuntimeValue::String(resolve(&value, env, scope)),
            };
            tracing::trace!(%name, %value, scope_depth = env.depth(), "declare");
            env.declare(scope, &name, kind, value);
        }
        Statement::Assign { name, value } => {
            let kind = env.lookup(scope, &name)?.kind;
            let value = match kind {
                VariableKind::Integer => {
                    RuntimeValue::Integer(resolve_integer(&value, env, scope, "set")?)
                }
                VariableKind::String => RuntimeValue::String(resolve(&value, env, scope)),
            };
            env.lookup_mut(scope, &name)?.value = value;
        }
        Statement::Arithmetic {
            operator,
            name,
            operand,
        } => {
            let current = env.lookup(scope, &name)?;
            let a = current
                .value
                .as_integer()
                .ok_or_else(|| RuntimeError::TypeError {
                    expected: VariableKind::Integer.to_string(),
                    got: current.value.type_name().to_string(),
                })?;
            let b = resolve_integer(&operand, env, scope, operator.keyword())?;
            let result = operator.apply(a, b).ok_or_else(|| {
                let divides = matches!(
                    operator,
                    ArithmeticOperator::Divide | ArithmeticOperator::Modulo
                );
                if b == 0 && divides {
                    RuntimeError::DivisionByZero
                } else {
                    RuntimeError::IntegerOverflow(operator.keyword().to_string())
                }
            })?;
            env.lookup_mut(scope, &name)?.value = RuntimeValue::Integer(result);
        }
        Statement::Print(tokens) => {
            let text = resolve(&tokens, env, scope);
            writeln!(output, "{}", text).map_err(|e| RuntimeError::IoError(e.to_string()))?;
        }
    }
    Ok(())
}

fn located(error: impl Into<DiagnosticError>, block: &Block) -> DiagnosticError {
    error.into().at(block.span(), block.file_id)
}
