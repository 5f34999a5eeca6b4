pub mod environment;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod runtime_value;

pub use environment::{Environment, ScopeId, Variable};
pub use error::{DiagnosticError, RuntimeError};
pub use executor::{execute_block, execute_program, run_source};
pub use runtime_value::RuntimeValue;
