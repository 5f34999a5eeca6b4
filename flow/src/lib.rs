pub mod block;
pub mod condition;
pub mod parser;
pub mod source;
pub mod statement;
pub mod token;

use crate::block::Block;
use crate::parser::ParseError;

/// A parsed Flow program.
#[derive(Debug, Clone)]
pub struct Program {
    /// The root block. Its body is every line of the source file.
    pub root: Block,
    /// Non-fatal findings from parsing (e.g. lines after a stray `end`).
    pub warnings: Vec<ParseError>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
