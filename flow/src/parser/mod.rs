pub mod error;
pub(crate) mod structural;

pub use error::{ParseError, ParseErrorKind};
pub use structural::{MAX_NESTING, build};

use crate::Program;
use crate::block::{Block, BlockKind};
use crate::source::split_lines;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source text into a complete Program.
    ///
    /// Every nested body is built once here so that structural errors are
    /// reported before anything runs, even in branches that never execute.
    pub fn parse(&self) -> Result<Program, Vec<ParseError>> {
        let mut lines = split_lines(&self.source);
        structural::check_nesting(&lines, self.file_id).map_err(|e| vec![e])?;
        let scan = structural::scan(&lines, self.file_id).map_err(|e| vec![e])?;

        let mut errors = Vec::new();
        for block in &scan.blocks {
            validate(block, &mut errors);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut warnings = Vec::new();
        if let (Some(first), Some(last)) = (scan.rest.first(), scan.rest.last()) {
            warnings.push(
                ParseError::warning(
                    ParseErrorKind::UnreachableCode,
                    format!(
                        "{} line(s) after a top-level `end` are never run",
                        scan.rest.len()
                    ),
                    first.span.start..last.span.end,
                    self.file_id,
                )
                .with_note("`end` outside of any block ends the program"),
            );
        }

        let reachable = lines.len() - scan.rest.len();
        lines.truncate(reachable);

        Ok(Program {
            root: Block::program(lines, self.file_id),
            warnings,
            source_id: self.file_id,
        })
    }
}

/// Build every nested body below `block`, collecting the errors.
fn validate(block: &Block, errors: &mut Vec<ParseError>) {
    if let BlockKind::If {
        otherwise: Some(otherwise),
        ..
    } = &block.kind
    {
        validate(otherwise, errors);
    }

    match block.children() {
        Ok(children) => {
            for child in &children {
                validate(child, errors);
            }
        }
        Err(error) => errors.push(error),
    }
}
