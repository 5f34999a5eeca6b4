use std::ops::Range;

use crate::condition::Condition;
use crate::parser::ParseError;
use crate::parser::structural;
use crate::source::SourceLine;

/// The kind of a block node, with the data its header carries.
#[derive(Debug, Clone)]
pub enum BlockKind {
    /// The root of a program. Has no header line of its own.
    Program,
    If {
        condition: Condition,
        /// Bound once the following `else ... end` has been fully parsed.
        otherwise: Option<Box<Block>>,
    },
    Else,
    /// Pretest loop.
    While(Condition),
    /// Post-test loop: the body runs once before the first comparison.
    DoWhile(Condition),
    /// A single primitive statement; `header` holds its text.
    Line,
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Program => "program",
            BlockKind::If { .. } => "if",
            BlockKind::Else => "else",
            BlockKind::While(_) => "while",
            BlockKind::DoWhile(_) => "dowhile",
            BlockKind::Line => "line",
        }
    }
}

/// A node of the program tree.
///
/// Control blocks keep their raw body lines instead of a parsed child list.
/// The children are derived again with [`Block::children`] every time the
/// block runs, so no iteration ever sees a tree left over from the last one.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// The header line (`if == a b`, `while ...`), or the statement for a `Line`.
    /// `None` only for the program root.
    pub header: Option<SourceLine>,
    /// Raw body lines, including the closing `end` for control blocks.
    pub body: Vec<SourceLine>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub file_id: usize,
}

impl Block {
    pub fn program(lines: Vec<SourceLine>, file_id: usize) -> Self {
        Block {
            kind: BlockKind::Program,
            header: None,
            body: lines,
            file_id,
        }
    }

    pub fn line(line: SourceLine, file_id: usize) -> Self {
        Block {
            kind: BlockKind::Line,
            header: Some(line),
            body: Vec::new(),
            file_id,
        }
    }

    /// Parse the body into a fresh list of child blocks.
    pub fn children(&self) -> Result<Vec<Block>, ParseError> {
        match self.kind {
            BlockKind::Line => Ok(Vec::new()),
            _ => structural::build(&self.body, self.file_id),
        }
    }

    /// Byte span of the header line, or of the whole body for the root.
    pub fn span(&self) -> Range<usize> {
        match (&self.header, self.body.first(), self.body.last()) {
            (Some(header), _, _) => header.span.clone(),
            (None, Some(first), Some(last)) => first.span.start..last.span.end,
            _ => 0..0,
        }
    }

    /// 1-based line number of the header, 0 for the root.
    pub fn line_number(&self) -> usize {
        self.header.as_ref().map(|h| h.number).unwrap_or(0)
    }
}
