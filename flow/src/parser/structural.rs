use crate::block::{Block, BlockKind};
use crate::condition::{CompareOperation, Condition};
use crate::parser::error::{ParseError, ParseErrorKind};
use crate::source::{SourceLine, TERMINATOR};
use crate::token::{Token, tokenize};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Deepest control-block nesting a program may use.
pub const MAX_NESTING: usize = 256;

/// Build the ordered child list of a block from its raw body lines.
///
/// Stops at the first `end` that closes no block of this pass: that line is
/// the owner's own terminator.
pub fn build(lines: &[SourceLine], file_id: usize) -> Result<Vec<Block>, ParseError> {
    scan(lines, file_id).map(|scan| scan.blocks)
}

/// Result of one builder pass over a line buffer.
pub(crate) struct Scan<'a> {
    pub blocks: Vec<Block>,
    /// Lines after the owner's terminator. Empty when the buffer ran out first.
    pub rest: &'a [SourceLine],
}

pub(crate) fn scan(lines: &[SourceLine], file_id: usize) -> Result<Scan<'_>, ParseError> {
    let mut state = BuildState::new(file_id);

    for (i, line) in lines.iter().enumerate() {
        if state.feed(line)? == Step::OwnerTerminated {
            return Ok(Scan {
                blocks: state.blocks,
                rest: &lines[i + 1..],
            });
        }
    }

    state.finish()?;
    Ok(Scan {
        blocks: state.blocks,
        rest: &[],
    })
}

/// Reject programs nested deeper than [`MAX_NESTING`] in one linear pass,
/// before any body is built. Stops at a stray top-level `end`.
pub(crate) fn check_nesting(lines: &[SourceLine], file_id: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for line in lines {
        if line.is_terminator() {
            if depth == 0 {
                return Ok(());
            }
            depth -= 1;
        } else if is_header_keyword(line.keyword()) {
            depth += 1;
            if depth > MAX_NESTING {
                return Err(ParseError::error(
                    ParseErrorKind::NestingTooDeep,
                    format!("blocks nested more than {} levels deep", MAX_NESTING),
                    line.span.clone(),
                    file_id,
                ));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Build state
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    OwnerTerminated,
}

enum Header {
    If(Condition),
    Else,
    While(Condition),
    DoWhile(Condition),
}

/// The control block currently collecting body lines.
struct OpenBlock {
    header: Header,
    line: SourceLine,
    body: Vec<SourceLine>,
}

struct BuildState {
    file_id: usize,
    blocks: Vec<Block>,
    open: Option<OpenBlock>,
    /// Headers opened inside `open` whose `end` has not been seen yet.
    nesting: usize,
    /// Index into `blocks` of the If an `else` may still bind to.
    last_if: Option<usize>,
}

impl BuildState {
    fn new(file_id: usize) -> Self {
        BuildState {
            file_id,
            blocks: Vec::new(),
            open: None,
            nesting: 0,
            last_if: None,
        }
    }

    fn feed(&mut self, line: &SourceLine) -> Result<Step, ParseError> {
        if line.is_terminator() {
            return Ok(self.terminate(line));
        }

        if let Some(open) = self.open.as_mut() {
            if is_header_keyword(line.keyword()) {
                self.nesting += 1;
            }
            open.body.push(line.clone());
            return Ok(Step::Continue);
        }

        match line.keyword() {
            "else" => {
                if self.last_if.is_none() {
                    return Err(ParseError::error(
                        ParseErrorKind::DanglingElse,
                        "`else` without a preceding `if`",
                        line.span.clone(),
                        self.file_id,
                    )
                    .with_note("an `else` block must directly follow the `end` of an `if` block"));
                }
                expect_arity::<1>(line, "else", self.file_id)?;
                self.open_block(Header::Else, line);
            }
            "if" => {
                let condition = parse_condition(line, self.file_id)?;
                self.last_if = None;
                self.open_block(Header::If(condition), line);
            }
            "while" => {
                let condition = parse_condition(line, self.file_id)?;
                self.last_if = None;
                self.open_block(Header::While(condition), line);
            }
            "dowhile" => {
                let condition = parse_condition(line, self.file_id)?;
                self.last_if = None;
                self.open_block(Header::DoWhile(condition), line);
            }
            _ => {
                self.last_if = None;
                self.blocks.push(Block::line(line.clone(), self.file_id));
            }
        }

        Ok(Step::Continue)
    }

    fn open_block(&mut self, header: Header, line: &SourceLine) {
        self.open = Some(OpenBlock {
            header,
            line: line.clone(),
            body: Vec::new(),
        });
    }

    fn terminate(&mut self, line: &SourceLine) -> Step {
        let Some(mut open) = self.open.take() else {
            return Step::OwnerTerminated;
        };

        open.body.push(line.clone());
        if self.nesting > 0 {
            self.nesting -= 1;
            self.open = Some(open);
            return Step::Continue;
        }

        let kind = match open.header {
            Header::If(condition) => BlockKind::If {
                condition,
                otherwise: None,
            },
            Header::Else => BlockKind::Else,
            Header::While(condition) => BlockKind::While(condition),
            Header::DoWhile(condition) => BlockKind::DoWhile(condition),
        };
        let block = Block {
            kind,
            header: Some(open.line),
            body: open.body,
            file_id: self.file_id,
        };

        match block.kind {
            BlockKind::If { .. } => {
                self.last_if = Some(self.blocks.len());
                self.blocks.push(block);
            }
            BlockKind::Else => {
                // The `else` header was only accepted with a pending If.
                if let Some(index) = self.last_if.take() {
                    if let BlockKind::If { otherwise, .. } = &mut self.blocks[index].kind {
                        *otherwise = Some(Box::new(block));
                    }
                }
            }
            _ => self.blocks.push(block),
        }

        Step::Continue
    }

    fn finish(&self) -> Result<(), ParseError> {
        match &self.open {
            Some(open) => Err(ParseError::error(
                ParseErrorKind::UnterminatedBlock,
                format!("`{}` block is never closed", open.line.keyword()),
                open.line.span.clone(),
                self.file_id,
            )
            .with_note(format!(
                "add a line containing only `{}` after the block body",
                TERMINATOR
            ))),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

fn is_header_keyword(keyword: &str) -> bool {
    matches!(keyword, "if" | "else" | "while" | "dowhile")
}

fn expect_arity<const N: usize>(
    line: &SourceLine,
    usage: &str,
    file_id: usize,
) -> Result<[Token; N], ParseError> {
    tokenize(&line.text).try_into().map_err(|tokens: Vec<Token>| {
        ParseError::error(
            ParseErrorKind::MalformedHeader,
            format!(
                "`{}` header takes {} token(s), found {}",
                line.keyword(),
                N,
                tokens.len()
            ),
            line.span.clone(),
            file_id,
        )
        .with_note(format!("expected: {}", usage))
    })
}

/// Parse `<keyword> <op> <a> <b>`.
fn parse_condition(line: &SourceLine, file_id: usize) -> Result<Condition, ParseError> {
    let usage = format!("{} <op> <a> <b>", line.keyword());
    let [_, op, a, b] = expect_arity::<4>(line, &usage, file_id)?;

    let operation = match &op {
        Token::Word(symbol) => CompareOperation::from_symbol(symbol),
        Token::Quoted(_) => None,
    }
    .ok_or_else(|| {
        ParseError::error(
            ParseErrorKind::MalformedHeader,
            format!("unknown comparison operator `{}`", op),
            line.span.clone(),
            file_id,
        )
        .with_note("supported operators: ==, !=, >, <")
    })?;

    Ok(Condition {
        operation,
        a: vec![a],
        b: vec![b],
    })
}
