use std::ops::Range;

/// The block terminator keyword. A line matches only when it is exactly `end`.
pub const TERMINATOR: &str = "end";

/// One physical line of program text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// Line content with surrounding whitespace removed.
    pub text: String,
    /// 1-based line number in the source file.
    pub number: usize,
    /// Byte span of the trimmed text in source, for error reporting.
    pub span: Range<usize>,
}

impl SourceLine {
    pub fn is_terminator(&self) -> bool {
        self.text == TERMINATOR
    }

    /// First whitespace-separated word, or "" for an empty line.
    pub fn keyword(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }
}

/// Split program text into its significant lines.
///
/// Indentation carries no meaning, so every line is trimmed. Blank lines and
/// `#` comment lines are dropped here and never reach the block builder.
pub fn split_lines(source: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut offset = 0;

    for (index, raw) in source.split('\n').enumerate() {
        let line_start = offset;
        offset += raw.len() + 1;

        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let leading = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let start = line_start + leading;
        lines.push(SourceLine {
            text: text.to_string(),
            number: index + 1,
            span: start..start + text.len(),
        });
    }

    lines
}
