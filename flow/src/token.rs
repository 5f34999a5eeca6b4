use std::fmt;

/// A single operand token.
///
/// Bare words may name a variable; quoted tokens are always literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(String),
    /// `"..."` with the quotes removed. Inner whitespace is kept.
    Quoted(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(s) => write!(f, "{}", s),
            Token::Quoted(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Split a line into tokens on whitespace, keeping `"quoted text"` together.
/// An unclosed quote runs to the end of the line.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut quoted = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                quoted.push(c);
            }
            tokens.push(Token::Quoted(quoted));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    tokens
}
