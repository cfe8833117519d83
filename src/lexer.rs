//! Quote-state tracking shared by the line parser and the token resolver.
//!
//! The parser only needs to know whether an operator character is live, so it drives a
//! [`QuoteTracker`] one character at a time. The resolver needs the structure of a
//! token, so [`scan_word`] runs a small recursive-descent scanner over it and returns
//! the [`WordPart`]s that expansion works on.

use crate::error::ShellError;

const UNMATCHED_QUOTES: &str = "Unmatched quotes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    Back,
}

/// Incremental quote state machine.
///
/// A back-quote opened inside double quotes returns to the double-quoted state when
/// it closes, so the open quotes are kept as a stack.
#[derive(Debug, Default)]
pub struct QuoteTracker {
    stack: Vec<Quote>,
}

impl QuoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_plain(&self) -> bool {
        self.stack.is_empty()
    }

    /// Feed the next character of the line.
    pub fn advance(&mut self, ch: char) {
        match (self.stack.last(), ch) {
            (None, '\'') => self.stack.push(Quote::Single),
            (None, '"') => self.stack.push(Quote::Double),
            (None, '`') => self.stack.push(Quote::Back),
            (Some(Quote::Single), '\'') => {
                self.stack.pop();
            }
            (Some(Quote::Double), '"') => {
                self.stack.pop();
            }
            (Some(Quote::Double), '`') => self.stack.push(Quote::Back),
            (Some(Quote::Back), '`') => {
                self.stack.pop();
            }
            _ => {}
        }
    }

    /// Error out if any quote is still open at the end of input.
    pub fn finish(&self) -> Result<(), ShellError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(ShellError::syntax(UNMATCHED_QUOTES))
        }
    }
}

/// A piece of one raw token, with its quoting already interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Unquoted literal text.
    Literal(String),
    /// An unquoted, unescaped `*`.
    Wildcard,
    /// Text from inside single or double quotes. May be empty (`''`).
    Quoted(String),
    /// A back-quoted command, and whether it sat inside double quotes.
    CmdSubst { command: String, quoted: bool },
}

struct Scanner {
    input: Vec<char>,
    pos: usize,
    parts: Vec<WordPart>,
    buffer: String,
}

impl Scanner {
    fn new(token: &str) -> Self {
        Scanner {
            input: token.chars().collect(),
            pos: 0,
            parts: Vec::new(),
            buffer: String::new(),
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn flush_literal(&mut self) {
        if !self.buffer.is_empty() {
            self.parts
                .push(WordPart::Literal(std::mem::take(&mut self.buffer)));
        }
    }

    fn scan_plain(mut self) -> Result<Vec<WordPart>, ShellError> {
        while let Some(ch) = self.read_char() {
            match ch {
                '\\' if self.peek_char() == Some('*') => {
                    self.read_char();
                    self.buffer.push('*');
                }
                '*' => {
                    self.flush_literal();
                    self.parts.push(WordPart::Wildcard);
                }
                '\'' => {
                    self.flush_literal();
                    let text = self.read_until('\'')?;
                    self.parts.push(WordPart::Quoted(text));
                }
                '"' => {
                    self.flush_literal();
                    self.scan_double_quoted()?;
                }
                '`' => {
                    self.flush_literal();
                    let command = self.read_until('`')?;
                    self.parts.push(WordPart::CmdSubst {
                        command,
                        quoted: false,
                    });
                }
                c => self.buffer.push(c),
            }
        }
        self.flush_literal();
        Ok(self.parts)
    }

    /// Consumes a double-quoted region; the opening `"` has been read.
    fn scan_double_quoted(&mut self) -> Result<(), ShellError> {
        let start = self.parts.len();
        let mut text = String::new();
        loop {
            match self.read_char() {
                None => return Err(ShellError::syntax(UNMATCHED_QUOTES)),
                Some('"') => break,
                Some('`') => {
                    if !text.is_empty() {
                        self.parts.push(WordPart::Quoted(std::mem::take(&mut text)));
                    }
                    let command = self.read_until('`')?;
                    self.parts.push(WordPart::CmdSubst {
                        command,
                        quoted: true,
                    });
                }
                Some(c) => text.push(c),
            }
        }
        // `""` still produces a word, so an empty region leaves an empty part behind.
        if !text.is_empty() || self.parts.len() == start {
            self.parts.push(WordPart::Quoted(text));
        }
        Ok(())
    }

    fn read_until(&mut self, close: char) -> Result<String, ShellError> {
        let mut text = String::new();
        loop {
            match self.read_char() {
                None => return Err(ShellError::syntax(UNMATCHED_QUOTES)),
                Some(c) if c == close => return Ok(text),
                Some(c) => text.push(c),
            }
        }
    }
}

/// Split one raw token into its quoted, unquoted and substituted parts.
///
/// Fails with a syntax error when a `'`, `"` or `` ` `` is left open.
pub fn scan_word(token: &str) -> Result<Vec<WordPart>, ShellError> {
    Scanner::new(token).scan_plain()
}
