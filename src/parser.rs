use crate::error::ShellError;
use crate::lexer::QuoteTracker;

/// A single application invocation: the command name and its arguments as raw tokens.
///
/// Tokens stay unresolved until the call is evaluated, so substitutions run at the
/// moment the call runs and see the effects of earlier statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub tokens: Vec<String>,
}

/// Two or more calls connected by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub calls: Vec<Call>,
}

/// One `;`-separated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Call(Call),
    Pipeline(Pipeline),
}

/// The root produced for every input line: statements separated by `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub statements: Vec<AstNode>,
}

#[derive(Debug, Default)]
struct LineParser {
    quotes: QuoteTracker,
    token: String,
    call: Vec<String>,
    pipeline: Vec<Call>,
    statements: Vec<AstNode>,
    /// Set once a `;` has been seen, so a trailing one can be told from a stray one.
    after_semicolon: bool,
}

impl LineParser {
    fn end_token(&mut self) {
        if !self.token.is_empty() {
            self.call.push(std::mem::take(&mut self.token));
        }
    }

    fn end_call(&mut self) -> Result<(), ShellError> {
        self.end_token();
        if self.call.is_empty() {
            return Err(ShellError::syntax("missing command near `|`"));
        }
        let tokens = std::mem::take(&mut self.call);
        self.pipeline.push(Call { tokens });
        Ok(())
    }

    fn end_statement(&mut self) -> Result<(), ShellError> {
        self.end_token();
        if self.call.is_empty() && self.pipeline.is_empty() {
            return Err(ShellError::syntax("unexpected `;`"));
        }
        self.end_call()?;
        let mut calls = std::mem::take(&mut self.pipeline);
        let node = if calls.len() == 1 {
            AstNode::Call(calls.remove(0))
        } else {
            AstNode::Pipeline(Pipeline { calls })
        };
        self.statements.push(node);
        Ok(())
    }

    fn feed(&mut self, ch: char) -> Result<(), ShellError> {
        if !self.quotes.is_plain() {
            self.quotes.advance(ch);
            self.token.push(ch);
            return Ok(());
        }
        match ch {
            c if c.is_whitespace() => self.end_token(),
            ';' => {
                self.end_statement()?;
                self.after_semicolon = true;
            }
            '|' => self.end_call()?,
            '<' | '>' => {
                self.end_token();
                self.call.push(ch.to_string());
            }
            c => {
                self.quotes.advance(c);
                self.token.push(c);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Sequence, ShellError> {
        self.quotes.finish()?;
        self.end_token();
        if !self.call.is_empty() || !self.pipeline.is_empty() {
            self.end_statement()?;
        } else if !self.after_semicolon {
            return Err(ShellError::syntax("empty command"));
        }
        Ok(Sequence {
            statements: self.statements,
        })
    }
}

/// Split a raw command line into a [`Sequence`] of pipelines of calls.
///
/// `;`, `|`, `<`, `>` and whitespace are operators only outside quotes and
/// back-quotes. Fails with a syntax error on a blank line, a stray or leading
/// operator, an empty pipeline stage or an unclosed quote. A single trailing `;` is
/// allowed.
pub fn parse_line(line: &str) -> Result<Sequence, ShellError> {
    let mut parser = LineParser::default();
    for ch in line.chars() {
        parser.feed(ch)?;
    }
    let sequence = parser.finish()?;
    log::debug!("parsed {:?} into {} statement(s)", line, sequence.statements.len());
    Ok(sequence)
}
