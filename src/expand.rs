//! Token resolution: quote removal, command substitution, word splitting and globbing.
//!
//! Scanning is pure (see [`crate::lexer::scan_word`]). Expansion needs a way to run
//! back-quoted commands and to know the current directory; both come from a
//! [`Substitute`] implementation, which is the interpreter in production and a fake
//! in the tests below.

use crate::error::ShellError;
use crate::glob::{self, GlobChar};
use crate::lexer::{self, WordPart};
use std::path::Path;

/// What the resolver needs from its surroundings.
pub trait Substitute {
    /// Evaluate `command` as an independent command line against empty stdin and
    /// return its captured stdout with one trailing newline removed.
    fn substitute(&mut self, command: &str) -> Result<String, ShellError>;

    /// Directory relative glob patterns are matched in.
    fn current_dir(&self) -> &Path;
}

/// A word under construction.
///
/// `present` follows the shell rule that a word exists as soon as it contains literal
/// text or any quoted part, even an empty one.
#[derive(Debug, Default)]
struct Field {
    chars: Vec<GlobChar>,
    present: bool,
}

impl Field {
    fn push_str(&mut self, s: &str) {
        self.chars.extend(s.chars().map(GlobChar::Char));
        self.present = true;
    }

    fn has_wildcard(&self) -> bool {
        self.chars.contains(&GlobChar::Star)
    }
}

#[derive(Debug, Default)]
struct Fields {
    done: Vec<Field>,
    current: Field,
}

impl Fields {
    /// End the current word, if there is one.
    fn split(&mut self) {
        let field = std::mem::take(&mut self.current);
        if field.present {
            self.done.push(field);
        }
    }

    /// Append unquoted substitution output, splitting on runs of whitespace.
    ///
    /// The first and last words join the text on either side unless the output
    /// starts or ends with whitespace.
    fn push_unquoted(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text.starts_with(char::is_whitespace) {
            self.split();
        }
        let mut words = text.split_whitespace().peekable();
        while let Some(word) = words.next() {
            self.current.push_str(word);
            if words.peek().is_some() {
                self.split();
            }
        }
        if text.ends_with(char::is_whitespace) {
            self.split();
        }
    }

    fn finish(mut self) -> Vec<Field> {
        self.split();
        self.done
    }
}

/// Resolve one raw token into the words it stands for.
///
/// Returns no words for an unquoted substitution with empty output, several words
/// when unquoted substitution output contains whitespace or a glob matches several
/// entries, and exactly the token itself when it holds no quoting or wildcards.
pub fn resolve<S: Substitute + ?Sized>(token: &str, shell: &mut S) -> Result<Vec<String>, ShellError> {
    let parts = lexer::scan_word(token)?;
    let mut fields = Fields::default();

    for part in parts {
        match part {
            WordPart::Literal(text) | WordPart::Quoted(text) => fields.current.push_str(&text),
            WordPart::Wildcard => {
                fields.current.chars.push(GlobChar::Star);
                fields.current.present = true;
            }
            WordPart::CmdSubst { command, quoted } => {
                let output = substitute(shell, &command)?;
                if quoted {
                    fields.current.push_str(&output);
                } else {
                    fields.push_unquoted(&output);
                }
            }
        }
    }

    let mut words = Vec::new();
    for field in fields.finish() {
        if field.has_wildcard() {
            words.extend(glob::expand(&field.chars, shell.current_dir()));
        } else {
            words.push(glob::pattern_text(&field.chars));
        }
    }
    Ok(words)
}

/// Resolve every token of a call, in order, into one flat word list.
pub fn resolve_all<S: Substitute + ?Sized>(
    tokens: &[String],
    shell: &mut S,
) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::new();
    for token in tokens {
        words.extend(resolve(token, shell)?);
    }
    Ok(words)
}

fn substitute<S: Substitute + ?Sized>(shell: &mut S, command: &str) -> Result<String, ShellError> {
    if command.trim().is_empty() {
        return Ok(String::new());
    }
    log::trace!("substituting `{}`", command);
    shell.substitute(command)
}
