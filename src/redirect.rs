use crate::error::ShellError;
use crate::expand::{self, Substitute};
use crate::io_adapters::{InputStream, OutputStream};
use crate::lexer::{self, WordPart};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

/// A call's tokens with redirections removed, and the streams it should use.
pub struct Redirected<'a> {
    /// Remaining raw tokens, in their original order.
    pub tokens: Vec<String>,
    pub stdin: InputStream<'a>,
    pub stdout: OutputStream<'a>,
}

fn is_operator(token: &str) -> bool {
    token == "<" || token == ">"
}

/// Pull `< file` and `> file` out of a call's raw tokens.
///
/// All operators are checked before any target is resolved or opened, so a
/// malformed call never creates or truncates a file. Targets must resolve to
/// exactly one word. The input file is opened before the output file is created.
pub fn extract<'a, S: Substitute + ?Sized>(
    tokens: &[String],
    stdin: &'a mut dyn Read,
    stdout: &'a mut dyn Write,
    shell: &mut S,
) -> Result<Redirected<'a>, ShellError> {
    let mut remaining = Vec::with_capacity(tokens.len());
    let mut input: Option<&str> = None;
    let mut output: Option<&str> = None;

    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if !is_operator(token) {
            remaining.push(token.clone());
            continue;
        }
        let target = match iter.next() {
            Some(t) if !is_operator(t) => t.as_str(),
            _ => {
                return Err(ShellError::syntax(format!(
                    "missing redirection target after `{}`",
                    token
                )));
            }
        };
        let (slot, kind) = if token == "<" {
            (&mut input, "input")
        } else {
            (&mut output, "output")
        };
        if slot.replace(target).is_some() {
            return Err(ShellError::syntax(format!("multiple {} streams", kind)));
        }
    }

    let app = application_name(&remaining);
    let input_path = input.map(|t| resolve_target(t, shell)).transpose()?;
    let output_path = output.map(|t| resolve_target(t, shell)).transpose()?;

    let stdin = match input_path {
        Some(path) => {
            log::debug!("redirecting stdin from {}", path);
            let file = File::open(shell.current_dir().join(&path)).map_err(|source| {
                ShellError::Redirection {
                    app: app.clone(),
                    path,
                    source,
                }
            })?;
            InputStream::File(BufReader::new(file))
        }
        None => InputStream::Inherited(stdin),
    };
    let stdout = match output_path {
        Some(path) => {
            log::debug!("redirecting stdout to {}", path);
            let file = File::create(shell.current_dir().join(&path)).map_err(|source| {
                ShellError::Redirection {
                    app: app.clone(),
                    path,
                    source,
                }
            })?;
            OutputStream::File(BufWriter::new(file))
        }
        None => OutputStream::Inherited(stdout),
    };

    Ok(Redirected {
        tokens: remaining,
        stdin,
        stdout,
    })
}

fn resolve_target<S: Substitute + ?Sized>(token: &str, shell: &mut S) -> Result<String, ShellError> {
    let mut words = expand::resolve(token, shell)?;
    if words.len() != 1 || words[0].is_empty() {
        return Err(ShellError::syntax(format!("{}: ambiguous redirect", token)));
    }
    Ok(words.remove(0))
}

/// Name a redirection error is reported under: the call's first word when it can be
/// read without running anything, otherwise the shell itself.
fn application_name(tokens: &[String]) -> String {
    let parts = tokens
        .first()
        .and_then(|token| lexer::scan_word(token).ok())
        .unwrap_or_default();
    let mut name = String::new();
    for part in &parts {
        match part {
            WordPart::Literal(text) | WordPart::Quoted(text) => name.push_str(text),
            WordPart::Wildcard | WordPart::CmdSubst { .. } => return "tinysh".to_string(),
        }
    }
    if name.is_empty() {
        "tinysh".to_string()
    } else {
        name
    }
}
