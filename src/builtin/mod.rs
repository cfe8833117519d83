//! Built-in applications and the glue that registers them.
//!
//! Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
//! in-process. They report failures through `anyhow`; the registry boundary turns
//! those into [`ShellError::Application`] tagged with the application's name.

mod files;
mod filters;

pub(crate) use files::{Cat, Cd, Cp, Ls, Mv, Pwd, Rm};
pub(crate) use filters::{Cut, Grep, Head, Paste, Sed, Sort, Tail, Uniq, Wc};

use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::{Read, Write};

/// Built-in commands known to the shell at compile time.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using provided IO streams and environment.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<(), ShellError> {
        <T as BuiltinCommand>::execute(*self, stdin, stdout, env)
            .map_err(|err| application_error(T::name(), err))
    }
}

/// Recover a `ShellError` an application raised on purpose (`exit`), otherwise tag the
/// failure with the application's name.
fn application_error(app: &str, err: anyhow::Error) -> ShellError {
    match err.downcast::<ShellError>() {
        Ok(shell_err) => shell_err,
        Err(err) => ShellError::Application {
            app: app.to_string(),
            message: format!("{err:#}"),
        },
    }
}

/// Stands in for a builtin whose arguments did not parse (or asked for `--help`).
struct InvalidArgs {
    app: &'static str,
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<(), ShellError> {
        if self.is_error {
            return Err(ShellError::Application {
                app: self.app.to_string(),
                message: self.output.trim_end().to_string(),
            });
        }
        stdout.write_all(self.output.as_bytes())?;
        Ok(())
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    app: T::name(),
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// The `_name` form of an application: failures are printed instead of raised.
///
/// `exit` still propagates, since it is a signal rather than a failure.
pub(crate) struct UnsafeCommand {
    inner: Box<dyn ExecutableCommand>,
}

impl UnsafeCommand {
    pub(crate) fn new(inner: Box<dyn ExecutableCommand>) -> Self {
        Self { inner }
    }
}

impl ExecutableCommand for UnsafeCommand {
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<(), ShellError> {
        match self.inner.execute(stdin, stdout, env) {
            Err(err) if err.exit_code().is_none() => {
                writeln!(stdout, "{}", err)?;
                Ok(())
            }
            other => other,
        }
    }
}

/// The registry installed by [`crate::Interpreter::default`].
pub(crate) fn default_factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Echo>::default()),
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Ls>::default()),
        Box::new(Factory::<Cat>::default()),
        Box::new(Factory::<Cp>::default()),
        Box::new(Factory::<Mv>::default()),
        Box::new(Factory::<Rm>::default()),
        Box::new(Factory::<Head>::default()),
        Box::new(Factory::<Tail>::default()),
        Box::new(Factory::<Grep>::default()),
        Box::new(Factory::<Cut>::default()),
        Box::new(Factory::<Sed>::default()),
        Box::new(Factory::<Paste>::default()),
        Box::new(Factory::<Sort>::default()),
        Box::new(Factory::<Uniq>::default()),
        Box::new(Factory::<Wc>::default()),
    ]
}

/// Read a whole input source: the named file, or stdin when there is none.
pub(crate) fn read_source(
    file: Option<&str>,
    stdin: &mut dyn Read,
    env: &Environment,
) -> Result<String> {
    let mut text = String::new();
    match file {
        Some(name) => {
            let path = env.resolve_path(name);
            if path.is_dir() {
                anyhow::bail!("{}: Is a directory", name);
            }
            let mut f = fs::File::open(&path).with_context(|| name.to_string())?;
            f.read_to_string(&mut text)
                .with_context(|| name.to_string())?;
        }
        None => {
            stdin
                .read_to_string(&mut text)
                .context("cannot read standard input")?;
        }
    }
    Ok(text)
}

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces.
/// By default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<()> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional)]
    /// exit status, 0 when omitted.
    pub code: Option<ExitCode>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<()> {
        Err(ShellError::Exit(self.code.unwrap_or(0)).into())
    }
}
