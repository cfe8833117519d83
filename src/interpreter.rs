use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::expand::{self, Substitute};
use crate::io_adapters::MemWriter;
use crate::parser::{self, AstNode, Call, Pipeline, Sequence};
use crate::{builtin, redirect};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate, see `BuiltinCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Anything that can run against a pair of streams: a call, a pipeline, a sequence.
pub trait Executable {
    fn evaluate(
        &self,
        shell: &mut Interpreter,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<(), ShellError>;

    /// Invoked instead of `evaluate` when an earlier pipeline stage failed.
    fn terminate(&self) {}
}

/// A minimal shell that interprets command lines against a registry of applications.
///
/// The interpreter owns an [`Environment`] and a list of [`CommandFactory`] objects
/// queried in order to create applications by name. See [`Default`] for the built-in
/// applications included out of the box.
///
/// Example
/// ```
/// use tinysh::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// sh.evaluate_with_input("echo hello | cut -c 1-3", &mut std::io::empty(), &mut out).unwrap();
/// assert_eq!(out, b"hel\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self::with_environment(Environment::new(), commands)
    }

    pub fn with_environment(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Interpret one command line, reading the process's stdin and writing to `stdout`.
    pub fn evaluate(&mut self, line: &str, stdout: &mut dyn Write) -> Result<(), ShellError> {
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        self.evaluate_with_input(line, &mut lock, stdout)
    }

    /// Interpret one command line against explicit streams.
    pub fn evaluate_with_input(
        &mut self,
        line: &str,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<(), ShellError> {
        let sequence = parser::parse_line(line)?;
        sequence.evaluate(self, stdin, stdout)?;
        stdout.flush()?;
        Ok(())
    }

    /// Run a single application invocation by name with already resolved arguments.
    ///
    /// A leading `_` selects the unsafe form, which prints failures instead of
    /// raising them.
    pub fn run(
        &mut self,
        name: &str,
        args: &[String],
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<(), ShellError> {
        let cmd = self
            .create(name, args)
            .ok_or_else(|| ShellError::UnknownApplication(name.to_string()))?;
        log::debug!("running {} {:?}", name, args);
        cmd.execute(stdin, stdout, &mut self.env)
    }

    fn create(&self, name: &str, args: &[String]) -> Option<Box<dyn ExecutableCommand>> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let lookup = |name: &str| {
            self.commands
                .iter()
                .find_map(|factory| factory.try_create(&self.env, name, &args))
        };
        match lookup(name) {
            Some(cmd) => Some(cmd),
            None => {
                let base = name.strip_prefix('_').filter(|base| !base.is_empty())?;
                let inner = lookup(base)?;
                Some(Box::new(builtin::UnsafeCommand::new(inner)))
            }
        }
    }

    /// Read-eval-print loop over an interactive line editor.
    ///
    /// Returns the code passed to `exit`, or 0 when input ends.
    pub fn repl(&mut self, history: Option<&Path>) -> rustyline::Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;
        if let Some(path) = history {
            if let Err(e) = rl.load_history(path) {
                log::warn!("failed to load history from {}: {}", path.display(), e);
            }
        }

        let code = loop {
            let prompt = format!("{}> ", self.env.current_dir.display());
            match rl.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        log::warn!("failed to add history entry: {}", e);
                    }
                    let mut stdout = io::stdout();
                    match self.evaluate(&line, &mut stdout) {
                        Ok(()) => {}
                        Err(ShellError::Exit(code)) => break code,
                        Err(err) => eprintln!("{}", err),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break 0,
                Err(err) => return Err(err),
            }
        };

        if let Some(path) = history {
            if let Err(e) = rl.save_history(path) {
                log::warn!("failed to save history to {}: {}", path.display(), e);
            }
        }
        Ok(code)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of applications:
    /// `pwd`, `cd`, `echo`, `exit`, `ls`, `cat`, `cp`, `mv`, `rm`, `head`, `tail`,
    /// `grep`, `cut`, `sed`, `paste`, `sort`, `uniq` and `wc`.
    fn default() -> Self {
        Self::new(builtin::default_factories())
    }
}

impl Substitute for Interpreter {
    fn substitute(&mut self, command: &str) -> Result<String, ShellError> {
        let sequence = parser::parse_line(command)?;
        let mut output = MemWriter::new();
        sequence.evaluate(self, &mut io::empty(), &mut output)?;
        let mut text = String::from_utf8_lossy(&output.into_bytes()).into_owned();
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    fn current_dir(&self) -> &Path {
        &self.env.current_dir
    }
}

impl Executable for Call {
    fn evaluate(
        &self,
        shell: &mut Interpreter,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<(), ShellError> {
        let redirected = redirect::extract(&self.tokens, stdin, stdout, shell)?;
        let mut words = expand::resolve_all(&redirected.tokens, shell)?;
        if words.is_empty() {
            return Err(ShellError::syntax("empty command"));
        }
        let name = words.remove(0);

        let mut input = redirected.stdin;
        let mut output = redirected.stdout;
        shell.run(&name, &words, &mut input, &mut output)?;
        output.finish()?;
        Ok(())
    }

    fn terminate(&self) {
        log::debug!("skipping {:?}", self.tokens.first());
    }
}

impl Executable for Pipeline {
    fn evaluate(
        &self,
        shell: &mut Interpreter,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<(), ShellError> {
        let Some((last, init)) = self.calls.split_last() else {
            return Err(ShellError::syntax("empty pipeline"));
        };

        let mut previous: Option<MemWriter> = None;
        for (i, call) in init.iter().enumerate() {
            let mut buffer = MemWriter::new();
            let result = match previous.take() {
                Some(prev) => call.evaluate(shell, &mut prev.into_reader(), &mut buffer),
                None => call.evaluate(shell, stdin, &mut buffer),
            };
            if let Err(err) = result {
                self.calls[i + 1..].iter().for_each(|c| c.terminate());
                return Err(err);
            }
            previous = Some(buffer);
        }

        match previous {
            Some(prev) => last.evaluate(shell, &mut prev.into_reader(), stdout),
            None => last.evaluate(shell, stdin, stdout),
        }
    }
}

impl Executable for AstNode {
    fn evaluate(
        &self,
        shell: &mut Interpreter,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<(), ShellError> {
        match self {
            AstNode::Call(call) => call.evaluate(shell, stdin, stdout),
            AstNode::Pipeline(pipeline) => pipeline.evaluate(shell, stdin, stdout),
        }
    }

    fn terminate(&self) {
        match self {
            AstNode::Call(call) => call.terminate(),
            AstNode::Pipeline(pipeline) => pipeline.calls.iter().for_each(|c| c.terminate()),
        }
    }
}

impl Executable for Sequence {
    /// Runs every statement; a failing statement prints its error as one
    /// `<origin>: <message>` line and the next one still runs. `exit` stops the
    /// whole sequence.
    fn evaluate(
        &self,
        shell: &mut Interpreter,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> Result<(), ShellError> {
        for statement in &self.statements {
            match statement.evaluate(shell, stdin, stdout) {
                Ok(()) => {}
                Err(err @ ShellError::Exit(_)) => return Err(err),
                Err(err) if self.statements.len() == 1 => return Err(err),
                Err(err) => {
                    log::debug!("statement failed: {}", err);
                    writeln!(stdout, "{}", err)?;
                }
            }
        }
        Ok(())
    }
}

/// Path of a history file in the user's home, if there is one.
pub fn default_history_path(env: &Environment) -> Option<PathBuf> {
    env.get_var("HOME")
        .map(|home| PathBuf::from(home).join(".tinysh_history"))
}
