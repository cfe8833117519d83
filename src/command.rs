use crate::env::Environment;
use crate::error::ShellError;
use std::io::{Read, Write};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// It is carried by [`ShellError::Exit`] when the `exit` application runs.
pub type ExitCode = i32;

/// Object-safe trait for an application instance ready to run.
///
/// Built-ins get this through a blanket impl over `BuiltinCommand`; wrappers such as
/// the unsafe `_name` variants implement it directly.
pub trait ExecutableCommand {
    /// Runs the application to completion against the given streams.
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<(), ShellError>;
}

/// One entry of the application registry.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
