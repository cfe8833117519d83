use crate::command::ExitCode;
use std::io;
use thiserror::Error;

/// Every way evaluating a command line can stop early.
///
/// Errors are typed by origin: the parser and resolver produce [`ShellError::Syntax`],
/// applications produce [`ShellError::Application`], and `exit` produces
/// [`ShellError::Exit`], which is a control signal rather than a failure and must be
/// re-raised by every unit that sees it. Every failure renders as
/// `<origin>: <message>`, the origin being the application at fault or `tinysh` for
/// the shell itself.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Malformed quoting, stray operators, missing or ambiguous redirection targets.
    #[error("tinysh: syntax error: {0}")]
    Syntax(String),

    /// A built-in application failed for its own reasons.
    #[error("{app}: {message}")]
    Application { app: String, message: String },

    /// No application is registered under this name.
    #[error("{0}: invalid application")]
    UnknownApplication(String),

    /// A redirection target of `app` could not be opened.
    #[error("{app}: {path}: {source}")]
    Redirection {
        app: String,
        path: String,
        #[source]
        source: io::Error,
    },

    /// Reading or writing one of the core's own streams failed.
    #[error("tinysh: {0}")]
    Io(#[from] io::Error),

    /// `exit` was called with this code.
    #[error("exit {0}")]
    Exit(ExitCode),
}

impl ShellError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        ShellError::Syntax(message.into())
    }

    /// The exit code carried by an `exit` signal, if this is one.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self {
            ShellError::Exit(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ShellError::Syntax(_))
    }

    /// True for a redirection whose file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ShellError::Redirection { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_by_origin() {
        let app = ShellError::Application {
            app: "cat".to_string(),
            message: "missing.txt: not found".to_string(),
        };
        assert_eq!(app.to_string(), "cat: missing.txt: not found");
        assert_eq!(
            ShellError::UnknownApplication("frob".to_string()).to_string(),
            "frob: invalid application"
        );
        assert_eq!(
            ShellError::syntax("Unmatched quotes").to_string(),
            "tinysh: syntax error: Unmatched quotes"
        );
        let redirect = ShellError::Redirection {
            app: "cat".to_string(),
            path: "nofile.txt".to_string(),
            source: io::Error::other("gone"),
        };
        assert_eq!(redirect.to_string(), "cat: nofile.txt: gone");
        let io_err = ShellError::from(io::Error::other("broken pipe"));
        assert_eq!(io_err.to_string(), "tinysh: broken pipe");
    }

    #[test]
    fn test_exit_code_only_for_exit() {
        assert_eq!(ShellError::Exit(3).exit_code(), Some(3));
        assert_eq!(ShellError::syntax("x").exit_code(), None);
    }

    #[test]
    fn test_not_found_classification() {
        let err = ShellError::Redirection {
            app: "cat".to_string(),
            path: "nofile.txt".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.is_not_found());
        assert!(!ShellError::syntax("x").is_not_found());
    }
}
