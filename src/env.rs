use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// The shell's view of the process state, threaded explicitly through every call.
///
/// The environment contains:
/// - `vars`: a snapshot of the process variables taken at startup (`cd` reads `HOME`).
/// - `current_dir`: the directory relative paths and glob patterns resolve against.
///
/// Only the `cd` application writes `current_dir`. The process-wide working directory
/// is never changed, so several interpreters can coexist in one process.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of variables (e.g., HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory of the shell.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// An environment with no variables rooted at `dir`.
    pub fn with_current_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: dir.into(),
        }
    }

    /// Get the value of a variable from the snapshot.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override a variable in the snapshot.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve `path` against the current directory unless it is already absolute.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::path::PathBuf;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::with_current_dir("/tmp");

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_resolve_path_relative_and_absolute() {
        let env = Environment::with_current_dir("/work/dir");
        assert_eq!(env.resolve_path("a.txt"), PathBuf::from("/work/dir/a.txt"));
        assert_eq!(env.resolve_path("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }
}
