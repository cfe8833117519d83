use super::BuiltinCommand;
use crate::env::Environment;
use anyhow::{Context, Result};
use argh::FromArgs;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => anyhow::bail!("no target and HOME not set"),
            },
        };

        let new_dir = env.resolve_path(&target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("{}", target.display()))?;
        if !canonical.is_dir() {
            anyhow::bail!("{}: Not a directory", target.display());
        }

        log::debug!("cd {}", canonical.display());
        env.current_dir = canonical;
        Ok(())
    }
}

#[derive(FromArgs)]
/// List the visible entries of a directory, one per line, sorted by name.
pub struct Ls {
    #[argh(positional)]
    /// directory to list; the current directory when omitted.
    pub dir: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let shown = self.dir.as_deref().unwrap_or(".");
        let path = env.resolve_path(shown);
        if path.is_file() {
            writeln!(stdout, "{}", shown)?;
            return Ok(());
        }
        let mut names = fs::read_dir(&path)
            .with_context(|| format!("cannot access '{}'", shown))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect::<Vec<_>>();
        names.sort();
        for name in names {
            writeln!(stdout, "{}", name)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Concatenate files (or standard input) to standard output.
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print in order; standard input when none are given.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        if self.files.is_empty() {
            io::copy(stdin, stdout)?;
            return Ok(());
        }
        for fname in &self.files {
            let path = env.resolve_path(fname);
            if path.is_dir() {
                anyhow::bail!("{}: Is a directory", fname);
            }
            let mut f = fs::File::open(&path).with_context(|| fname.clone())?;
            io::copy(&mut f, stdout)?;
        }
        Ok(())
    }
}

/// Pair every `SOURCE` operand with the path it lands on under `DEST`.
///
/// A destination that is an existing directory receives each source under its own
/// name; otherwise there must be exactly one source.
fn plan_transfer<'a>(
    paths: &'a [String],
    env: &Environment,
) -> Result<Vec<(&'a str, PathBuf, PathBuf)>> {
    let Some((dest, sources)) = paths.split_last() else {
        anyhow::bail!("missing file operand");
    };
    if sources.is_empty() {
        anyhow::bail!("missing destination file operand after '{}'", dest);
    }
    let dest_path = env.resolve_path(dest);
    let into_dir = dest_path.is_dir();
    if !into_dir && sources.len() > 1 {
        anyhow::bail!("target '{}' is not a directory", dest);
    }

    sources
        .iter()
        .map(|src| {
            let from = env.resolve_path(src);
            let to = if into_dir {
                match from.file_name() {
                    Some(name) => dest_path.join(name),
                    None => anyhow::bail!("cannot use '{}' as a source", src),
                }
            } else {
                dest_path.clone()
            };
            Ok((src.as_str(), from, to))
        })
        .collect()
}

/// `path` with its parent canonicalized; the last component need not exist yet.
fn absolute(path: &Path) -> io::Result<PathBuf> {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => Ok(fs::canonicalize(parent)?.join(name)),
        _ => fs::canonicalize(path),
    }
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[derive(FromArgs)]
/// Copy files, or whole directories with -r.
pub struct Cp {
    #[argh(switch, short = 'r')]
    /// copy directories recursively.
    pub recursive: bool,

    #[argh(positional)]
    /// one or more sources followed by the destination.
    pub paths: Vec<String>,
}

impl BuiltinCommand for Cp {
    fn name() -> &'static str {
        "cp"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        for (name, from, to) in plan_transfer(&self.paths, env)? {
            let meta = fs::metadata(&from).with_context(|| format!("cannot stat '{}'", name))?;
            let inside = absolute(&to)?.starts_with(fs::canonicalize(&from)?);
            if meta.is_dir() {
                if !self.recursive {
                    anyhow::bail!("-r not specified; omitting directory '{}'", name);
                }
                if inside {
                    anyhow::bail!("cannot copy a directory, '{}', into itself", name);
                }
                copy_tree(&from, &to).with_context(|| format!("cannot copy '{}'", name))?;
            } else {
                if inside {
                    anyhow::bail!("'{}' and its destination are the same file", name);
                }
                fs::copy(&from, &to).with_context(|| format!("cannot copy '{}'", name))?;
            }
            log::debug!("cp {} -> {}", from.display(), to.display());
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Move or rename files and directories.
pub struct Mv {
    #[argh(positional)]
    /// one or more sources followed by the destination.
    pub paths: Vec<String>,
}

impl BuiltinCommand for Mv {
    fn name() -> &'static str {
        "mv"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        for (name, from, to) in plan_transfer(&self.paths, env)? {
            fs::symlink_metadata(&from).with_context(|| format!("cannot stat '{}'", name))?;
            fs::rename(&from, &to).with_context(|| format!("cannot move '{}'", name))?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Remove files, or directories with -r.
pub struct Rm {
    #[argh(switch, short = 'r')]
    /// remove directories and their contents.
    pub recursive: bool,

    #[argh(switch, short = 'f')]
    /// ignore missing files.
    pub force: bool,

    #[argh(positional)]
    /// paths to remove.
    pub paths: Vec<String>,
}

impl BuiltinCommand for Rm {
    fn name() -> &'static str {
        "rm"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        if self.paths.is_empty() && !self.force {
            anyhow::bail!("missing operand");
        }
        for name in &self.paths {
            if matches!(
                Path::new(name).components().next_back(),
                Some(Component::CurDir | Component::ParentDir)
            ) {
                anyhow::bail!("refusing to remove '.' or '..' directory: skipping '{}'", name);
            }
            let path = env.resolve_path(name);
            let meta = match fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(e) if self.force && e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("cannot remove '{}'", name));
                }
            };
            let removed = if meta.is_dir() {
                if !self.recursive {
                    anyhow::bail!("cannot remove '{}': Is a directory", name);
                }
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.with_context(|| format!("cannot remove '{}'", name))?;
        }
        Ok(())
    }
}
