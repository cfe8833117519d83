//! A tiny interactive shell built around a small command-line interpretation core.
//!
//! A line goes through three stages. The [`parser`] splits it into a [`Sequence`] of
//! pipelines of calls, honouring quotes. When a call runs, its `<` / `>` redirections
//! are extracted, its tokens are resolved (quote removal, back-quote command
//! substitution, word splitting, `*` globbing) and the first word selects a built-in
//! application. Pipelines buffer each stage in memory; sequences report a failing
//! statement and carry on.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`] and [`env`]
//! expose the traits and types for implementing your own applications.

mod builtin;
pub mod command;
pub mod env;
mod error;
pub mod expand;
pub mod glob;
mod interpreter;
mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod redirect;

pub use error::ShellError;
pub use interpreter::{Executable, Interpreter, default_history_path};
pub use io_adapters::{InputStream, MemReader, MemWriter, OutputStream};
pub use parser::{AstNode, Call, Pipeline, Sequence, parse_line};
