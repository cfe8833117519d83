use argh::FromArgs;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tinysh::{Interpreter, ShellError, default_history_path};

#[derive(FromArgs)]
/// A tiny interactive shell.
struct Options {
    #[argh(option, short = 'c')]
    /// run a single command line and exit.
    command: Option<String>,

    #[argh(option, default = "LevelFilter::Warn")]
    /// log level written to stderr: off, error, warn, info, debug or trace.
    log_level: LevelFilter,

    #[argh(option)]
    /// history file for the interactive prompt; defaults to ~/.tinysh_history.
    history: Option<PathBuf>,
}

fn main() -> ExitCode {
    let options: Options = argh::from_env();

    if let Err(e) = TermLogger::init(
        options.log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("cannot initialise logging: {}", e);
    }

    let mut shell = Interpreter::default();

    let code = match options.command {
        Some(line) => match shell.evaluate(&line, &mut io::stdout()) {
            Ok(()) => 0,
            Err(ShellError::Exit(code)) => code,
            Err(err) => {
                eprintln!("{}", err);
                1
            }
        },
        None => {
            let history = options
                .history
                .or_else(|| default_history_path(shell.env()));
            log::info!("starting interactive shell");
            match shell.repl(history.as_deref()) {
                Ok(code) => code,
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    1
                }
            }
        }
    };

    ExitCode::from(code.rem_euclid(256) as u8)
}
