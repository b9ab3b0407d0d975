//! Binary entry point for the `pykythe` CLI.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use pykythe_core::error::ExitCode as PykytheExitCode;
use pykythe_index::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    match pykythe_index::cli::run(&cli, &mut lock) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = lock.flush();
            eprintln!("pykythe: {err}");
            ExitCode::from(PykytheExitCode::from(&err).code())
        }
    }
}

/// `-v`/`-vv` raise the `tracing` level: warn by default, up to trace.
fn init_tracing(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
