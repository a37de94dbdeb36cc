//! Integration server runtime.
//!
//! `intserver [port [maxThreads]]` listens on TCP (default port 5142),
//! writes the bound port to standard error, and serves one
//! validate/integrate request per connection until it receives a
//! termination signal. Each connection runs on its own worker thread;
//! `maxThreads` bounds how many run at once.
//!
//! The launch sequence mirrors the client: leading configuration flags are
//! resolved through [`intcalc_config::Config`], positional arguments
//! override them, and telemetry is installed before the socket is bound.
//! Lifecycle events flow through a [`HealthReporter`].

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use intcalc_config::split_arguments;
use tracing::debug;

mod bootstrap;
mod cli;
mod dispatch;
mod health;
mod process;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Overrides, Server, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_server};

use cli::Cli;

const PROGRAM: &str = "intserver";
const RUN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Runs the server with the provided arguments and IO handles.
///
/// Returns once a termination signal has been handled, or immediately on a
/// usage or startup error.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_arguments(&args);

    let cli = match Cli::try_parse_from(&split.cli_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return match write!(stdout, "{error}") {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(error) => {
            if write!(stderr, "{error}").is_err() {
                debug!(target: RUN_TARGET, "standard error is closed");
            }
            return ExitCode::FAILURE;
        }
    };

    match run_server(&split.config_arguments, cli.overrides(), stderr) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(stderr, "{PROGRAM}: {error}").is_err() {
                debug!(target: RUN_TARGET, "standard error is closed");
            }
            error.exit_code()
        }
    }
}

#[cfg(test)]
mod tests;
