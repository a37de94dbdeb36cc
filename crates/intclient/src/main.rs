//! CLI entrypoint for the integration client.
//!
//! The binary delegates to [`intclient::run`], which parses the positional
//! arguments, loads configuration, and submits each job line to the server.

use std::io::{self, Stderr, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    // Left unlocked: partition threads log to standard error while the main
    // thread waits on them.
    let mut stderr: Stderr = io::stderr();
    intclient::run(std::env::args_os(), io::stdin().lock(), &mut stdout, &mut stderr)
}
