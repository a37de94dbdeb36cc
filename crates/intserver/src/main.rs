//! Server entrypoint.
//!
//! The binary delegates to [`intserver::run`], which loads configuration,
//! binds the listening socket and serves requests until a termination
//! signal arrives.

use std::io::{self, Stderr, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    // Left unlocked: connection threads log to standard error.
    let mut stderr: Stderr = io::stderr();
    intserver::run(std::env::args_os(), &mut stdout, &mut stderr)
}
