//! Positional command-line surface for `intclient`.

use std::path::PathBuf;

use clap::Parser;

/// Submits integration jobs to an `intserver`.
#[derive(Parser, Debug)]
#[command(name = "intclient", version)]
pub(crate) struct Cli {
    /// Prints per-partition progress before each result.
    #[arg(short = 'v')]
    pub(crate) verbose: bool,
    /// Server port on localhost; 0 selects the default.
    #[arg(value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// Job file; standard input when omitted.
    #[arg(value_name = "JOBFILE", requires = "port")]
    pub(crate) jobfile: Option<PathBuf>,
}
