//! Integration client runtime.
//!
//! `intclient [-v] [port [jobfile]]` reads job lines from a file or standard
//! input, rejects malformed lines locally with a line-numbered diagnostic,
//! and submits each valid job to the server: first a validate request, then
//! an integrate request. The integral is printed on standard output.
//!
//! Per-line problems never stop the run. Failing to open the job file,
//! reach the server, or complete an exchange ends it with a distinct exit
//! status.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use intcalc_config::split_arguments;
use tracing::debug;

mod cli;
mod config;
mod errors;
pub mod jobfile;
pub mod jobline;
mod output;
pub mod session;
mod transport;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader};
use errors::AppError;
pub use errors::CommunicationError;
use jobfile::JobLines;
use jobline::{JoblineError, parse_job_line};
use session::{ClientSession, JobOutcome, Transport};
pub use transport::TcpTransport;

const PROGRAM: &str = "intclient";
const RUN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Bundles the IO streams provided to the client runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }

    /// Writes a `intclient: ` prefixed diagnostic to standard error.
    fn diagnose(&mut self, message: impl std::fmt::Display) {
        if writeln!(self.stderr, "{PROGRAM}: {message}").is_err() {
            debug!(target: RUN_TARGET, "standard error is closed");
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    /// Job lines that passed local validation and were submitted.
    pub(crate) submitted: usize,
    /// Job lines rejected locally or by the server.
    pub(crate) rejected: usize,
}

/// Runs the client with the provided arguments, job input and IO handles.
///
/// `stdin` is only read when no job file is named.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, stdin, &mut io, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    stdin: R,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_arguments(&args);

    let cli = match Cli::try_parse_from(&split.cli_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return match write!(io.stdout, "{error}") {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(error) => return report(io, &AppError::CliUsage(error)),
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| {
            let config = match cli.port {
                Some(port) => config.with_port(port),
                None => config,
            };
            intcalc_config::telemetry::initialise(&config)?;
            Ok(config)
        })
        .and_then(|config| {
            let mut transport = TcpTransport::new(config.port());
            match cli.jobfile.as_ref() {
                Some(path) => {
                    let file = File::open(path).map_err(|source| AppError::OpenJobFile {
                        path: path.clone(),
                        source,
                    })?;
                    process_jobs(BufReader::new(file), &mut transport, cli.verbose, io)
                }
                None => process_jobs(stdin, &mut transport, cli.verbose, io),
            }
        });

    match result {
        Ok(summary) => {
            debug!(
                target: RUN_TARGET,
                submitted = summary.submitted,
                rejected = summary.rejected,
                "job source exhausted"
            );
            ExitCode::SUCCESS
        }
        Err(error) => report(io, &error),
    }
}

fn report<W: Write, E: Write>(io: &mut IoStreams<'_, W, E>, error: &AppError) -> ExitCode {
    if let AppError::CliUsage(usage) = error {
        if write!(io.stderr, "{usage}").is_err() {
            debug!(target: RUN_TARGET, "standard error is closed");
        }
    } else {
        io.diagnose(error);
    }
    error.exit_code()
}

/// Processes every job line from `source`, in order.
pub(crate) fn process_jobs<R, T, W, E>(
    source: R,
    transport: &mut T,
    verbose: bool,
    io: &mut IoStreams<'_, W, E>,
) -> Result<RunSummary, AppError>
where
    R: BufRead,
    T: Transport,
    W: Write,
    E: Write,
{
    let mut summary = RunSummary::default();
    for line in JobLines::new(source) {
        let line = line.map_err(AppError::ReadJobFile)?;
        let parsed = line
            .text()
            .ok_or(JoblineError::Syntax(line.number))
            .and_then(|text| parse_job_line(text, line.number));
        let job = match parsed {
            Ok(job) => job,
            Err(error) => {
                summary.rejected += 1;
                io.diagnose(error);
                continue;
            }
        };

        summary.submitted += 1;
        match ClientSession::new(transport, verbose).run(&job)? {
            JobOutcome::Integrated(result) => {
                output::write_result(io.stdout, &job, &result).map_err(AppError::Output)?;
            }
            JobOutcome::BadExpression => {
                summary.rejected += 1;
                io.diagnose(format_args!(
                    "bad expression \"{}\" (line {})",
                    job.expression, line.number
                ));
            }
            JobOutcome::IntegrationFailed(error) => {
                summary.rejected += 1;
                io.diagnose(format_args!(
                    "unable to integrate \"{}\": {error} (line {})",
                    job.expression, line.number
                ));
            }
        }
    }
    Ok(summary)
}
