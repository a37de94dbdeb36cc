//! Fatal error types and their exit codes.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use intcalc_config::telemetry::TelemetryError;
use intcalc_protocol::FrameError;
use thiserror::Error;

use crate::session::SessionError;

/// Errors that end a client run.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("unable to open job file \"{}\"", path.display())]
    OpenJobFile { path: PathBuf, source: io::Error },
    #[error("unable to read job file: {0}")]
    ReadJobFile(io::Error),
    #[error("unable to connect to port \"{port}\"")]
    Connect { port: u16, source: io::Error },
    #[error("communications error")]
    Communication(#[from] CommunicationError),
    #[error("failed to write output: {0}")]
    Output(io::Error),
}

impl AppError {
    /// Process exit status for this error.
    pub(crate) fn exit_code(&self) -> ExitCode {
        let code: u8 = match self {
            Self::LoadConfiguration(_) | Self::CliUsage(_) | Self::Telemetry(_) => 1,
            Self::OpenJobFile { .. } | Self::ReadJobFile(_) => 2,
            Self::Communication(_) | Self::Output(_) => 3,
            Self::Connect { .. } => 4,
        };
        ExitCode::from(code)
    }
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Connect { port, source } => Self::Connect { port, source },
            SessionError::Communication(error) => Self::Communication(error),
        }
    }
}

/// Ways an exchange with the server can fail.
#[derive(Debug, Error)]
pub enum CommunicationError {
    /// Writing the request failed, for example on a broken pipe.
    #[error("failed to send request: {0}")]
    Send(#[source] io::Error),
    /// Reading or decoding the response failed.
    #[error("failed to receive response: {0}")]
    Receive(#[from] FrameError),
    /// The server closed the connection before a full response.
    #[error("connection closed before a response was received")]
    Closed,
    /// The server answered with a status this exchange does not accept.
    #[error("unexpected response status {0}")]
    UnexpectedStatus(u16),
}
