//! Defines the unified error surface for server launch and supervision.

use std::io;
use std::process::ExitCode;

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the server process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The configured connection bound is zero.
    #[error("maxThreads must be at least 1")]
    ZeroMaxThreads,
    /// Bootstrapping the server failed.
    #[error("server bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// Socket listener startup failed.
    #[error("{source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// Writing the bound port to standard error failed.
    #[error("failed to announce the listening port: {source}")]
    Announce {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl LaunchError {
    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        let code: u8 = match self {
            Self::ZeroMaxThreads => 1,
            Self::Bootstrap { .. } | Self::Announce { .. } | Self::Shutdown { .. } => 2,
            Self::Listener { .. } => 3,
        };
        ExitCode::from(code)
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}
