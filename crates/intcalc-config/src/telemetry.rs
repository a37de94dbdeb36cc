//! Structured telemetry initialisation shared by both binaries.
//!
//! Log events go to standard error alongside the user-facing diagnostics,
//! so the subscriber only colours output on a terminal. Thread names are
//! kept: the server names its accept thread and each connection worker, and
//! the integrator's partition workers log from scoped threads.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use crate::{Config, LogFormat};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that the global subscriber is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the call that installed the subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter \"{filter}\": {message}")]
    Filter {
        /// Directive as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the global subscriber on the first call.
///
/// Later calls leave the global state alone and report the format that was
/// installed, even when `config` asks for another one.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when `config` carries an unparsable
/// filter, or [`TelemetryError::Subscriber`] when a subscriber was set
/// outside this function.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install_subscriber(config).map(|()| config.log_format()))
        .map(|&format| TelemetryHandle { format })
}

fn parse_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|error| TelemetryError::Filter {
        filter: directive.to_owned(),
        message: error.to_string(),
    })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("intcalc=loud")]
    #[case("intserver[")]
    fn malformed_filter_names_the_directive(#[case] directive: &str) {
        let error = parse_filter(directive).expect_err("filter should not parse");
        assert!(
            matches!(&error, TelemetryError::Filter { filter, .. } if filter == directive),
            "unexpected error: {error}"
        );
    }

    #[rstest]
    #[case("warn")]
    #[case("intserver::dispatch=debug,warn")]
    fn well_formed_filters_parse(#[case] directive: &str) {
        assert!(parse_filter(directive).is_ok());
    }
}
