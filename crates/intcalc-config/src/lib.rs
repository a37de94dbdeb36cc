//! Shared configuration for the integration client and server.
//!
//! Both binaries resolve the same [`Config`] through `ortho_config`: built-in
//! defaults, then a configuration file, then `INTCALC_*` environment variables,
//! then the configuration flags that precede the positional arguments. The
//! positional surface (`intclient [-v] [port [jobfile]]`,
//! `intserver [port [maxThreads]]`) is parsed separately by each binary and
//! overrides the values resolved here.
//!
//! The crate also owns telemetry installation so that both binaries format
//! their `tracing` output identically.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod arguments;
mod defaults;
mod logging;
pub mod telemetry;

pub use arguments::{ArgumentSplit, split_arguments};
pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PORT, default_log_filter, default_log_filter_string,
    default_log_format, default_port, resolve_port,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Configuration flags accepted ahead of the positional arguments.
///
/// MAINTENANCE: keep in sync with the fields of [`Config`].
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--port",
    "--max-threads",
    "--log-filter",
    "--log-format",
];

/// Layered configuration shared by `intclient` and `intserver`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "INTCALC")]
pub struct Config {
    /// TCP port the server listens on and the client connects to.
    pub port: Option<u16>,
    /// Upper bound on concurrently served connections. Unbounded when unset.
    pub max_threads: Option<usize>,
    /// `tracing` filter directive, for example `info` or `intserver=debug`.
    pub log_filter: Option<String>,
    /// Output format for log events.
    pub log_format: Option<LogFormat>,
}

impl Config {
    /// Loads configuration from the process arguments, environment and files.
    ///
    /// # Errors
    ///
    /// Returns the (possibly aggregated) loader error when any layer is
    /// malformed.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration using the supplied argument list.
    ///
    /// The first element is treated as the program name.
    ///
    /// # Errors
    ///
    /// Returns the (possibly aggregated) loader error when any layer is
    /// malformed.
    pub fn load_from_iter<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = OsString>,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Effective port, with `0` and unset both meaning [`DEFAULT_PORT`].
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.map_or(DEFAULT_PORT, resolve_port)
    }

    /// Effective connection bound; `None` means unbounded.
    #[must_use]
    pub fn max_threads(&self) -> Option<usize> {
        self.max_threads
    }

    /// Effective log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Effective log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Returns a copy with the port replaced.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Returns a copy with the connection bound replaced.
    #[must_use]
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.max_threads(), None);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[test]
    fn zero_port_falls_back_to_default() {
        let config = Config::default().with_port(0);
        assert_eq!(config.port(), DEFAULT_PORT);
    }

    #[test]
    fn overrides_replace_values() {
        let config = Config::default().with_port(9000).with_max_threads(4);
        assert_eq!(config.port(), 9000);
        assert_eq!(config.max_threads(), Some(4));
    }
}
