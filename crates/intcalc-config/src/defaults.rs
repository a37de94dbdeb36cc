use crate::logging::LogFormat;

/// Port used by both binaries when none is configured, or when `0` is given.
pub const DEFAULT_PORT: u16 = 5142;

/// Default log filter expression used by the binaries.
///
/// Kept at `warn` so that the user-facing diagnostics written to stderr are
/// not interleaved with routine events.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default port, as a function for serde defaults.
#[must_use]
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Resolves a port as given on the command line; `0` selects the default.
#[must_use]
pub const fn resolve_port(port: u16) -> u16 {
    if port == 0 { DEFAULT_PORT } else { port }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, DEFAULT_PORT)]
    #[case(8080, 8080)]
    #[case(DEFAULT_PORT, DEFAULT_PORT)]
    fn zero_port_selects_default(#[case] given: u16, #[case] expected: u16) {
        assert_eq!(resolve_port(given), expected);
    }
}
