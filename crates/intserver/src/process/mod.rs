//! Server launch sequencing and shutdown.

mod errors;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::run_server;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Host the production listener binds: every local interface.
pub(crate) const LISTEN_HOST: &str = "0.0.0.0";
