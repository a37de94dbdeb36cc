//! Supervises server launch sequencing and runtime orchestration.

use std::ffi::OsString;
use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, Overrides, SystemConfigLoader, bootstrap_with};
use crate::dispatch::DispatchConnectionHandler;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::{ConnectionLimiter, SocketListener};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{LISTEN_HOST, PROCESS_TARGET};

/// Collaborators required to launch the server runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
    pub(crate) listen_host: &'static str,
}

impl LaunchPlan<SystemConfigLoader, SystemShutdownSignal> {
    /// Production collaborators.
    pub(crate) fn system() -> Self {
        Self {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            shutdown: SystemShutdownSignal,
            listen_host: LISTEN_HOST,
        }
    }
}

/// Runs the server using the production collaborators until a termination
/// signal arrives.
///
/// The bound port is written to `stderr` once the socket is listening.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding, or signal handling
/// fails.
pub fn run_server<E: Write>(
    config_args: &[OsString],
    overrides: Overrides,
    stderr: &mut E,
) -> Result<(), LaunchError> {
    run_server_with(LaunchPlan::system(), config_args, overrides, stderr)
}

/// Runs the server with injected collaborators.
pub(crate) fn run_server_with<L, S, E>(
    plan: LaunchPlan<L, S>,
    config_args: &[OsString],
    overrides: Overrides,
    stderr: &mut E,
) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
    E: Write,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
        listen_host,
    } = plan;

    info!(target: PROCESS_TARGET, "starting server runtime");
    let server = bootstrap_with(&loader, config_args, overrides, Arc::clone(&reporter))?;
    let config = server.config();
    let limiter = match config.max_threads() {
        Some(max_threads) => {
            let bound = NonZeroUsize::new(max_threads).ok_or(LaunchError::ZeroMaxThreads)?;
            ConnectionLimiter::new(Some(bound))
        }
        None => ConnectionLimiter::unbounded(),
    };

    let listener = SocketListener::bind(listen_host, config.port())?;
    let address = listener.local_addr();
    writeln!(stderr, "{}", address.port())
        .and_then(|()| stderr.flush())
        .map_err(|source| LaunchError::Announce { source })?;

    let listener_handle = listener.start(Arc::new(DispatchConnectionHandler), limiter)?;
    reporter.listener_ready(address);
    shutdown.wait()?;
    reporter.shutdown_requested();
    listener_handle.shutdown();
    listener_handle.join()?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
