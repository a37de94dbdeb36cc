//! Shared test doubles for server scenarios.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use intcalc_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::process::shutdown::{ShutdownError, ShutdownSignal};

pub(super) const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerReady(SocketAddr),
    ShutdownRequested,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub(super) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
    recorded: Condvar,
}

impl RecordingHealthReporter {
    pub(super) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
        self.recorded.notify_all();
    }

    /// Waits for the listener to report its address.
    pub(super) fn wait_for_listener(&self) -> SocketAddr {
        let events = self.events.lock().expect("health reporter mutex poisoned");
        let (events, _) = self
            .recorded
            .wait_timeout_while(events, WAIT_TIMEOUT, |events| {
                !events
                    .iter()
                    .any(|event| matches!(event, HealthEvent::ListenerReady(_)))
            })
            .expect("health reporter mutex poisoned during wait");
        events
            .iter()
            .find_map(|event| match event {
                HealthEvent::ListenerReady(address) => Some(*address),
                _ => None,
            })
            .expect("listener never became ready")
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, address: SocketAddr) {
        self.record(HealthEvent::ListenerReady(address));
    }

    fn shutdown_requested(&self) {
        self.record(HealthEvent::ShutdownRequested);
    }
}

#[derive(Clone)]
pub(super) struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    pub(super) fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub(super) fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(())
    }
}

/// Finds a port that is free right now.
pub(super) fn unused_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind probe listener");
    listener.local_addr().expect("probe address").port()
}

/// Sends raw request bytes and reads until the server closes.
pub(super) fn exchange(address: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(address).expect("connect");
    stream
        .set_read_timeout(Some(WAIT_TIMEOUT))
        .expect("set read timeout");
    stream.write_all(request).expect("write request");
    stream.flush().expect("flush");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).expect("read response");
    response
}
