//! Test helpers for the transport module.

use std::io::Write;
use std::net::TcpStream;
use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use super::ConnectionHandler;

const GATE_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: TcpStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct GateState {
    started: usize,
    active: usize,
    max_concurrent: usize,
    releases: usize,
}

/// Holds every connection open until the test releases it, then replies
/// with a single byte.
#[derive(Debug, Default)]
pub(crate) struct GatedHandler {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl GatedHandler {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn started(&self) -> usize {
        self.state.lock().expect("gate mutex poisoned").started
    }

    pub(crate) fn max_concurrent(&self) -> usize {
        self.state.lock().expect("gate mutex poisoned").max_concurrent
    }

    pub(crate) fn release_one(&self) {
        self.state.lock().expect("gate mutex poisoned").releases += 1;
        self.changed.notify_all();
    }

    /// Waits until `count` connections have started.
    pub(crate) fn wait_for_active(&self, count: usize) -> bool {
        let state = self.state.lock().expect("gate mutex poisoned");
        let (state, _) = self
            .changed
            .wait_timeout_while(state, GATE_TIMEOUT, |state| state.started < count)
            .expect("gate mutex poisoned during wait");
        state.started >= count
    }
}

impl ConnectionHandler for GatedHandler {
    fn handle(&self, mut stream: TcpStream) {
        {
            let mut state = self.state.lock().expect("gate mutex poisoned");
            state.started += 1;
            state.active += 1;
            state.max_concurrent = state.max_concurrent.max(state.active);
        }
        self.changed.notify_all();

        {
            let state = self.state.lock().expect("gate mutex poisoned");
            let mut state = self
                .changed
                .wait_while(state, |state| state.releases == 0)
                .expect("gate mutex poisoned during wait");
            state.releases -= 1;
            state.active -= 1;
        }
        stream.write_all(b"!").expect("write reply");
    }
}
