//! Per-job exchange with the server.
//!
//! A session walks `Idle → Connecting → AwaitValidateResponse →
//! AwaitIntegrateResponse → Done`, or stops in `Aborted` when the server
//! rejects the expression. A closed connection or an unexpected status is a
//! [`SessionError`], which ends the whole client run.
//!
//! The server answers one request per connection, so the session passes
//! through `Connecting` twice per job: once before the validate request and
//! again before the integrate request.

use std::io;

use intcalc_engine::{IntegrationError, IntegrationResult, approx_eq, integrate};
use intcalc_protocol::{
    CLOSED_STATUS, IntegrateRequest, ResponseFrame, Status, decode_report, integrate_request,
    validate_request,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::CommunicationError;
use crate::jobline::JobRequest;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Sends one request on a fresh connection and returns the response.
pub trait Transport {
    /// Connects, writes `request`, and reads the response frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connect`] when no connection can be made and
    /// [`SessionError::Communication`] when the exchange fails.
    fn round_trip(&mut self, request: &str) -> Result<ResponseFrame, SessionError>;
}

/// Fatal session failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server could not be reached.
    #[error("unable to connect to port \"{port}\"")]
    Connect {
        /// Port the client tried.
        port: u16,
        /// Underlying connection error.
        #[source]
        source: io::Error,
    },
    /// An exchange failed after connecting.
    #[error(transparent)]
    Communication(#[from] CommunicationError),
}

/// Session progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing sent yet.
    Idle,
    /// Opening a connection.
    Connecting,
    /// Validate request sent.
    AwaitValidateResponse,
    /// Integrate request sent.
    AwaitIntegrateResponse,
    /// Result computed.
    Done,
    /// Stopped before completion.
    Aborted,
}

/// How a job ended when the run can continue.
#[derive(Debug)]
pub enum JobOutcome {
    /// The integral was computed.
    Integrated(IntegrationResult),
    /// The server rejected the expression.
    BadExpression,
    /// The server accepted the job but the local computation failed.
    IntegrationFailed(IntegrationError),
}

/// Drives the two exchanges for one job line.
pub struct ClientSession<'t, T: Transport> {
    transport: &'t mut T,
    verbose: bool,
    state: SessionState,
}

impl<'t, T: Transport> ClientSession<'t, T> {
    /// Creates an idle session.
    #[must_use]
    pub fn new(transport: &'t mut T, verbose: bool) -> Self {
        Self {
            transport,
            verbose,
            state: SessionState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Validates and integrates `job`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the server cannot be reached, closes a
    /// connection early, or answers with an unexpected status.
    pub fn run(&mut self, job: &JobRequest) -> Result<JobOutcome, SessionError> {
        let validate = self.exchange(
            &validate_request(&job.expression),
            SessionState::AwaitValidateResponse,
        )?;
        match validate.status {
            code if code == Status::Ok.code() => {}
            code if code == Status::BadRequest.code() => {
                self.enter(SessionState::Aborted);
                return Ok(JobOutcome::BadExpression);
            }
            code => return Err(self.fail(code)),
        }

        let request = IntegrateRequest {
            expression: job.expression.clone(),
            spec: job.spec(self.verbose),
        };
        let integrated = self.exchange(
            &integrate_request(&request),
            SessionState::AwaitIntegrateResponse,
        )?;
        if integrated.status != Status::Ok.code() {
            return Err(self.fail(integrated.status));
        }

        match integrate(&request.expression, &request.spec) {
            Ok(result) => {
                compare_with_server(&result, &integrated);
                self.enter(SessionState::Done);
                Ok(JobOutcome::Integrated(result))
            }
            Err(error) => {
                self.enter(SessionState::Aborted);
                Ok(JobOutcome::IntegrationFailed(error))
            }
        }
    }

    fn exchange(
        &mut self,
        request: &str,
        awaiting: SessionState,
    ) -> Result<ResponseFrame, SessionError> {
        self.enter(SessionState::Connecting);
        let result = self.transport.round_trip(request);
        if result.is_err() {
            self.enter(SessionState::Aborted);
            return result;
        }
        self.enter(awaiting);
        result
    }

    fn fail(&mut self, status: u16) -> SessionError {
        self.enter(SessionState::Aborted);
        let error = if status == CLOSED_STATUS {
            CommunicationError::Closed
        } else {
            CommunicationError::UnexpectedStatus(status)
        };
        SessionError::Communication(error)
    }

    fn enter(&mut self, state: SessionState) {
        debug!(target: SESSION_TARGET, from = ?self.state, to = ?state, "session transition");
        self.state = state;
    }
}

fn compare_with_server(local: &IntegrationResult, frame: &ResponseFrame) {
    match decode_report(&frame.body) {
        Ok(remote) if approx_eq(remote.value, local.value) => {}
        Ok(remote) => warn!(
            target: SESSION_TARGET,
            local = local.value,
            remote = remote.value,
            "server result disagrees with local computation"
        ),
        Err(error) => warn!(target: SESSION_TARGET, %error, "unreadable integration report"),
    }
}
