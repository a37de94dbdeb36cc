//! Error types for request dispatch failures.
//!
//! Each variant records why a connection could not be served normally and
//! decides whether the client still gets a `400 Bad Request`.

use std::io;

use intcalc_engine::IntegrationError;
use intcalc_protocol::{Method, RequestError, Status};
use thiserror::Error;

/// Errors surfaced while reading, classifying or executing a request.
#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    /// Request head exceeds the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },

    /// The client closed the connection before the blank line.
    #[error("request head truncated after {received} bytes")]
    Truncated { received: usize },

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The request head could not be parsed or routed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The integrator refused or failed the job.
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
}

impl DispatchError {
    /// Status to answer with, or `None` when the connection is dropped.
    ///
    /// `method` is sniffed from the raw head so that malformed requests
    /// with an unanswerable method are dropped too.
    pub(crate) fn response_status(&self, method: &Method) -> Option<Status> {
        let answerable = match self {
            Self::Io(_) => false,
            Self::RequestTooLarge { .. } | Self::Truncated { .. } => method.is_answerable(),
            Self::Request(error) => method.is_answerable() && error.is_answerable(),
            Self::Integration(_) => true,
        };
        answerable.then_some(Status::BadRequest)
    }

    /// Creates a request too large error.
    pub(crate) fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }

    /// Creates a truncated head error.
    pub(crate) fn truncated(received: usize) -> Self {
        Self::Truncated { received }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::get(Method::Get, Some(Status::BadRequest))]
    #[case::post(Method::Post, Some(Status::BadRequest))]
    #[case::other(Method::Other("PUT".to_owned()), None)]
    fn oversized_heads_follow_the_method(#[case] method: Method, #[case] expected: Option<Status>) {
        let error = DispatchError::request_too_large(70_000, 65_536);
        assert_eq!(error.response_status(&method), expected);
    }

    #[test]
    fn io_failures_are_never_answered() {
        let error = DispatchError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(error.response_status(&Method::Get), None);
    }

    #[test]
    fn unsupported_methods_are_dropped() {
        let error = DispatchError::from(RequestError::UnsupportedMethod {
            method: "DELETE".to_owned(),
        });
        assert_eq!(
            error.response_status(&Method::Other("DELETE".to_owned())),
            None
        );
    }

    #[test]
    fn post_is_answered() {
        let error = DispatchError::from(RequestError::PostNotAllowed);
        assert_eq!(
            error.response_status(&Method::Post),
            Some(Status::BadRequest)
        );
    }
}
