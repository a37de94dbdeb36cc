//! Error types for request classification, response framing and report
//! decoding.

use std::io;

use intcalc_engine::IntegrationError;
use thiserror::Error;

use crate::request::Method;

/// Errors raised while parsing or classifying a request head.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The head is not valid UTF-8.
    #[error("request head is not valid UTF-8")]
    NotUtf8,
    /// The head is not a well-formed HTTP/1.x request head.
    #[error("malformed request head: {source}")]
    Malformed {
        /// Method token the head starts with.
        method: Method,
        /// Parser diagnostic.
        #[source]
        source: httparse::Error,
    },
    /// The head ends before its blank line.
    #[error("incomplete request head")]
    Incomplete {
        /// Method token the head starts with.
        method: Method,
    },
    /// The method is neither `GET` nor `POST`.
    #[error("unsupported method: {method}")]
    UnsupportedMethod {
        /// Method token as received.
        method: String,
    },
    /// The method is `POST`, which no operation accepts.
    #[error("method POST is not allowed")]
    PostNotAllowed,
    /// The path names neither `validate` nor `integrate`.
    #[error("unknown operation in path {path:?}")]
    UnknownOperation {
        /// Request target as received.
        path: String,
    },
    /// The path has fewer segments than the operation requires.
    #[error("missing {name} in path {path:?}")]
    MissingSegment {
        /// Name of the first missing segment.
        name: &'static str,
        /// Request target as received.
        path: String,
    },
    /// A numeric path segment did not parse as a whole token.
    #[error("malformed {name}: {text:?}")]
    MalformedParameter {
        /// Name of the segment.
        name: &'static str,
        /// Segment text as received.
        text: String,
    },
    /// The integrate parameters violate a job invariant.
    #[error("invalid integration parameters: {0}")]
    InvalidParameters(#[source] IntegrationError),
}

impl RequestError {
    /// Whether the server should answer this request with `400`.
    ///
    /// Requests whose method is neither `GET` nor `POST` are dropped without
    /// a response.
    #[must_use]
    pub fn is_answerable(&self) -> bool {
        match self {
            Self::UnsupportedMethod { .. } => false,
            Self::Malformed { method, .. } | Self::Incomplete { method } => {
                method.is_answerable()
            }
            _ => true,
        }
    }

    /// Creates a malformed parameter error.
    #[must_use]
    pub fn malformed_parameter(name: &'static str, text: impl Into<String>) -> Self {
        Self::MalformedParameter {
            name,
            text: text.into(),
        }
    }

    /// Creates a missing segment error.
    #[must_use]
    pub fn missing_segment(name: &'static str, path: impl Into<String>) -> Self {
        Self::MissingSegment {
            name,
            path: path.into(),
        }
    }
}

/// Errors raised while receiving a response frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The status line or a header is malformed.
    #[error("malformed response head: {0}")]
    MalformedHead(#[source] httparse::Error),
    /// `Content-Length` is not a decimal integer.
    #[error("invalid Content-Length: {value:?}")]
    InvalidContentLength {
        /// Header value as received.
        value: String,
    },
    /// The head grew beyond the frame limit without terminating.
    #[error("response head exceeds {limit} bytes")]
    HeadTooLarge {
        /// Maximum head size in bytes.
        limit: usize,
    },
    /// Reading from the connection failed.
    #[error("failed to read response: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while decoding an integration report body.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The body is not valid UTF-8.
    #[error("report is not valid UTF-8")]
    NotUtf8,
    /// The body has no final value line.
    #[error("report is empty")]
    Empty,
    /// A progress line does not match `thread <i>:<low>-><high>:<total>`.
    #[error("malformed progress line: {line:?}")]
    MalformedProgress {
        /// Line as received.
        line: String,
    },
    /// The final line is not a number.
    #[error("malformed result value: {line:?}")]
    MalformedValue {
        /// Line as received.
        line: String,
    },
}
