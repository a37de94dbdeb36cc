//! Wire protocol shared by `intclient` and `intserver`.
//!
//! A job takes two round-trips, each on its own connection-scoped request:
//!
//! - `GET /validate/<expression>` answers `200` when the expression
//!   compiles and `400` otherwise.
//! - `GET /integrate/<lower>/<upper>/<segments>/<threads>/<expression>`
//!   answers `200` with an integration report body, optionally carrying
//!   per-partition progress when the `X-Verbose: yes` header is present.
//!
//! Requests have no body. Responses always carry `Content-Length` and
//! `Connection: close`; the server closes the connection after one
//! response.

mod errors;
pub mod fields;
mod report;
mod request;
mod response;

pub use errors::{FrameError, ReportError, RequestError};
pub use report::{decode_report, encode_report};
pub use request::{
    IntegrateRequest, Method, RequestHead, Route, VERBOSE_HEADER, VERBOSE_VALUE,
    integrate_request, validate_request,
};
pub use response::{
    CLOSED_STATUS, FrameProgress, MAX_RESPONSE_HEAD_BYTES, ResponseFrame, ResponseFrameReader,
    Status, encode_response, receive_response,
};
