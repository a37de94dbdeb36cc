//! Request dispatch for the validate/integrate protocol.
//!
//! Each accepted connection carries exactly one request head:
//!
//! ```text
//! GET /validate/<expression> HTTP/1.1
//! GET /integrate/<lower>/<upper>/<segments>/<threads>/<expression> HTTP/1.1
//! X-Verbose: yes
//! ```
//!
//! `validate` answers `200` when the expression compiles and `400` when it
//! does not. `integrate` answers `200` with an integration report body.
//! `POST`, unknown operations and malformed parameters get `400 Bad
//! Request`; requests with any other method are dropped without a response.
//! The connection is closed after the response.

mod errors;
mod handler;
mod response;

pub(crate) use self::handler::DispatchConnectionHandler;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
