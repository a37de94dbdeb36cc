//! TCP listener for the integration server.
//!
//! The transport module binds the listening socket and accepts connections
//! on a background thread, handing each one to a [`ConnectionHandler`] on
//! its own worker thread. A [`ConnectionLimiter`] caps how many workers run
//! at once.

mod errors;
mod handler;
mod limiter;
mod listener;
#[cfg(test)]
mod test_utils;

pub(crate) use self::errors::ListenerError;
pub(crate) use self::handler::ConnectionHandler;
pub(crate) use self::limiter::ConnectionLimiter;
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, GatedHandler};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
