//! Response writing helpers for the dispatch loop.

use std::io::Write;

use intcalc_protocol::{Status, encode_response};

use super::errors::DispatchError;

/// Writer that frames responses onto a stream.
pub(crate) struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a complete response and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or flushing fails.
    pub(crate) fn write_response(&mut self, status: Status, body: &[u8]) -> Result<(), DispatchError> {
        self.writer.write_all(&encode_response(status, body))?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes an empty `200 OK`.
    pub(crate) fn write_ok(&mut self) -> Result<(), DispatchError> {
        self.write_response(Status::Ok, &[])
    }

    /// Writes an empty `400 Bad Request`.
    pub(crate) fn write_bad_request(&mut self) -> Result<(), DispatchError> {
        self.write_response(Status::BadRequest, &[])
    }
}
