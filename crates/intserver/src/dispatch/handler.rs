//! Connection handler that dispatches validate and integrate requests.
//!
//! The handler reads one request head, routes it, writes the response and
//! lets the connection close. Each invocation compiles and integrates its
//! own expression, so handlers share no state.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use intcalc_engine::{Expression, integrate};
use intcalc_protocol::{Method, RequestHead, Route, Status, encode_report};
use tracing::{debug, warn};

use crate::transport::ConnectionHandler;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::response::ResponseWriter;

/// Maximum size of a request head in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 64 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Connection handler serving the validate/integrate protocol.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DispatchConnectionHandler;

impl DispatchConnectionHandler {
    /// Handles a connection by reading the request and dispatching.
    pub(crate) fn dispatch<S: Read + Write>(&self, stream: &mut S) {
        let mut head = Vec::new();
        let result = match read_request_head(stream, &mut head) {
            Ok(true) => respond(&head, &mut ResponseWriter::new(&mut *stream)),
            Ok(false) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(error) => Err(error),
        };

        if let Err(error) = result {
            reject(stream, &head, &error);
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, mut stream: TcpStream) {
        self.dispatch(&mut stream);
    }
}

fn respond<W: Write>(head: &[u8], writer: &mut ResponseWriter<W>) -> Result<(), DispatchError> {
    let head = RequestHead::parse(head)?;
    match Route::classify(&head)? {
        Route::Validate { expression } => match Expression::compile(&expression) {
            Ok(_) => {
                debug!(target: DISPATCH_TARGET, %expression, "expression compiles");
                writer.write_ok()
            }
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %expression, %error, "expression rejected");
                writer.write_bad_request()
            }
        },
        Route::Integrate(request) => {
            debug!(
                target: DISPATCH_TARGET,
                expression = %request.expression,
                lower = request.spec.lower,
                upper = request.spec.upper,
                segments = request.spec.segments,
                threads = request.spec.threads,
                verbose = request.spec.verbose,
                "integrating"
            );
            let result = integrate(&request.expression, &request.spec)?;
            writer.write_response(Status::Ok, encode_report(&result).as_bytes())
        }
    }
}

/// Answers a failed request with `400` or drops it, per its method.
fn reject<S: Write>(stream: &mut S, head: &[u8], error: &DispatchError) {
    let method = Method::sniff(head);
    let Some(status) = error.response_status(&method) else {
        warn!(target: DISPATCH_TARGET, %error, %method, "dropping request");
        return;
    };
    warn!(target: DISPATCH_TARGET, %error, %method, "rejecting request");
    if let Err(write_error) = ResponseWriter::new(stream).write_response(status, &[]) {
        warn!(target: DISPATCH_TARGET, error = %write_error, "failed to write rejection");
    }
}

/// Reads a bounded request head from the stream into `buffer`.
///
/// Returns `Ok(false)` if the client disconnects without sending data and
/// `Ok(true)` once the blank line has arrived; `buffer` then holds the head
/// up to and including the terminator. On error `buffer` keeps whatever was
/// received so the caller can still sniff the method.
fn read_request_head<S: Read>(stream: &mut S, buffer: &mut Vec<u8>) -> Result<bool, DispatchError> {
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;

        if bytes_read == 0 {
            return if buffer.is_empty() {
                Ok(false)
            } else {
                Err(DispatchError::truncated(buffer.len()))
            };
        }

        // The terminator may straddle two chunks.
        let search_from = buffer.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        buffer.extend(chunk.iter().take(bytes_read));
        if let Some(end) = find_terminator(buffer, search_from) {
            buffer.truncate(end);
            enforce_limit(buffer.len())?;
            return Ok(true);
        }

        enforce_limit(buffer.len())?;
    }
}

fn find_terminator(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
        .map(|offset| from + offset + HEAD_TERMINATOR.len())
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<S: Read>(stream: &mut S, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Enforces the maximum request size limit.
fn enforce_limit(size: usize) -> Result<(), DispatchError> {
    if size > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(size, MAX_REQUEST_BYTES));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use intcalc_engine::approx_eq;
    use intcalc_protocol::{ResponseFrame, decode_report, receive_response};
    use rstest::rstest;

    use super::*;

    /// In-memory connection: reads from `input`, records writes.
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Duplex {
        fn new(request: &[u8]) -> Self {
            Self {
                input: Cursor::new(request.to_vec()),
                output: Vec::new(),
            }
        }
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn serve(request: &[u8]) -> Vec<u8> {
        let mut connection = Duplex::new(request);
        DispatchConnectionHandler.dispatch(&mut connection);
        connection.output
    }

    fn serve_frame(request: &[u8]) -> ResponseFrame {
        let output = serve(request);
        receive_response(&mut output.as_slice()).expect("decode response")
    }

    #[rstest]
    #[case::compiles(b"GET /validate/x*x HTTP/1.1\r\n\r\n", 200)]
    #[case::does_not_compile(b"GET /validate/y HTTP/1.1\r\n\r\n", 400)]
    #[case::unknown_path(b"GET /bogus HTTP/1.1\r\n\r\n", 400)]
    #[case::post(b"POST /validate/x HTTP/1.1\r\n\r\n", 400)]
    #[case::operation_prefix(b"GET /validatex/x HTTP/1.1\r\n\r\n", 400)]
    #[case::uneven_partition(b"GET /integrate/0/1/10/3/x HTTP/1.1\r\n\r\n", 400)]
    #[case::reversed_bounds(b"GET /integrate/1/0/10/2/x HTTP/1.1\r\n\r\n", 400)]
    #[case::bad_expression(b"GET /integrate/0/1/10/2/y HTTP/1.1\r\n\r\n", 400)]
    #[case::malformed_get(b"GET\r\n\r\n", 400)]
    fn answers_with_status(#[case] request: &[u8], #[case] status: u16) {
        assert_eq!(serve_frame(request).status, status);
    }

    #[rstest]
    #[case::delete(b"DELETE /validate/x HTTP/1.1\r\n\r\n")]
    #[case::malformed_other(b"FETCH\r\n\r\n")]
    #[case::empty(b"")]
    #[case::truncated_other(b"PUT /validate/x HTTP/1.1\r\n")]
    fn drops_without_response(#[case] request: &[u8]) {
        assert!(serve(request).is_empty());
    }

    #[test]
    fn truncated_get_is_answered() {
        assert_eq!(serve_frame(b"GET /validate/x HTTP/1.1\r\n").status, 400);
    }

    #[test]
    fn integrates_with_report_body() {
        let frame = serve_frame(b"GET /integrate/0/1/10/2/x HTTP/1.1\r\n\r\n");
        assert_eq!(frame.status, 200);
        let report = decode_report(&frame.body).expect("report");
        assert!(approx_eq(report.value, 0.5));
        assert!(report.progress.is_empty());
    }

    #[test]
    fn verbose_header_adds_progress() {
        let frame = serve_frame(b"GET /integrate/0/1/10/2/x HTTP/1.1\r\nX-Verbose: yes\r\n\r\n");
        let report = decode_report(&frame.body).expect("report");
        assert_eq!(report.progress.len(), 2);
        assert_eq!(report.progress.first().map(|p| p.thread_index), Some(1));
    }

    #[test]
    fn deeply_nested_expression_is_rejected() {
        let nested = format!("{}x{}", "(".repeat(20_000), ")".repeat(20_000));
        let request = format!("GET /validate/{nested} HTTP/1.1\r\n\r\n");
        let status = std::thread::spawn(move || serve_frame(request.as_bytes()).status)
            .join()
            .expect("handler thread survives");
        assert_eq!(status, 400);
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut request = b"GET /validate/".to_vec();
        request.extend(std::iter::repeat_n(b'x', MAX_REQUEST_BYTES));
        request.extend_from_slice(b" HTTP/1.1\r\n\r\n");
        assert_eq!(serve_frame(&request).status, 400);
    }

    #[test]
    fn terminator_split_across_chunks_is_found() {
        let mut buffer = b"GET / HTTP/1.1\r\n\r".to_vec();
        let from = buffer.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        buffer.push(b'\n');
        assert_eq!(find_terminator(&buffer, from), Some(buffer.len()));
    }
}
