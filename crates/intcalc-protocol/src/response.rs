//! Response encoding and incremental frame decoding.
//!
//! Every response is `HTTP/1.1 <code> <reason>` followed by
//! `Content-Length` and `Connection: close` headers and the body.
//! [`ResponseFrameReader`] accepts received bytes in arbitrary chunks and
//! yields the frame once the head and the declared body length are present.
//! The head itself is parsed by `httparse`.

use std::io::{self, Read};

use tracing::trace;

use crate::errors::FrameError;

const FRAME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::frame");

/// Largest response head the reader buffers before giving up.
pub const MAX_RESPONSE_HEAD_BYTES: usize = 64 * 1024;

/// Status reported when the connection closed before a full response.
pub const CLOSED_STATUS: u16 = 0;

/// Most headers a response head may carry.
const MAX_RESPONSE_HEADERS: usize = 16;

/// Statuses the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `200 OK`.
    Ok,
    /// `400 Bad Request`.
    BadRequest,
}

impl Status {
    /// Numeric status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
        }
    }

    /// Reason phrase.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
        }
    }
}

/// Encodes a complete response with `body`.
#[must_use]
pub fn encode_response(status: Status, body: &[u8]) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status.code(),
        status.reason(),
        body.len()
    );
    if !body.is_empty() {
        head.push_str("Content-Type: text/plain\r\n");
    }
    head.push_str("\r\n");
    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Status code, or [`CLOSED_STATUS`] when no full response arrived.
    pub status: u16,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl ResponseFrame {
    /// Frame standing for a connection that closed before a full response.
    #[must_use]
    pub const fn closed() -> Self {
        Self {
            status: CLOSED_STATUS,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Whether this frame stands for a closed connection.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.status == CLOSED_STATUS
    }

    /// Value of the first header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Outcome of feeding bytes to a [`ResponseFrameReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameProgress {
    /// More bytes are needed.
    Incomplete,
    /// A full frame was decoded.
    Complete(ResponseFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedHead {
    status: u16,
    headers: Vec<(String, String)>,
    body_start: usize,
    content_length: Option<usize>,
}

/// Incremental response decoder.
#[derive(Debug, Default)]
pub struct ResponseFrameReader {
    buffer: Vec<u8>,
    head: Option<ParsedHead>,
}

impl ResponseFrameReader {
    /// Creates an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and reports whether a full frame is now available.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when the head is malformed or grows beyond
    /// [`MAX_RESPONSE_HEAD_BYTES`].
    pub fn feed(&mut self, bytes: &[u8]) -> Result<FrameProgress, FrameError> {
        self.buffer.extend_from_slice(bytes);
        if self.head.is_none() {
            let Some(head) = parse_head(&self.buffer)? else {
                if self.buffer.len() > MAX_RESPONSE_HEAD_BYTES {
                    return Err(FrameError::HeadTooLarge {
                        limit: MAX_RESPONSE_HEAD_BYTES,
                    });
                }
                return Ok(FrameProgress::Incomplete);
            };
            self.head = Some(head);
        }
        Ok(self.take_complete().map_or(FrameProgress::Incomplete, FrameProgress::Complete))
    }

    /// Resolves the frame once the peer has closed the connection.
    ///
    /// A head without `Content-Length` takes everything received as its
    /// body. Anything short of a full frame is reported as closed.
    #[must_use]
    pub fn finish(self) -> ResponseFrame {
        match self.head {
            Some(head) if head.content_length.is_none() => ResponseFrame {
                status: head.status,
                headers: head.headers,
                body: self.buffer.get(head.body_start..).unwrap_or_default().to_vec(),
            },
            _ => {
                trace!(
                    target: FRAME_TARGET,
                    buffered = self.buffer.len(),
                    "connection closed before a full response"
                );
                ResponseFrame::closed()
            }
        }
    }

    fn take_complete(&self) -> Option<ResponseFrame> {
        let head = self.head.as_ref()?;
        let length = head.content_length?;
        let body = self
            .buffer
            .get(head.body_start..head.body_start.checked_add(length)?)?;
        Some(ResponseFrame {
            status: head.status,
            headers: head.headers.clone(),
            body: body.to_vec(),
        })
    }
}

/// Parses the response head at the start of `buffer`, or returns `None`
/// while it is still incomplete.
fn parse_head(buffer: &[u8]) -> Result<Option<ParsedHead>, FrameError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_RESPONSE_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    let body_start = match response.parse(buffer).map_err(FrameError::MalformedHead)? {
        httparse::Status::Complete(body_start) => body_start,
        httparse::Status::Partial => return Ok(None),
    };
    let Some(status) = response.code else {
        return Ok(None);
    };

    let headers: Vec<(String, String)> = response
        .headers
        .iter()
        .map(|header| {
            let value = String::from_utf8_lossy(header.value);
            (header.name.to_owned(), value.trim().to_owned())
        })
        .collect();
    let content_length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, value)| {
            value
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength {
                    value: value.clone(),
                })
        })
        .transpose()?;

    Ok(Some(ParsedHead {
        status,
        headers,
        body_start,
        content_length,
    }))
}

/// Reads from `reader` until a full response frame arrives or the peer
/// closes the connection.
///
/// # Errors
///
/// Returns [`FrameError`] when reading fails or the response is malformed.
pub fn receive_response<R: Read>(reader: &mut R) -> Result<ResponseFrame, FrameError> {
    let mut frames = ResponseFrameReader::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let bytes_read = read_with_retry(reader, &mut chunk)?;
        if bytes_read == 0 {
            return Ok(frames.finish());
        }
        let received = chunk.get(..bytes_read).unwrap_or_default();
        if let FrameProgress::Complete(frame) = frames.feed(received)? {
            trace!(target: FRAME_TARGET, status = frame.status, "received response");
            return Ok(frame);
        }
    }
}

fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
