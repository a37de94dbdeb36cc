//! Request construction and classification.
//!
//! Requests are a single HTTP/1.1 request head with no body. The client
//! builds them with [`validate_request`] and [`integrate_request`]; the
//! server parses the head with [`RequestHead::parse`] and maps it to a
//! [`Route`] with [`Route::classify`].

use std::fmt;

use intcalc_engine::IntegrationSpec;

use crate::errors::RequestError;
use crate::fields::{format_bound, parse_bound, parse_count};

/// Header carrying the verbose progress flag.
pub const VERBOSE_HEADER: &str = "X-Verbose";

/// Value of [`VERBOSE_HEADER`] that enables progress reporting.
pub const VERBOSE_VALUE: &str = "yes";

/// Most headers a request head may carry.
const MAX_REQUEST_HEADERS: usize = 16;

const VALIDATE_OPERATION: &str = "validate";
const INTEGRATE_OPERATION: &str = "integrate";

/// Request method, as far as the server distinguishes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `GET`, the only method that reaches an operation.
    Get,
    /// `POST`, answered with `400`.
    Post,
    /// Any other token, dropped without a response.
    Other(String),
}

impl Method {
    /// Reads the method token at the start of a possibly partial head.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        let token = bytes
            .split(|byte| matches!(byte, b' ' | b'\r' | b'\n'))
            .next()
            .unwrap_or_default();
        Self::from(String::from_utf8_lossy(token).as_ref())
    }

    /// Whether a malformed request with this method still gets a response.
    #[must_use]
    pub const fn is_answerable(&self) -> bool {
        matches!(self, Self::Get | Self::Post)
    }
}

impl From<&str> for Method {
    fn from(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => formatter.write_str("GET"),
            Self::Post => formatter.write_str("POST"),
            Self::Other(token) => formatter.write_str(token),
        }
    }
}

/// Parsed request line and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: Method,
    target: String,
    headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Parses a complete request head, terminating blank line included.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the bytes are not UTF-8, the head is
    /// cut short, or it is not a well-formed HTTP/1.x request head.
    pub fn parse(bytes: &[u8]) -> Result<Self, RequestError> {
        std::str::from_utf8(bytes).map_err(|_| RequestError::NotUtf8)?;
        let mut headers = [httparse::EMPTY_HEADER; MAX_REQUEST_HEADERS];
        let mut request = httparse::Request::new(&mut headers);
        let incomplete = || RequestError::Incomplete {
            method: Method::sniff(bytes),
        };
        match request.parse(bytes) {
            Ok(httparse::Status::Complete(_)) => {}
            Ok(httparse::Status::Partial) => return Err(incomplete()),
            Err(source) => {
                return Err(RequestError::Malformed {
                    method: Method::sniff(bytes),
                    source,
                });
            }
        }
        let (Some(method), Some(target)) = (request.method, request.path) else {
            return Err(incomplete());
        };

        Ok(Self {
            method: Method::from(method),
            target: target.to_owned(),
            headers: request
                .headers
                .iter()
                .map(|header| {
                    let value = String::from_utf8_lossy(header.value);
                    (header.name.to_owned(), value.trim().to_owned())
                })
                .collect(),
        })
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request target, including the leading `/`.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Value of the first header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the verbose progress header is present and enabled.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.header(VERBOSE_HEADER)
            .is_some_and(|value| value.eq_ignore_ascii_case(VERBOSE_VALUE))
    }
}

/// Integration parameters carried by an integrate request.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrateRequest {
    /// Expression source text.
    pub expression: String,
    /// Bounds, counts and verbosity.
    pub spec: IntegrationSpec,
}

/// Operation selected by a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Check that an expression compiles.
    Validate {
        /// Expression source text.
        expression: String,
    },
    /// Integrate an expression.
    Integrate(IntegrateRequest),
}

impl Route {
    /// Maps a request head to an operation.
    ///
    /// The first path segment must be exactly `validate` or `integrate`.
    /// The expression is everything after the segments the operation
    /// consumes, so it may itself contain `/`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] for methods other than `GET`, unknown
    /// operations, missing or malformed segments, and integrate parameters
    /// that violate a job invariant.
    pub fn classify(head: &RequestHead) -> Result<Self, RequestError> {
        match head.method() {
            Method::Get => {}
            Method::Post => return Err(RequestError::PostNotAllowed),
            Method::Other(method) => {
                return Err(RequestError::UnsupportedMethod {
                    method: method.clone(),
                });
            }
        }

        let path = head.target();
        let unknown = || RequestError::UnknownOperation {
            path: path.to_owned(),
        };
        let relative = path.strip_prefix('/').ok_or_else(unknown)?;
        let (operation, rest) = relative.split_once('/').unwrap_or((relative, ""));

        match operation {
            VALIDATE_OPERATION => Ok(Self::Validate {
                expression: non_empty_expression(rest, path)?,
            }),
            INTEGRATE_OPERATION => classify_integrate(rest, path, head.is_verbose()),
            _ => Err(unknown()),
        }
    }
}

fn classify_integrate(rest: &str, path: &str, verbose: bool) -> Result<Route, RequestError> {
    let mut segments = rest.splitn(5, '/');
    let mut next = |name| {
        segments
            .next()
            .ok_or_else(|| RequestError::missing_segment(name, path))
    };
    let lower_text = next("lower bound")?;
    let upper_text = next("upper bound")?;
    let segments_text = next("segments")?;
    let threads_text = next("threads")?;
    let expression = non_empty_expression(next("expression")?, path)?;

    let lower = parse_bound(lower_text)
        .ok_or_else(|| RequestError::malformed_parameter("lower bound", lower_text))?;
    let upper = parse_bound(upper_text)
        .ok_or_else(|| RequestError::malformed_parameter("upper bound", upper_text))?;
    let segments = count("segments", segments_text)?;
    let threads = count("threads", threads_text)?;

    let spec = IntegrationSpec::new(lower, upper, segments, threads).with_verbose(verbose);
    spec.validate().map_err(RequestError::InvalidParameters)?;
    Ok(Route::Integrate(IntegrateRequest { expression, spec }))
}

fn count(name: &'static str, text: &str) -> Result<u64, RequestError> {
    parse_count(text).map_err(|_| RequestError::malformed_parameter(name, text))
}

fn non_empty_expression(text: &str, path: &str) -> Result<String, RequestError> {
    if text.is_empty() {
        return Err(RequestError::missing_segment("expression", path));
    }
    Ok(text.to_owned())
}

/// Builds the request asking whether `expression` compiles.
#[must_use]
pub fn validate_request(expression: &str) -> String {
    format!("GET /{VALIDATE_OPERATION}/{expression} HTTP/1.1\r\n\r\n")
}

/// Builds the request asking for an integration.
///
/// Bounds are written in round-trip form so the server integrates exactly
/// the values the client parsed.
#[must_use]
pub fn integrate_request(request: &IntegrateRequest) -> String {
    let spec = &request.spec;
    let verbose = if spec.verbose {
        format!("{VERBOSE_HEADER}: {VERBOSE_VALUE}\r\n")
    } else {
        String::new()
    };
    format!(
        "GET /{INTEGRATE_OPERATION}/{}/{}/{}/{}/{} HTTP/1.1\r\n{verbose}\r\n",
        format_bound(spec.lower),
        format_bound(spec.upper),
        spec.segments,
        spec.threads,
        request.expression,
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn route(raw: &str) -> Result<Route, RequestError> {
        let head = RequestHead::parse(raw.as_bytes()).expect("head parses");
        Route::classify(&head)
    }

    #[test]
    fn builds_validate_request() {
        assert_eq!(validate_request("x*x"), "GET /validate/x*x HTTP/1.1\r\n\r\n");
    }

    #[rstest]
    #[case(false, "GET /integrate/0/1.5/10/2/x HTTP/1.1\r\n\r\n")]
    #[case(true, "GET /integrate/0/1.5/10/2/x HTTP/1.1\r\nX-Verbose: yes\r\n\r\n")]
    fn builds_integrate_request(#[case] verbose: bool, #[case] expected: &str) {
        let request = IntegrateRequest {
            expression: "x".to_owned(),
            spec: IntegrationSpec::new(0.0, 1.5, 10, 2).with_verbose(verbose),
        };
        assert_eq!(integrate_request(&request), expected);
    }

    #[test]
    fn built_integrate_request_classifies_back() {
        let original = IntegrateRequest {
            expression: "x/3+1".to_owned(),
            spec: IntegrationSpec::new(-0.1, 2.0 / 3.0, 12, 4).with_verbose(true),
        };
        let routed = route(&integrate_request(&original)).expect("classifies");
        assert_eq!(routed, Route::Integrate(original));
    }

    #[test]
    fn classifies_validate() {
        assert_eq!(
            route("GET /validate/sin(x) HTTP/1.1\r\n\r\n").expect("validate"),
            Route::Validate {
                expression: "sin(x)".to_owned()
            }
        );
    }

    #[test]
    fn validate_expression_may_mention_integrate() {
        assert!(matches!(
            route("GET /validate/integrate HTTP/1.1\r\n\r\n"),
            Ok(Route::Validate { .. })
        ));
    }

    #[rstest]
    #[case("GET /bogus HTTP/1.1\r\n\r\n")]
    #[case("GET /validatex HTTP/1.1\r\n\r\n")]
    #[case("GET bogus HTTP/1.1\r\n\r\n")]
    #[case("GET /x/validate/x HTTP/1.1\r\n\r\n")]
    fn unknown_operations_are_answerable(#[case] raw: &str) {
        let error = route(raw).expect_err("unknown");
        assert!(matches!(error, RequestError::UnknownOperation { .. }));
        assert!(error.is_answerable());
    }

    #[rstest]
    #[case("GET /validate HTTP/1.1\r\n\r\n")]
    #[case("GET /validate/ HTTP/1.1\r\n\r\n")]
    #[case("GET /integrate/0/1/10/2 HTTP/1.1\r\n\r\n")]
    #[case("GET /integrate/0/1/10/2/ HTTP/1.1\r\n\r\n")]
    #[case("GET /integrate/0/x/10/2/x HTTP/1.1\r\n\r\n")]
    #[case("GET /integrate/0/1/10.5/2/x HTTP/1.1\r\n\r\n")]
    #[case("GET /integrate/0/1/10/0/x HTTP/1.1\r\n\r\n")]
    #[case("GET /integrate/1/1/10/2/x HTTP/1.1\r\n\r\n")]
    #[case("GET /integrate/0/1/10/3/x HTTP/1.1\r\n\r\n")]
    fn rejects_incomplete_or_invalid_paths(#[case] raw: &str) {
        let error = route(raw).expect_err("invalid");
        assert!(error.is_answerable(), "{error}");
    }

    #[test]
    fn post_is_answered() {
        let error = route("POST /validate/x HTTP/1.1\r\n\r\n").expect_err("post");
        assert!(matches!(error, RequestError::PostNotAllowed));
        assert!(error.is_answerable());
    }

    #[test]
    fn other_methods_are_dropped() {
        let error = route("DELETE /validate/x HTTP/1.1\r\n\r\n").expect_err("delete");
        assert!(!error.is_answerable());
    }

    #[rstest]
    #[case("GET /validate/x\r\n\r\n", true)]
    #[case("GET /validate/x y HTTP/1.1\r\n\r\n", true)]
    #[case("BREW /pot\r\n\r\n", false)]
    #[case("GET\r\n\r\n", true)]
    #[case("POST /validate/x HTTP/1.1\r\nno colon\r\n\r\n", true)]
    #[case("GET /validate/x HTTP/1.1\r\n", true)]
    #[case("\r\n\r\n", false)]
    fn malformed_request_lines_follow_their_method(#[case] raw: &str, #[case] answerable: bool) {
        let error = RequestHead::parse(raw.as_bytes()).expect_err("malformed");
        assert_eq!(error.is_answerable(), answerable);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let head = RequestHead::parse(b"GET /validate/x HTTP/1.1\r\nx-verbose: YES\r\n\r\n")
            .expect("parse");
        assert!(head.is_verbose());
        assert_eq!(head.header("X-VERBOSE"), Some("YES"));
    }

    #[test]
    fn sniffs_method_from_partial_head() {
        assert_eq!(Method::sniff(b"POST /valid"), Method::Post);
        assert_eq!(Method::sniff(b"GE"), Method::Other("GE".to_owned()));
        assert_eq!(Method::sniff(b"GET\r\n"), Method::Get);
    }
}
