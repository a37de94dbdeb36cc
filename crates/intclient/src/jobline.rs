//! Parsing and validation of a single job-file line.
//!
//! A job line is `expression,lower,upper,segments,threads`. Checks run in a
//! fixed order and stop at the first failure: bounds parse, bounds equality
//! and ordering, segments, threads, divisibility, and finally whitespace in
//! the expression.

use intcalc_engine::IntegrationSpec;
use intcalc_protocol::fields::{CountError, parse_bound, parse_count};
use thiserror::Error;

/// A validated integration job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    /// Expression text, free of whitespace.
    pub expression: String,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound, strictly greater than `lower`.
    pub upper: f64,
    /// Segment count, a positive multiple of `threads`.
    pub segments: u64,
    /// Thread count, at least 1.
    pub threads: u64,
}

impl JobRequest {
    /// Integration parameters for this job.
    #[must_use]
    pub const fn spec(&self, verbose: bool) -> IntegrationSpec {
        IntegrationSpec::new(self.lower, self.upper, self.segments, self.threads)
            .with_verbose(verbose)
    }
}

/// Why a job line was rejected. Each variant carries the 1-based line
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoblineError {
    /// Wrong field count or a numeric field that is not exactly one token.
    #[error("syntax error on line {0}")]
    Syntax(usize),
    /// Whitespace inside the expression.
    #[error("spaces not permitted in expression (line {0})")]
    Whitespace(usize),
    /// Upper bound not strictly greater than the lower bound.
    #[error("upper bound must be greater than lower bound (line {0})")]
    UpperBound(usize),
    /// Segment count below 1.
    #[error("segments must be a positive integer (line {0})")]
    InvalidSegments(usize),
    /// Thread count below 1.
    #[error("threads must be a positive integer (line {0})")]
    InvalidThreads(usize),
    /// Segment count not divisible by the thread count.
    #[error("segments must be an integer multiple of threads (line {0})")]
    IntegerMultiple(usize),
}

impl JoblineError {
    /// Line the error refers to.
    #[must_use]
    pub const fn line(self) -> usize {
        match self {
            Self::Syntax(line)
            | Self::Whitespace(line)
            | Self::UpperBound(line)
            | Self::InvalidSegments(line)
            | Self::InvalidThreads(line)
            | Self::IntegerMultiple(line) => line,
        }
    }
}

/// Parses `line`, reporting failures against `line_number`.
///
/// # Errors
///
/// Returns the first [`JoblineError`] in validation order.
pub fn parse_job_line(line: &str, line_number: usize) -> Result<JobRequest, JoblineError> {
    let fields: Vec<&str> = line.split(',').collect();
    let [expression, lower_text, upper_text, segments_text, threads_text] = fields.as_slice()
    else {
        return Err(JoblineError::Syntax(line_number));
    };

    let lower = parse_bound(lower_text).ok_or(JoblineError::Syntax(line_number))?;
    let upper = parse_bound(upper_text).ok_or(JoblineError::Syntax(line_number))?;
    if lower_text == upper_text || upper <= lower {
        return Err(JoblineError::UpperBound(line_number));
    }

    let segments = parse_count(segments_text).map_err(|error| match error {
        CountError::Malformed => JoblineError::Syntax(line_number),
        CountError::NotPositive => JoblineError::InvalidSegments(line_number),
    })?;
    let threads = parse_count(threads_text).map_err(|error| match error {
        CountError::Malformed => JoblineError::Syntax(line_number),
        CountError::NotPositive => JoblineError::InvalidThreads(line_number),
    })?;
    if segments % threads != 0 {
        return Err(JoblineError::IntegerMultiple(line_number));
    }

    if expression.chars().any(char::is_whitespace) {
        return Err(JoblineError::Whitespace(line_number));
    }

    Ok(JobRequest {
        expression: (*expression).to_owned(),
        lower,
        upper,
        segments,
        threads,
    })
}
