//! Plain-text body of a successful integrate response.
//!
//! One `thread <i>:<low>-><high>:<total>` line per partition (verbose
//! requests only), then the integral on the last line. Numbers use the
//! shortest representation that parses back to the same `f64`.

use intcalc_engine::{IntegrationResult, PartitionProgress};

use crate::errors::ReportError;

/// Encodes `result` as a report body.
#[must_use]
pub fn encode_report(result: &IntegrationResult) -> String {
    let mut body = String::new();
    for progress in &result.progress {
        body.push_str(&format!(
            "thread {}:{}->{}:{}\n",
            progress.thread_index, progress.range_low, progress.range_high, progress.running_total
        ));
    }
    body.push_str(&format!("{}\n", result.value));
    body
}

/// Decodes a report body.
///
/// # Errors
///
/// Returns [`ReportError`] when the body is not UTF-8, is empty, or holds a
/// line that does not match the report format.
pub fn decode_report(body: &[u8]) -> Result<IntegrationResult, ReportError> {
    let text = std::str::from_utf8(body).map_err(|_| ReportError::NotUtf8)?;
    let mut lines: Vec<&str> = text.lines().collect();
    let value_line = lines.pop().ok_or(ReportError::Empty)?;
    let value = value_line
        .parse::<f64>()
        .map_err(|_| ReportError::MalformedValue {
            line: value_line.to_owned(),
        })?;
    let progress = lines
        .into_iter()
        .map(|line| {
            decode_progress(line).ok_or_else(|| ReportError::MalformedProgress {
                line: line.to_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IntegrationResult { value, progress })
}

fn decode_progress(line: &str) -> Option<PartitionProgress> {
    let rest = line.strip_prefix("thread ")?;
    let (index, rest) = rest.split_once(':')?;
    let (range, total) = rest.rsplit_once(':')?;
    let (low, high) = range.split_once("->")?;
    Some(PartitionProgress {
        thread_index: index.parse().ok()?,
        range_low: low.parse().ok()?,
        range_high: high.parse().ok()?,
        running_total: total.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use intcalc_engine::{IntegrationSpec, integrate};
    use rstest::rstest;

    use super::*;

    #[test]
    fn verbose_result_survives_encoding() {
        let spec = IntegrationSpec::new(-1.0, 0.5, 30, 3).with_verbose(true);
        let result = integrate("x*x-1", &spec).expect("integrate");
        let decoded = decode_report(encode_report(&result).as_bytes()).expect("decode");
        assert_eq!(decoded, result);
    }

    #[test]
    fn plain_result_is_a_single_line() {
        let result = IntegrationResult {
            value: 0.5,
            progress: Vec::new(),
        };
        assert_eq!(encode_report(&result), "0.5\n");
    }

    #[test]
    fn negative_ranges_split_on_arrow() {
        let decoded = decode_report(b"thread 1:-2->-1.5:-0.25\n-0.25\n").expect("decode");
        assert_eq!(
            decoded.progress,
            vec![PartitionProgress {
                thread_index: 1,
                range_low: -2.0,
                range_high: -1.5,
                running_total: -0.25,
            }]
        );
    }

    #[rstest]
    #[case(b"" as &[u8])]
    #[case(b"zero\n")]
    #[case(b"thread one:0->1:1\n1\n")]
    #[case(b"thread 1:0-1:1\n1\n")]
    #[case(b"\xff\n")]
    fn rejects_malformed_bodies(#[case] body: &[u8]) {
        assert!(decode_report(body).is_err());
    }
}
