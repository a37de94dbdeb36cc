//! User-facing result lines.

use std::io::{self, Write};

use intcalc_engine::IntegrationResult;

use crate::jobline::JobRequest;

/// Writes the progress lines (if any) and the result line for `job`.
pub(crate) fn write_result<W: Write>(
    out: &mut W,
    job: &JobRequest,
    result: &IntegrationResult,
) -> io::Result<()> {
    for progress in &result.progress {
        writeln!(
            out,
            "thread {}:{:.6}->{:.6}:{:.6}",
            progress.thread_index, progress.range_low, progress.range_high, progress.running_total
        )?;
    }
    writeln!(
        out,
        "The integral of {} from {:.6} to {:.6} is {:.6}",
        job.expression, job.lower, job.upper, result.value
    )?;
    out.flush()
}
