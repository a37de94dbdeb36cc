//! Composite trapezoidal rule over equal partitions on scoped threads.

use std::thread;

use tracing::debug;

use crate::errors::IntegrationError;
use crate::expression::Expression;

const INTEGRATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::integrator");

/// Parameters of one integration job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationSpec {
    /// Lower bound of the interval.
    pub lower: f64,
    /// Upper bound of the interval; must exceed `lower`.
    pub upper: f64,
    /// Total number of trapezoid steps across the interval.
    pub segments: u64,
    /// Number of partitions, one worker thread each.
    pub threads: u64,
    /// Whether per-partition progress is recorded.
    pub verbose: bool,
}

impl IntegrationSpec {
    /// Builds a non-verbose specification.
    #[must_use]
    pub const fn new(lower: f64, upper: f64, segments: u64, threads: u64) -> Self {
        Self {
            lower,
            upper,
            segments,
            threads,
            verbose: false,
        }
    }

    /// Enables or disables progress recording.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the invariants every job must satisfy before any work starts.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant, checked in the order bounds,
    /// segments, threads, divisibility.
    pub fn validate(&self) -> Result<(), IntegrationError> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(IntegrationError::NonFiniteBounds);
        }
        if self.upper <= self.lower {
            return Err(IntegrationError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
            });
        }
        if self.segments == 0 {
            return Err(IntegrationError::ZeroSegments);
        }
        if self.threads == 0 {
            return Err(IntegrationError::ZeroThreads);
        }
        if self.segments % self.threads != 0 {
            return Err(IntegrationError::UnevenPartition {
                segments: self.segments,
                threads: self.threads,
            });
        }
        Ok(())
    }

    fn step(&self) -> f64 {
        (self.upper - self.lower) / self.segments as f64
    }

    /// Abscissa of global node `index` in `0..=segments`.
    ///
    /// The last node is pinned to `upper` so adjacent partitions share exact
    /// endpoints and the final range ends on the bound.
    fn node(&self, index: u64) -> f64 {
        if index == self.segments {
            self.upper
        } else {
            self.lower + index as f64 * self.step()
        }
    }
}

/// One partition's contribution, reported in partition order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionProgress {
    /// One-based partition index.
    pub thread_index: u64,
    /// Start of the partition's sub-interval.
    pub range_low: f64,
    /// End of the partition's sub-interval.
    pub range_high: f64,
    /// Sum of this and every lower-indexed partition's subtotal.
    pub running_total: f64,
}

/// Outcome of an integration.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationResult {
    /// Approximate definite integral.
    pub value: f64,
    /// Per-partition progress in ascending index order; empty unless the
    /// specification was verbose.
    pub progress: Vec<PartitionProgress>,
}

/// Trapezoidal integrator bound to a compiled expression.
#[derive(Debug, Clone, Copy)]
pub struct TrapezoidalIntegrator<'e> {
    expression: &'e Expression,
}

impl<'e> TrapezoidalIntegrator<'e> {
    /// Wraps a compiled expression.
    #[must_use]
    pub const fn new(expression: &'e Expression) -> Self {
        Self { expression }
    }

    /// Integrates over `spec`, running one scoped worker per partition.
    ///
    /// Every worker computes a local subtotal from the same global node
    /// positions, so the result depends only on the segment count and not
    /// on how the interval was partitioned or scheduled. Subtotals are
    /// summed in partition order once every worker has joined.
    ///
    /// # Errors
    ///
    /// Returns an [`IntegrationError`] when `spec` is invalid, a worker
    /// cannot be spawned, or a worker panics.
    pub fn run(&self, spec: &IntegrationSpec) -> Result<IntegrationResult, IntegrationError> {
        spec.validate()?;
        let per_partition = spec.segments / spec.threads;
        debug!(
            target: INTEGRATOR_TARGET,
            expression = self.expression.source(),
            lower = spec.lower,
            upper = spec.upper,
            segments = spec.segments,
            threads = spec.threads,
            "starting integration"
        );

        let subtotals = thread::scope(|scope| {
            let mut handles = Vec::new();
            for partition in 0..spec.threads {
                let first = partition * per_partition;
                let handle = thread::Builder::new()
                    .name(format!("partition-{}", partition + 1))
                    .spawn_scoped(scope, move || {
                        self.partition_sum(spec, first, first + per_partition)
                    })
                    .map_err(|source| IntegrationError::Spawn {
                        partition: partition + 1,
                        source,
                    })?;
                handles.push(handle);
            }

            let mut subtotals = Vec::with_capacity(handles.len());
            for (partition, handle) in (1..).zip(handles) {
                let subtotal = handle
                    .join()
                    .map_err(|_| IntegrationError::WorkerPanicked { partition })?;
                subtotals.push(subtotal);
            }
            Ok::<_, IntegrationError>(subtotals)
        })?;

        Ok(reduce(spec, per_partition, &subtotals))
    }

    /// Trapezoid sum over global nodes `first..=last`.
    fn partition_sum(&self, spec: &IntegrationSpec, first: u64, last: u64) -> f64 {
        let f = |index| self.expression.evaluate(spec.node(index));
        let interior: f64 = (first + 1..last).map(f).sum();
        spec.step() * ((f(first) + f(last)) / 2.0 + interior)
    }
}

fn reduce(spec: &IntegrationSpec, per_partition: u64, subtotals: &[f64]) -> IntegrationResult {
    let mut value = 0.0;
    let mut progress = Vec::new();
    for (partition, subtotal) in (0..).zip(subtotals) {
        value += subtotal;
        if spec.verbose {
            progress.push(PartitionProgress {
                thread_index: partition + 1,
                range_low: spec.node(partition * per_partition),
                range_high: spec.node((partition + 1) * per_partition),
                running_total: value,
            });
        }
    }
    debug!(target: INTEGRATOR_TARGET, value, "integration finished");
    IntegrationResult { value, progress }
}

/// Compiles `source` and integrates it over `spec`.
///
/// # Errors
///
/// Returns [`IntegrationError::Compile`] when the expression does not
/// compile, otherwise the errors of [`TrapezoidalIntegrator::run`].
pub fn integrate(source: &str, spec: &IntegrationSpec) -> Result<IntegrationResult, IntegrationError> {
    let expression = Expression::compile(source)?;
    TrapezoidalIntegrator::new(&expression).run(spec)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::approx_eq;

    #[fixture]
    fn square() -> Expression {
        Expression::compile("x*x").expect("compile")
    }

    #[test]
    fn integrates_identity_over_unit_interval() {
        let result = integrate("x", &IntegrationSpec::new(0.0, 1.0, 10, 2)).expect("integrate");
        assert!(approx_eq(result.value, 0.5), "got {}", result.value);
        assert!(result.progress.is_empty());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    #[case(6)]
    #[case(12)]
    fn result_is_independent_of_thread_count(square: Expression, #[case] threads: u64) {
        let integrator = TrapezoidalIntegrator::new(&square);
        let baseline = integrator
            .run(&IntegrationSpec::new(-1.0, 2.0, 1200, 1))
            .expect("baseline");
        let split = integrator
            .run(&IntegrationSpec::new(-1.0, 2.0, 1200, threads))
            .expect("split");
        assert!(
            approx_eq(baseline.value, split.value),
            "{} vs {}",
            baseline.value,
            split.value
        );
    }

    #[rstest]
    fn repeated_runs_agree(square: Expression) {
        let spec = IntegrationSpec::new(0.0, 3.0, 900, 9);
        let integrator = TrapezoidalIntegrator::new(&square);
        let first = integrator.run(&spec).expect("first");
        for _ in 0..5 {
            let again = integrator.run(&spec).expect("again");
            assert_eq!(first.value.to_bits(), again.value.to_bits());
        }
    }

    #[rstest]
    fn progress_tiles_interval_in_order(square: Expression) {
        let spec = IntegrationSpec::new(-2.0, 5.0, 70, 7).with_verbose(true);
        let result = TrapezoidalIntegrator::new(&square).run(&spec).expect("run");

        let indices: Vec<u64> = result.progress.iter().map(|p| p.thread_index).collect();
        assert_eq!(indices, (1..=7).collect::<Vec<_>>());

        let first = result.progress.first().expect("first partition");
        let last = result.progress.last().expect("last partition");
        assert_eq!(first.range_low, -2.0);
        assert_eq!(last.range_high, 5.0);
        for pair in result.progress.windows(2) {
            assert_eq!(pair[0].range_high, pair[1].range_low);
            assert!(pair[0].range_low < pair[0].range_high);
            assert!(pair[0].running_total <= pair[1].running_total);
        }
        assert_eq!(last.running_total, result.value);
    }

    #[test]
    fn trapezoid_rule_is_exact_for_linear_functions() {
        let result = integrate("3*x+1", &IntegrationSpec::new(1.0, 4.0, 3, 3)).expect("integrate");
        assert!(approx_eq(result.value, 25.5), "got {}", result.value);
    }

    #[rstest]
    #[case(IntegrationSpec::new(5.0, 5.0, 10, 2))]
    #[case(IntegrationSpec::new(1.0, 0.0, 10, 2))]
    #[case(IntegrationSpec::new(0.0, f64::INFINITY, 10, 2))]
    #[case(IntegrationSpec::new(0.0, 1.0, 0, 1))]
    #[case(IntegrationSpec::new(0.0, 1.0, 10, 0))]
    #[case(IntegrationSpec::new(0.0, 1.0, 10, 3))]
    fn rejects_invalid_specifications(#[case] spec: IntegrationSpec) {
        assert!(integrate("x", &spec).is_err());
    }

    #[test]
    fn uneven_partition_names_both_counts() {
        let error = integrate("x", &IntegrationSpec::new(0.0, 1.0, 10, 3)).expect_err("uneven");
        assert!(matches!(
            error,
            IntegrationError::UnevenPartition {
                segments: 10,
                threads: 3
            }
        ));
    }

    #[test]
    fn compile_failure_is_reported() {
        let error = integrate("y", &IntegrationSpec::new(0.0, 1.0, 10, 2)).expect_err("compile");
        assert!(matches!(error, IntegrationError::Compile(_)));
    }
}
