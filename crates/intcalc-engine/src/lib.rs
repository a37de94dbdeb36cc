//! Numeric core shared by the integration client and server.
//!
//! The crate has two halves:
//!
//! - [`Expression`] compiles a single-variable real expression (the variable is
//!   always `x`) into an immutable tree that can be evaluated from any number
//!   of threads at once.
//! - [`TrapezoidalIntegrator`] applies the composite trapezoidal rule to a
//!   compiled expression, splitting the interval into one partition per
//!   requested thread. Partitions run on scoped worker threads and their
//!   subtotals are reduced in partition order after every worker has joined,
//!   so the result does not depend on scheduling.
//!
//! ```
//! use intcalc_engine::{IntegrationSpec, integrate};
//!
//! let spec = IntegrationSpec::new(0.0, 1.0, 10, 2);
//! let result = integrate("x", &spec).expect("integrates");
//! assert!((result.value - 0.5).abs() < 1e-12);
//! ```

mod errors;
mod expression;
mod integrator;

pub use errors::{ExpressionError, IntegrationError};
pub use expression::Expression;
pub use integrator::{
    IntegrationResult, IntegrationSpec, PartitionProgress, TrapezoidalIntegrator, integrate,
};

/// Name of the single integration variable accepted by [`Expression`].
pub const VARIABLE_NAME: &str = "x";

/// Relative tolerance within which results for different thread counts agree.
pub const RESULT_TOLERANCE: f64 = 1e-9;

/// Returns `true` when `left` and `right` agree to within
/// [`RESULT_TOLERANCE`], relative to the larger magnitude.
#[must_use]
pub fn approx_eq(left: f64, right: f64) -> bool {
    let scale = left.abs().max(right.abs()).max(1.0);
    (left - right).abs() <= RESULT_TOLERANCE * scale
}
