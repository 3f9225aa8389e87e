//! Numerical constants shared by the model, the optimizer and the suites.

/// Standard gravitational acceleration in metres per second squared.
pub const STANDARD_GRAVITY: f64 = 9.806_65;
/// Smallest acceptable mass to avoid numerically unstable accelerations.
pub const MIN_MASS: f64 = 1e-12;
/// Mass used when a body is created without an explicit value.
pub const DEFAULT_MASS: f64 = 1.0;
/// Default integration step for model tests, in seconds.
pub const DEFAULT_TIME_STEP: f64 = 0.01;
/// Tolerance used by the suites when comparing floating point results.
pub const CHECK_TOLERANCE: f64 = 1e-6;
