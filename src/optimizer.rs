//! Gradient descent with Armijo backtracking.
//!
//! The optimizer works on plain `f64` slices so objectives of any dimension
//! can be minimised. Objectives without an analytic gradient fall back to
//! central finite differences.

use thiserror::Error;

use crate::vlog;

/// Step used by the finite-difference gradient, scaled by `1 + |x_i|`.
pub const FINITE_DIFFERENCE_STEP: f64 = 1e-6;

/// Errors raised by [`GradientDescent::minimize`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    /// The starting point does not have the objective's dimension.
    #[error("expected a point of dimension {expected}, got {actual}")]
    DimensionMismatch {
        /// Objective dimension.
        expected: usize,
        /// Length of the supplied point.
        actual: usize,
    },
    /// The objective or its gradient produced NaN or infinity.
    #[error("objective is not finite at iteration {iteration}")]
    NonFinite {
        /// Iteration at which the value was observed.
        iteration: usize,
    },
    /// A setting is outside its valid range.
    #[error("invalid optimizer setting: {0}")]
    InvalidSetting(&'static str),
}

/// A differentiable scalar function of `dimension()` variables.
pub trait Objective {
    /// Number of variables.
    fn dimension(&self) -> usize;

    /// Function value at `x`.
    fn value(&self, x: &[f64]) -> f64;

    /// Writes the gradient at `x` into `grad`.
    ///
    /// The default implementation uses central differences.
    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        let mut probe = x.to_vec();
        for (i, slot) in grad.iter_mut().enumerate() {
            let Some(&origin) = x.get(i) else { break };
            let h = FINITE_DIFFERENCE_STEP * (1.0 + origin.abs());
            if let Some(p) = probe.get_mut(i) {
                *p = origin + h;
            }
            let forward = self.value(&probe);
            if let Some(p) = probe.get_mut(i) {
                *p = origin - h;
            }
            let backward = self.value(&probe);
            if let Some(p) = probe.get_mut(i) {
                *p = origin;
            }
            *slot = (forward - backward) / (2.0 * h);
        }
    }
}

/// Result of a minimisation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective value at `point`.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// `true` when the gradient norm fell below the tolerance.
    pub converged: bool,
}

/// Gradient descent settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent {
    /// Upper bound on iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the gradient's Euclidean norm.
    pub tolerance: f64,
    /// First step length tried by each line search.
    pub initial_step: f64,
    /// Factor applied to the step after a rejected trial, in `(0, 1)`.
    pub shrink: f64,
    /// Sufficient-decrease constant, in `(0, 1)`.
    pub armijo: f64,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-8,
            initial_step: 1.0,
            shrink: 0.5,
            armijo: 1e-4,
        }
    }
}

/// Halvings tried before the line search gives up.
const MAX_BACKTRACKS: usize = 60;

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}

impl GradientDescent {
    fn validate(&self) -> Result<(), OptimizerError> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(OptimizerError::InvalidSetting("tolerance must be finite and non-negative"));
        }
        if !(self.initial_step.is_finite() && self.initial_step > 0.0) {
            return Err(OptimizerError::InvalidSetting("initial step must be positive"));
        }
        if !(self.shrink > 0.0 && self.shrink < 1.0) {
            return Err(OptimizerError::InvalidSetting("shrink must lie in (0, 1)"));
        }
        if !(self.armijo > 0.0 && self.armijo < 1.0) {
            return Err(OptimizerError::InvalidSetting("armijo constant must lie in (0, 1)"));
        }
        Ok(())
    }

    /// Minimises `objective` starting from `start`.
    ///
    /// # Errors
    /// Returns [`OptimizerError::DimensionMismatch`] for a wrongly sized
    /// start point, [`OptimizerError::NonFinite`] when the objective or its
    /// gradient stops being finite and [`OptimizerError::InvalidSetting`]
    /// for out-of-range settings.
    ///
    /// # Examples
    /// ```
    /// use gravitas::optimizer::{GradientDescent, Objective};
    ///
    /// struct Parabola;
    /// impl Objective for Parabola {
    ///     fn dimension(&self) -> usize { 1 }
    ///     fn value(&self, x: &[f64]) -> f64 { (x[0] - 3.0).powi(2) }
    /// }
    ///
    /// let min = GradientDescent::default().minimize(&Parabola, &[0.0]).unwrap();
    /// assert!(min.converged);
    /// assert!((min.point[0] - 3.0).abs() < 1e-6);
    /// ```
    pub fn minimize<O>(&self, objective: &O, start: &[f64]) -> Result<Minimum, OptimizerError>
    where
        O: Objective + ?Sized,
    {
        self.validate()?;
        let expected = objective.dimension();
        if start.len() != expected {
            return Err(OptimizerError::DimensionMismatch {
                expected,
                actual: start.len(),
            });
        }

        let mut point = start.to_vec();
        let mut value = objective.value(&point);
        let mut grad = vec![0.0; expected];
        let mut trial = vec![0.0; expected];

        for iteration in 0..self.max_iterations {
            objective.gradient(&point, &mut grad);
            let grad_norm = norm(&grad);
            if !(value.is_finite() && grad_norm.is_finite()) {
                return Err(OptimizerError::NonFinite { iteration });
            }
            vlog!(1, "iteration {iteration}: f={value:.6e} |g|={grad_norm:.3e}");
            if grad_norm <= self.tolerance {
                return Ok(Minimum {
                    point,
                    value,
                    iterations: iteration,
                    converged: true,
                });
            }

            let slope = grad_norm * grad_norm;
            let mut step = self.initial_step;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                for ((t, p), g) in trial.iter_mut().zip(&point).zip(&grad) {
                    *t = p - step * g;
                }
                let candidate = objective.value(&trial);
                if candidate.is_finite() && candidate <= value - self.armijo * step * slope {
                    accepted = Some(candidate);
                    break;
                }
                step *= self.shrink;
            }

            let Some(candidate) = accepted else {
                vlog!(1, "line search stalled at iteration {iteration}");
                return Ok(Minimum {
                    point,
                    value,
                    iterations: iteration,
                    converged: false,
                });
            };
            std::mem::swap(&mut point, &mut trial);
            value = candidate;
        }

        Ok(Minimum {
            point,
            value,
            iterations: self.max_iterations,
            converged: false,
        })
    }
}
