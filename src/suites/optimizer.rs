//! Behavioural checks for [`crate::optimizer::GradientDescent`].

use anyhow::{ensure, Context};
use glam::DVec3;

use crate::environment::{GravityVector, TestContext};
use crate::model3d::Model3d;
use crate::optimizer::{GradientDescent, Objective, OptimizerError};
use crate::registry::{CheckResult, RegistryError, TestSuiteRegistry};
use crate::{CHECK_TOLERANCE, DEFAULT_MASS, DEFAULT_TIME_STEP};

/// Suite name used in reports and filters.
pub const SUITE: &str = "Optimizer";

/// Adds the optimizer cases to `registry`.
///
/// # Errors
/// Returns [`RegistryError`] if a case is already registered.
pub fn register(registry: &mut TestSuiteRegistry) -> Result<(), RegistryError> {
    registry.register(SUITE, "quadratic_bowl_converges", quadratic_bowl_converges)?;
    registry.register(SUITE, "anisotropic_quadratic_converges", anisotropic_quadratic_converges)?;
    registry.register(SUITE, "finite_difference_matches_gradient", finite_difference_matches_gradient)?;
    registry.register(SUITE, "dimension_mismatch_is_reported", dimension_mismatch_is_reported)?;
    registry.register(SUITE, "launch_speed_fit_under_gravity", launch_speed_fit_under_gravity)?;
    Ok(())
}

/// `Σ (x_i - c_i)²` with the default finite-difference gradient.
struct Bowl {
    centre: Vec<f64>,
}

impl Objective for Bowl {
    fn dimension(&self) -> usize {
        self.centre.len()
    }

    fn value(&self, x: &[f64]) -> f64 {
        x.iter().zip(&self.centre).map(|(a, c)| (a - c).powi(2)).sum()
    }
}

/// `½ Σ w_i x_i²` with an analytic gradient.
struct Anisotropic {
    weights: Vec<f64>,
}

impl Objective for Anisotropic {
    fn dimension(&self) -> usize {
        self.weights.len()
    }

    fn value(&self, x: &[f64]) -> f64 {
        0.5 * x.iter().zip(&self.weights).map(|(a, w)| w * a * a).sum::<f64>()
    }

    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        for ((g, a), w) in grad.iter_mut().zip(x).zip(&self.weights) {
            *g = w * a;
        }
    }
}

/// Squared miss distance of a vertical launch after a fixed flight time.
struct LaunchFit {
    gravity: GravityVector,
    steps: usize,
    target_height: f64,
}

impl LaunchFit {
    fn height_after_flight(&self, speed: f64) -> Option<f64> {
        let mut model = Model3d::new();
        model
            .add_body(DEFAULT_MASS, DVec3::ZERO, DVec3::new(0.0, 0.0, speed))
            .ok()?;
        model
            .advance(self.steps, DEFAULT_TIME_STEP, self.gravity)
            .ok()?;
        model.bodies().first().map(|b| b.position.z)
    }
}

impl Objective for LaunchFit {
    fn dimension(&self) -> usize {
        1
    }

    fn value(&self, x: &[f64]) -> f64 {
        x.first()
            .and_then(|speed| self.height_after_flight(*speed))
            .map_or(f64::NAN, |z| (z - self.target_height).powi(2))
    }
}

fn point_close(found: &[f64], expected: &[f64], tolerance: f64) -> bool {
    found.len() == expected.len()
        && found
            .iter()
            .zip(expected)
            .all(|(a, b)| (a - b).abs() <= tolerance)
}

fn quadratic_bowl_converges(_: &mut TestContext) -> CheckResult {
    let bowl = Bowl {
        centre: vec![1.5, -0.5, 2.0],
    };
    let min = GradientDescent::default().minimize(&bowl, &[0.0; 3])?;
    ensure!(min.converged, "stopped after {} iterations", min.iterations);
    ensure!(
        point_close(&min.point, &bowl.centre, CHECK_TOLERANCE),
        "found {:?}",
        min.point
    );
    Ok(())
}

fn anisotropic_quadratic_converges(_: &mut TestContext) -> CheckResult {
    let objective = Anisotropic {
        weights: vec![1.0, 25.0],
    };
    let min = GradientDescent::default().minimize(&objective, &[3.0, -2.0])?;
    ensure!(min.converged, "stopped after {} iterations", min.iterations);
    ensure!(
        point_close(&min.point, &[0.0, 0.0], CHECK_TOLERANCE),
        "found {:?}",
        min.point
    );
    ensure!(min.value <= CHECK_TOLERANCE, "value {} too large", min.value);
    Ok(())
}

/// Objective that only has the finite-difference gradient.
struct NumericAnisotropic<'a>(&'a Anisotropic);

impl Objective for NumericAnisotropic<'_> {
    fn dimension(&self) -> usize {
        self.0.dimension()
    }

    fn value(&self, x: &[f64]) -> f64 {
        self.0.value(x)
    }
}

fn finite_difference_matches_gradient(_: &mut TestContext) -> CheckResult {
    let analytic = Anisotropic {
        weights: vec![2.0, 0.5, 7.0],
    };
    let x = [0.3, -1.2, 4.0];
    let mut expected = [0.0; 3];
    let mut numeric = [0.0; 3];
    analytic.gradient(&x, &mut expected);
    NumericAnisotropic(&analytic).gradient(&x, &mut numeric);
    ensure!(
        point_close(&numeric, &expected, 1e-5),
        "numeric {numeric:?} vs analytic {expected:?}"
    );
    Ok(())
}

fn dimension_mismatch_is_reported(_: &mut TestContext) -> CheckResult {
    let bowl = Bowl {
        centre: vec![0.0, 0.0],
    };
    let result = GradientDescent::default().minimize(&bowl, &[1.0]);
    ensure!(
        result
            == Err(OptimizerError::DimensionMismatch {
                expected: 2,
                actual: 1
            }),
        "unexpected result {result:?}"
    );
    Ok(())
}

/// Fits the launch speed that reaches a target height after one second of
/// flight in standard gravity.
#[expect(
    clippy::cast_precision_loss,
    reason = "Step counts in the checks are far below 2^52."
)]
fn launch_speed_fit_under_gravity(ctx: &mut TestContext) -> CheckResult {
    ctx.gravity = GravityVector::standard();
    let fit = LaunchFit {
        gravity: ctx.gravity,
        steps: 100,
        target_height: 5.0,
    };
    let min = GradientDescent::default().minimize(&fit, &[0.0])?;
    ensure!(min.converged, "stopped after {} iterations", min.iterations);
    let speed = *min.point.first().context("empty result point")?;

    let n = fit.steps as f64;
    let g = ctx.gravity.as_dvec3().z;
    let expected = (fit.target_height - g * DEFAULT_TIME_STEP * DEFAULT_TIME_STEP * n * (n + 1.0) / 2.0)
        / (n * DEFAULT_TIME_STEP);
    ensure!(
        (speed - expected).abs() <= 1e-4,
        "fitted speed {speed}, expected {expected}"
    );
    let height = fit
        .height_after_flight(speed)
        .context("simulating fitted launch")?;
    ensure!(
        (height - fit.target_height).abs() <= 1e-4,
        "reached {height} instead of {}",
        fit.target_height
    );
    Ok(())
}
