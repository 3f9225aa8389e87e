//! Integration tests for the point-mass model and the optimizer.

use approx::assert_relative_eq;
use glam::DVec3;
use gravitas::model3d::{Model3d, ModelError};
use gravitas::optimizer::{GradientDescent, Objective, OptimizerError};
use gravitas::{GravityVector, STANDARD_GRAVITY};
use rstest::{fixture, rstest};
use test_utils::assert_dvec3_close;

#[fixture]
fn dropped_ball() -> Model3d {
    let mut model = Model3d::new();
    model
        .add_body(1.5, DVec3::new(0.0, 0.0, 100.0), DVec3::ZERO)
        .expect("valid body");
    model
}

#[rstest]
fn ball_falls_under_standard_gravity(mut dropped_ball: Model3d) {
    let dt = 1e-3;
    let steps = 1_000;
    dropped_ball
        .advance(steps, dt, GravityVector::standard())
        .expect("advance");
    let body = dropped_ball.bodies().first().expect("one body");
    let t = dt * 1_000.0;
    assert_relative_eq!(dropped_ball.time(), t, epsilon = 1e-9);
    assert_relative_eq!(body.velocity.z, -STANDARD_GRAVITY * t, epsilon = 1e-9);
    // Semi-implicit Euler lands within one step's worth of the closed form.
    let closed_form = 100.0 - 0.5 * STANDARD_GRAVITY * t * t;
    assert_relative_eq!(body.position.z, closed_form, epsilon = STANDARD_GRAVITY * t * dt);
}

#[rstest]
fn zero_gravity_keeps_ball_still(mut dropped_ball: Model3d) {
    dropped_ball
        .advance(50, 0.1, GravityVector::ZERO)
        .expect("advance");
    let body = dropped_ball.bodies().first().expect("one body");
    assert_dvec3_close(body.position, DVec3::new(0.0, 0.0, 100.0), 1e-12);
    assert_dvec3_close(body.velocity, DVec3::ZERO, 1e-12);
}

#[rstest]
#[case(0.0)]
#[case(-0.5)]
#[case(f64::NAN)]
fn invalid_steps_leave_model_unchanged(mut dropped_ball: Model3d, #[case] dt: f64) {
    let before = dropped_ball.clone();
    assert!(matches!(
        dropped_ball.step(dt, GravityVector::standard()),
        Err(ModelError::InvalidTimeStep(_))
    ));
    assert_eq!(dropped_ball.bodies(), before.bodies());
    assert_relative_eq!(dropped_ball.time(), before.time());
}

#[rstest]
fn mechanical_energy_is_nearly_conserved(mut dropped_ball: Model3d) {
    let g = GravityVector::standard();
    let start = dropped_ball.kinetic_energy() + dropped_ball.potential_energy(g);
    dropped_ball.advance(2_000, 1e-3, g).expect("advance");
    let end = dropped_ball.kinetic_energy() + dropped_ball.potential_energy(g);
    assert_relative_eq!(start, end, max_relative = 1e-3);
}

/// `(x + y - 3)² + 10 (x - y - 1)²`, minimised at `(2, 1)`.
struct TiltedValley;

impl Objective for TiltedValley {
    fn dimension(&self) -> usize {
        2
    }

    fn value(&self, x: &[f64]) -> f64 {
        let (a, b) = (x.first().copied().unwrap_or(0.0), x.get(1).copied().unwrap_or(0.0));
        (a + b - 3.0).powi(2) + 10.0 * (a - b - 1.0).powi(2)
    }
}

#[test]
fn tilted_valley_converges_with_numeric_gradient() {
    let result = GradientDescent::default()
        .minimize(&TiltedValley, &[-4.0, 7.5])
        .expect("minimize");
    assert!(result.converged, "{result:?}");
    assert_relative_eq!(result.point.first().copied().unwrap_or(0.0), 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.point.get(1).copied().unwrap_or(0.0), 1.0, epsilon = 1e-6);
    assert!(result.value < 1e-12, "{result:?}");
}

#[test]
fn iteration_budget_is_respected() {
    let optimizer = GradientDescent {
        max_iterations: 3,
        ..GradientDescent::default()
    };
    let result = optimizer
        .minimize(&TiltedValley, &[-4.0, 7.5])
        .expect("minimize");
    assert!(!result.converged);
    assert!(result.iterations <= 3);
}

#[test]
fn wrong_start_length_is_rejected() {
    let err = GradientDescent::default()
        .minimize(&TiltedValley, &[0.0])
        .expect_err("dimension mismatch");
    assert!(matches!(
        err,
        OptimizerError::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    ));
}
