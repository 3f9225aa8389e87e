//! Behavioural checks for [`crate::model3d::Model3d`].

use anyhow::{ensure, Context};
use glam::DVec3;

use crate::environment::{GravityVector, TestContext};
use crate::model3d::{Model3d, ModelError};
use crate::registry::{CheckResult, RegistryError, TestSuiteRegistry};
use crate::{applied_acceleration, CHECK_TOLERANCE, DEFAULT_MASS, DEFAULT_TIME_STEP};

/// Suite name used in reports and filters.
pub const SUITE: &str = "Model3d";

/// Adds the model cases to `registry`.
///
/// # Errors
/// Returns [`RegistryError`] if a case is already registered.
pub fn register(registry: &mut TestSuiteRegistry) -> Result<(), RegistryError> {
    registry.register(SUITE, "free_fall_matches_closed_form", free_fall_matches_closed_form)?;
    registry.register(SUITE, "gravity_defaults_to_zero", gravity_defaults_to_zero)?;
    registry.register(SUITE, "zero_gravity_preserves_velocity", zero_gravity_preserves_velocity)?;
    registry.register(SUITE, "force_scales_inversely_with_mass", force_scales_inversely_with_mass)?;
    registry.register(SUITE, "rejects_non_positive_mass", rejects_non_positive_mass)?;
    registry.register(SUITE, "rejects_invalid_time_step", rejects_invalid_time_step)?;
    registry.register(SUITE, "center_of_mass_is_mass_weighted", center_of_mass_is_mass_weighted)?;
    registry.register(SUITE, "energy_drift_matches_integrator", energy_drift_matches_integrator)?;
    Ok(())
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= CHECK_TOLERANCE * (1.0 + expected.abs())
}

fn single_body(position: DVec3, velocity: DVec3) -> anyhow::Result<Model3d> {
    let mut model = Model3d::new();
    model
        .add_body(DEFAULT_MASS, position, velocity)
        .context("adding test body")?;
    Ok(model)
}

fn first_body(model: &Model3d) -> anyhow::Result<(DVec3, DVec3)> {
    let body = model.bodies().first().context("model has no bodies")?;
    Ok((body.position, body.velocity))
}

/// Semi-implicit Euler height after `n` steps from `z0` with speed `v0`.
#[expect(
    clippy::cast_precision_loss,
    reason = "Step counts in the checks are far below 2^52."
)]
fn semi_implicit_height(z0: f64, v0: f64, g: f64, dt: f64, steps: usize) -> f64 {
    let n = steps as f64;
    z0 + v0 * n * dt + g * dt * dt * n * (n + 1.0) / 2.0
}

fn free_fall_matches_closed_form(ctx: &mut TestContext) -> CheckResult {
    ctx.gravity = GravityVector::standard();
    let steps = 100;
    let mut model = single_body(DVec3::new(0.0, 0.0, 10.0), DVec3::new(0.0, 0.0, 1.0))?;
    model.advance(steps, DEFAULT_TIME_STEP, ctx.gravity)?;

    let (position, velocity) = first_body(&model)?;
    let g = ctx.gravity.as_dvec3().z;
    let expected = semi_implicit_height(10.0, 1.0, g, DEFAULT_TIME_STEP, steps);
    ensure!(
        close(position.z, expected),
        "expected z {expected}, got {}",
        position.z
    );
    ensure!(
        close(velocity.z, 1.0 + g * DEFAULT_TIME_STEP * 100.0),
        "unexpected vz {}",
        velocity.z
    );
    ensure!(position.x == 0.0 && position.y == 0.0, "fall drifted sideways");
    Ok(())
}

fn gravity_defaults_to_zero(ctx: &mut TestContext) -> CheckResult {
    ensure!(
        ctx.gravity.is_zero(),
        "case started with gravity {:?}",
        ctx.gravity
    );
    Ok(())
}

fn zero_gravity_preserves_velocity(ctx: &mut TestContext) -> CheckResult {
    let velocity = DVec3::new(1.0, -2.0, 0.5);
    let mut model = single_body(DVec3::ZERO, velocity)?;
    model.advance(50, DEFAULT_TIME_STEP, ctx.gravity)?;

    let (position, final_velocity) = first_body(&model)?;
    ensure!(final_velocity == velocity, "velocity changed to {final_velocity}");
    let expected = velocity * 50.0 * DEFAULT_TIME_STEP;
    ensure!(
        position.abs_diff_eq(expected, CHECK_TOLERANCE),
        "expected {expected}, got {position}"
    );
    Ok(())
}

fn force_scales_inversely_with_mass(_: &mut TestContext) -> CheckResult {
    let force = DVec3::new(6.0, 0.0, -3.0);
    let light = applied_acceleration(force, 1.0).context("light body")?;
    let heavy = applied_acceleration(force, 3.0).context("heavy body")?;
    ensure!(
        light.abs_diff_eq(heavy * 3.0, CHECK_TOLERANCE),
        "{light} is not three times {heavy}"
    );
    ensure!(applied_acceleration(force, 0.0).is_none(), "zero mass accepted");
    Ok(())
}

fn rejects_non_positive_mass(_: &mut TestContext) -> CheckResult {
    let mut model = Model3d::new();
    for mass in [0.0, -1.0, f64::NAN] {
        let result = model.add_body(mass, DVec3::ZERO, DVec3::ZERO);
        ensure!(
            matches!(result, Err(ModelError::InvalidMass(_))),
            "mass {mass} was accepted"
        );
    }
    ensure!(model.bodies().is_empty(), "rejected bodies were stored");
    Ok(())
}

fn rejects_invalid_time_step(ctx: &mut TestContext) -> CheckResult {
    let mut model = single_body(DVec3::ZERO, DVec3::ZERO)?;
    for dt in [0.0, -DEFAULT_TIME_STEP, f64::INFINITY] {
        ensure!(
            model.step(dt, ctx.gravity) == Err(ModelError::InvalidTimeStep(dt)),
            "time step {dt} was accepted"
        );
    }
    ensure!(model.time() == 0.0, "failed steps advanced the clock");
    Ok(())
}

fn center_of_mass_is_mass_weighted(_: &mut TestContext) -> CheckResult {
    let mut model = Model3d::new();
    model.add_body(1.0, DVec3::new(0.0, 0.0, 0.0), DVec3::ZERO)?;
    model.add_body(3.0, DVec3::new(4.0, 0.0, 8.0), DVec3::ZERO)?;
    let centre = model.center_of_mass().context("model has bodies")?;
    let expected = DVec3::new(3.0, 0.0, 6.0);
    ensure!(
        centre.abs_diff_eq(expected, CHECK_TOLERANCE),
        "expected {expected}, got {centre}"
    );
    Ok(())
}

/// Semi-implicit Euler loses `m g² dt² n / 2` of energy in free fall.
#[expect(
    clippy::cast_precision_loss,
    reason = "Step counts in the checks are far below 2^52."
)]
fn energy_drift_matches_integrator(ctx: &mut TestContext) -> CheckResult {
    ctx.gravity = GravityVector::standard();
    let steps = 200;
    let mut model = single_body(DVec3::new(0.0, 0.0, 50.0), DVec3::ZERO)?;
    let energy = |m: &Model3d| m.kinetic_energy() + m.potential_energy(ctx.gravity);
    let before = energy(&model);
    model.advance(steps, DEFAULT_TIME_STEP, ctx.gravity)?;
    let drift = energy(&model) - before;

    let g = ctx.gravity.as_dvec3().length();
    let expected = -DEFAULT_MASS * g * g * DEFAULT_TIME_STEP * DEFAULT_TIME_STEP * steps as f64 / 2.0;
    ensure!(close(drift, expected), "energy drift {drift}, expected {expected}");
    Ok(())
}
