//! Point-mass 3D model integrated under gravity.
//!
//! Bodies accumulate forces between steps. [`Model3d::step`] applies
//! semi-implicit Euler integration: velocity is updated first from gravity
//! plus accumulated force, then position from the new velocity. Forces are
//! cleared after every step.

use glam::DVec3;
use thiserror::Error;

use crate::environment::GravityVector;
use crate::physics::applied_acceleration;
use crate::vlog;

/// Errors raised by [`Model3d`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ModelError {
    /// Mass must be finite and larger than [`crate::MIN_MASS`].
    #[error("invalid body mass {0}")]
    InvalidMass(f64),
    /// Time steps must be finite and positive.
    #[error("invalid time step {0}")]
    InvalidTimeStep(f64),
    /// No body has the given identifier.
    #[error("unknown body {0:?}")]
    UnknownBody(BodyId),
    /// A position or velocity component was NaN or infinite.
    #[error("non-finite state for body {0:?}")]
    NonFiniteState(BodyId),
}

/// Identifier of a body inside one [`Model3d`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(usize);

/// A point mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Mass in kilograms.
    pub mass: f64,
    /// Position in metres.
    pub position: DVec3,
    /// Velocity in metres per second.
    pub velocity: DVec3,
    force: DVec3,
}

impl Body {
    /// Force accumulated since the last step.
    #[must_use]
    pub const fn pending_force(&self) -> DVec3 {
        self.force
    }
}

/// A collection of independent point masses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model3d {
    bodies: Vec<Body>,
    time: f64,
}

impl Model3d {
    /// Creates an empty model at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body and returns its identifier.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidMass`] when `mass` cannot produce a
    /// finite acceleration.
    ///
    /// # Examples
    /// ```
    /// use glam::DVec3;
    /// use gravitas::model3d::Model3d;
    /// let mut model = Model3d::new();
    /// let id = model.add_body(2.0, DVec3::ZERO, DVec3::X).unwrap();
    /// assert_eq!(model.body(id).unwrap().mass, 2.0);
    /// assert!(model.add_body(0.0, DVec3::ZERO, DVec3::ZERO).is_err());
    /// ```
    pub fn add_body(
        &mut self,
        mass: f64,
        position: DVec3,
        velocity: DVec3,
    ) -> Result<BodyId, ModelError> {
        if applied_acceleration(DVec3::ZERO, mass).is_none() {
            return Err(ModelError::InvalidMass(mass));
        }
        let id = BodyId(self.bodies.len());
        self.bodies.push(Body {
            mass,
            position,
            velocity,
            force: DVec3::ZERO,
        });
        Ok(id)
    }

    /// Returns the body with `id`.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    /// All bodies in insertion order.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Simulated time elapsed so far.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Adds `force` to the body's accumulator for the next step.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownBody`] for an identifier from another
    /// model.
    pub fn apply_force(&mut self, id: BodyId, force: DVec3) -> Result<(), ModelError> {
        let body = self
            .bodies
            .get_mut(id.0)
            .ok_or(ModelError::UnknownBody(id))?;
        body.force += force;
        Ok(())
    }

    /// Advances every body by `dt` seconds under `gravity`.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidTimeStep`] for a non-positive or
    /// non-finite `dt` and [`ModelError::NonFiniteState`] if integration
    /// produced NaN or infinite values. The model is left unchanged on error.
    pub fn step(&mut self, dt: f64, gravity: GravityVector) -> Result<(), ModelError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ModelError::InvalidTimeStep(dt));
        }
        let g = gravity.as_dvec3();
        let mut next = self.bodies.clone();
        for (index, body) in next.iter_mut().enumerate() {
            let id = BodyId(index);
            let forced = applied_acceleration(body.force, body.mass)
                .ok_or(ModelError::InvalidMass(body.mass))?;
            body.velocity += (g + forced) * dt;
            body.position += body.velocity * dt;
            body.force = DVec3::ZERO;
            if !(body.position.is_finite() && body.velocity.is_finite()) {
                return Err(ModelError::NonFiniteState(id));
            }
        }
        self.bodies = next;
        self.time += dt;
        vlog!(2, "model stepped to t={:.6} with {} bodies", self.time, self.bodies.len());
        Ok(())
    }

    /// Runs `steps` consecutive steps of `dt`.
    ///
    /// # Errors
    /// Stops at and returns the first failing step's error.
    pub fn advance(
        &mut self,
        steps: usize,
        dt: f64,
        gravity: GravityVector,
    ) -> Result<(), ModelError> {
        for _ in 0..steps {
            self.step(dt, gravity)?;
        }
        Ok(())
    }

    /// Mass-weighted centre of all bodies, `None` for an empty model.
    #[must_use]
    pub fn center_of_mass(&self) -> Option<DVec3> {
        let total: f64 = self.bodies.iter().map(|b| b.mass).sum();
        if self.bodies.is_empty() || total <= 0.0 {
            return None;
        }
        let weighted = self
            .bodies
            .iter()
            .fold(DVec3::ZERO, |acc, b| acc + b.position * b.mass);
        Some(weighted / total)
    }

    /// Total kinetic energy `Σ ½ m |v|²`.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .map(|b| 0.5 * b.mass * b.velocity.length_squared())
            .sum()
    }

    /// Gravitational potential energy `Σ -m g·x`, zero at the origin.
    #[must_use]
    pub fn potential_energy(&self, gravity: GravityVector) -> f64 {
        let g = gravity.as_dvec3();
        self.bodies
            .iter()
            .map(|b| -b.mass * g.dot(b.position))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(-0.1)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_bad_time_steps(#[case] dt: f64) {
        let mut model = Model3d::new();
        assert!(model.add_body(1.0, DVec3::ZERO, DVec3::ZERO).is_ok());
        let before = model.clone();
        assert!(matches!(
            model.step(dt, GravityVector::standard()),
            Err(ModelError::InvalidTimeStep(_))
        ));
        assert_eq!(model, before);
    }

    #[test]
    fn step_clears_forces() {
        let mut model = Model3d::new();
        let id = model
            .add_body(2.0, DVec3::ZERO, DVec3::ZERO)
            .unwrap_or_else(|e| panic!("{e}"));
        model
            .apply_force(id, DVec3::new(4.0, 0.0, 0.0))
            .unwrap_or_else(|e| panic!("{e}"));
        model
            .step(0.5, GravityVector::ZERO)
            .unwrap_or_else(|e| panic!("{e}"));
        let body = model.body(id).copied().unwrap_or_else(|| panic!("body"));
        assert_relative_eq!(body.velocity.x, 1.0);
        assert_relative_eq!(body.position.x, 0.5);
        assert_eq!(body.pending_force(), DVec3::ZERO);
        assert_relative_eq!(model.time(), 0.5);
    }

    #[test]
    fn unknown_body_is_reported() {
        let mut other = Model3d::new();
        let id = other
            .add_body(1.0, DVec3::ZERO, DVec3::ZERO)
            .unwrap_or_else(|e| panic!("{e}"));
        let mut model = Model3d::new();
        assert_eq!(
            model.apply_force(id, DVec3::X),
            Err(ModelError::UnknownBody(id))
        );
    }

    #[test]
    fn energies_use_gravity_direction() {
        let mut model = Model3d::new();
        assert!(model
            .add_body(2.0, DVec3::new(0.0, 0.0, 3.0), DVec3::new(1.0, 0.0, 0.0))
            .is_ok());
        assert_relative_eq!(model.kinetic_energy(), 1.0);
        assert_relative_eq!(
            model.potential_energy(GravityVector::new(0.0, 0.0, -10.0)),
            60.0
        );
        assert_relative_eq!(model.potential_energy(GravityVector::ZERO), 0.0);
    }

    #[test]
    fn empty_model_has_no_centre() {
        assert!(Model3d::new().center_of_mass().is_none());
    }
}
