//! Shared physical environment handed to every test case.
//!
//! The bootstrap builds one [`TestContext`] template with a zero
//! [`GravityVector`]. The engine clones that template for each case, so a
//! case that sets a physical gravity value never leaks it into another case.

use glam::DVec3;

use crate::STANDARD_GRAVITY;

/// Gravitational acceleration as a 3-component vector.
///
/// The default value is the zero vector; cases that need a physical
/// environment overwrite it, typically with [`GravityVector::standard`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GravityVector(DVec3);

impl GravityVector {
    /// The zero vector.
    pub const ZERO: Self = Self(DVec3::ZERO);

    /// Creates a gravity vector from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    /// Earth-surface gravity pointing down the z axis.
    ///
    /// ```
    /// use gravitas::GravityVector;
    /// let g = GravityVector::standard();
    /// assert!(g.as_dvec3().z < 0.0);
    /// ```
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(0.0, 0.0, -STANDARD_GRAVITY)
    }

    /// Returns the underlying vector.
    #[must_use]
    pub const fn as_dvec3(self) -> DVec3 {
        self.0
    }

    /// `true` when every component is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == DVec3::ZERO
    }
}

impl From<DVec3> for GravityVector {
    fn from(value: DVec3) -> Self {
        Self(value)
    }
}

impl From<GravityVector> for DVec3 {
    fn from(value: GravityVector) -> Self {
        value.0
    }
}

/// Fixture passed by mutable reference into each test case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestContext {
    /// Gravity used by physics checks. Zero unless the case sets it.
    pub gravity: GravityVector,
    suite: String,
    case: String,
}

impl TestContext {
    /// Builds the bootstrap template: zero gravity, no case bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this template bound to `suite.case`.
    #[must_use]
    pub fn for_case(&self, suite: &str, case: &str) -> Self {
        Self {
            gravity: self.gravity,
            suite: suite.to_owned(),
            case: case.to_owned(),
        }
    }

    /// Name of the suite the context is bound to, empty for the template.
    #[must_use]
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Name of the case the context is bound to, empty for the template.
    #[must_use]
    pub fn case(&self) -> &str {
        &self.case
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_starts_with_zero_gravity() {
        let ctx = TestContext::new();
        assert!(ctx.gravity.is_zero());
        assert_eq!(ctx.gravity, GravityVector::ZERO);
    }

    #[test]
    fn case_copies_do_not_share_gravity() {
        let template = TestContext::new();
        let mut first = template.for_case("Model3d", "falls");
        first.gravity = GravityVector::standard();
        let second = template.for_case("Model3d", "floats");
        assert!(second.gravity.is_zero());
        assert_eq!(first.case(), "falls");
        assert_eq!(second.suite(), "Model3d");
    }
}
