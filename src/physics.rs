//! Physics helper functions.
//!
//! Provides the force-to-acceleration conversion used when integrating
//! bodies in [`crate::model3d::Model3d`]. Kept free-standing so the suites
//! can check it directly.

use glam::DVec3;

use crate::MIN_MASS;

/// Computes acceleration from a force vector and a mass.
///
/// Returns `None` if `mass` is non-positive, effectively zero (see
/// [`MIN_MASS`]) or not finite. The calculation applies `F=ma` for each
/// component independently.
///
/// # Examples
///
/// ```
/// use glam::DVec3;
/// use gravitas::applied_acceleration;
/// let a = applied_acceleration(DVec3::new(7.0, -14.0, 21.0), 7.0).unwrap();
/// assert!((a.x - 1.0).abs() < 1e-6);
/// assert!((a.y + 2.0).abs() < 1e-6);
/// assert!((a.z - 3.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn applied_acceleration(force: DVec3, mass: f64) -> Option<DVec3> {
    if mass.is_finite() && mass > MIN_MASS {
        Some(force / mass)
    } else {
        None
    }
}
