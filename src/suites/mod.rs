//! Built-in test suites.
//!
//! Cases are added by an explicit registration step at startup rather than
//! by linking order. [`registry`] builds the full set; tests can call the
//! per-suite `register` functions to assemble their own registries.

pub mod model3d;
pub mod optimizer;

use crate::registry::{RegistryError, TestSuiteRegistry};

/// Builds the registry holding the "3D model" and "optimizer" suites.
///
/// # Errors
/// Returns [`RegistryError`] if two cases share a name.
///
/// ```
/// let registry = gravitas::suites::registry().unwrap();
/// let suites: Vec<_> = registry.suites().iter().map(|s| s.name()).collect();
/// assert_eq!(suites, ["Model3d", "Optimizer"]);
/// ```
pub fn registry() -> Result<TestSuiteRegistry, RegistryError> {
    let mut registry = TestSuiteRegistry::new();
    model3d::register(&mut registry)?;
    optimizer::register(&mut registry)?;
    Ok(registry)
}
