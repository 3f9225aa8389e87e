//! Registries assembled from canned checks.

use gravitas::registry::RegistryError;
use gravitas::{CheckResult, TestContext, TestSuiteRegistry};

/// A check that always succeeds.
pub fn always_pass(_: &mut TestContext) -> CheckResult {
    Ok(())
}

/// A check that always fails with a fixed message.
///
/// # Errors
/// Always returns an error.
pub fn always_fail(ctx: &mut TestContext) -> CheckResult {
    anyhow::bail!("{}.{} was told to fail", ctx.suite(), ctx.case())
}

/// `(suite, case, passes)` triple describing one canned case.
pub type CaseSpec<'a> = (&'a str, &'a str, bool);

/// Builds a registry of passing and failing cases in the given order.
///
/// # Errors
/// Propagates duplicate or invalid names.
///
/// # Examples
/// ```
/// use test_utils::registry_from;
/// let registry = registry_from(&[("A", "ok", true), ("A", "bad", false)]).unwrap();
/// assert_eq!(registry.len(), 2);
/// ```
pub fn registry_from(cases: &[CaseSpec<'_>]) -> Result<TestSuiteRegistry, RegistryError> {
    let mut registry = TestSuiteRegistry::new();
    for &(suite, case, passes) in cases {
        if passes {
            registry.register(suite, case, always_pass)?;
        } else {
            registry.register(suite, case, always_fail)?;
        }
    }
    Ok(registry)
}
