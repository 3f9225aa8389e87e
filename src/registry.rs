//! Registry of test cases grouped into suites.
//!
//! Suites and cases keep their registration order. Each case owns a
//! [`Check`] that receives a fresh [`TestContext`] when the engine runs it.

use std::fmt;

use hashbrown::HashSet;
use thiserror::Error;

use crate::environment::TestContext;

/// Outcome of a single check. Failures carry the reason.
pub type CheckResult = anyhow::Result<()>;

/// An executable check.
pub trait Check: Send + Sync {
    /// Runs the check against the per-case context.
    ///
    /// # Errors
    /// Returns an error describing the failed expectation.
    fn run(&self, ctx: &mut TestContext) -> CheckResult;
}

impl<F> Check for F
where
    F: Fn(&mut TestContext) -> CheckResult + Send + Sync,
{
    fn run(&self, ctx: &mut TestContext) -> CheckResult {
        self(ctx)
    }
}

/// Errors raised while registering cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same `(suite, case)` pair was registered twice.
    #[error("test case {suite}.{case} is already registered")]
    Duplicate {
        /// Suite name.
        suite: String,
        /// Case name.
        case: String,
    },
    /// Suite and case names must be non-empty and free of `.`.
    #[error("invalid test name `{0}`")]
    InvalidName(String),
}

/// One registered case.
pub struct TestCase {
    name: String,
    check: Box<dyn Check>,
    disabled: bool,
}

impl TestCase {
    /// Case name, unique within its suite.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Disabled cases only run when the engine is asked to include them.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Runs the case's check.
    ///
    /// # Errors
    /// Propagates the check's failure.
    pub fn run(&self, ctx: &mut TestContext) -> CheckResult {
        self.check.run(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// A named group of cases exercising one subsystem.
#[derive(Debug)]
pub struct Suite {
    name: String,
    cases: Vec<TestCase>,
}

impl Suite {
    /// Suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cases in registration order.
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

/// Ordered mapping from `(suite, case)` to executable checks.
#[derive(Debug, Default)]
pub struct TestSuiteRegistry {
    suites: Vec<Suite>,
    ids: HashSet<(String, String)>,
}

fn validate(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidName(name.to_owned()));
    }
    Ok(())
}

impl TestSuiteRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `check` as `suite.case`, creating the suite on first use.
    ///
    /// # Errors
    /// Returns [`RegistryError::Duplicate`] when the pair already exists and
    /// [`RegistryError::InvalidName`] for empty or dotted names.
    pub fn register<C>(&mut self, suite: &str, case: &str, check: C) -> Result<(), RegistryError>
    where
        C: Check + 'static,
    {
        self.insert(suite, case, Box::new(check), false)
    }

    /// Registers a case that only runs when disabled cases are requested.
    ///
    /// # Errors
    /// Same as [`TestSuiteRegistry::register`].
    pub fn register_disabled<C>(
        &mut self,
        suite: &str,
        case: &str,
        check: C,
    ) -> Result<(), RegistryError>
    where
        C: Check + 'static,
    {
        self.insert(suite, case, Box::new(check), true)
    }

    fn insert(
        &mut self,
        suite: &str,
        case: &str,
        check: Box<dyn Check>,
        disabled: bool,
    ) -> Result<(), RegistryError> {
        validate(suite)?;
        validate(case)?;
        if !self.ids.insert((suite.to_owned(), case.to_owned())) {
            return Err(RegistryError::Duplicate {
                suite: suite.to_owned(),
                case: case.to_owned(),
            });
        }

        let entry = TestCase {
            name: case.to_owned(),
            check,
            disabled,
        };
        if let Some(existing) = self.suites.iter_mut().find(|s| s.name == suite) {
            existing.cases.push(entry);
        } else {
            self.suites.push(Suite {
                name: suite.to_owned(),
                cases: vec![entry],
            });
        }
        Ok(())
    }

    /// Suites in registration order.
    #[must_use]
    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    /// Total number of registered cases, disabled ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// `true` when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Fully qualified `Suite.case` names in registration order.
    pub fn qualified_names(&self) -> impl Iterator<Item = String> + '_ {
        self.suites.iter().flat_map(|suite| {
            suite
                .cases
                .iter()
                .map(move |case| format!("{}.{}", suite.name, case.name))
        })
    }
}
