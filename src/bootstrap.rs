//! Startup sequence for the test process.
//!
//! [`bootstrap`] performs, in order: engine flag parsing, process
//! configuration parsing, diagnostics initialisation and creation of the
//! zero-gravity [`TestContext`] template. [`Bootstrap::run`] then hands a
//! registry to the engine. Nothing runs a test case before the whole
//! sequence has completed.

use std::io::Write;
use std::path::Path;

use clap::Parser;
use log::info;
use thiserror::Error;

use crate::args::split_recognized;
use crate::config::ProcessConfiguration;
use crate::engine::{Engine, EngineError, RunSummary};
use crate::environment::TestContext;
use crate::logging::{self, LoggingError};
use crate::registry::{RegistryError, TestSuiteRegistry};

/// Name used when the process was started without `argv[0]`.
pub const DEFAULT_PROGRAM: &str = "gravitas-tests";

/// Errors that abort the process before or while running the suites.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Malformed flags, or a help/usage request.
    #[error(transparent)]
    Args(#[from] clap::Error),
    /// A flag neither the engine nor the configuration recognises.
    #[error("unrecognized argument `{0}`")]
    UnrecognizedArgument(String),
    /// Diagnostics could not be initialised.
    #[error("diagnostics initialisation failed: {0}")]
    Logging(#[from] LoggingError),
    /// The suites could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The engine could not write its report.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl BootstrapError {
    /// Process exit status for this error: the parser's own code for
    /// argument errors, `2` for unrecognised arguments, `1` otherwise.
    #[must_use]
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Args(err) => u8::try_from(err.exit_code()).unwrap_or(2),
            Self::UnrecognizedArgument(_) => 2,
            Self::Logging(_) | Self::Registry(_) | Self::Engine(_) => 1,
        }
    }
}

/// Basename of `argv[0]`, used to tag diagnostic records.
///
/// ```
/// use gravitas::program_name;
/// assert_eq!(program_name("/usr/local/bin/gravitas-tests"), "gravitas-tests");
/// assert_eq!(program_name(""), "gravitas-tests");
/// ```
#[must_use]
pub fn program_name(argv0: &str) -> String {
    Path::new(argv0)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_PROGRAM)
        .to_owned()
}

/// State established by the startup sequence.
#[derive(Debug)]
pub struct Bootstrap {
    program: String,
    config: ProcessConfiguration,
    engine: Engine,
    context: TestContext,
}

/// Runs the startup sequence over the raw process arguments.
///
/// Arguments left after the engine and the configuration have taken their
/// flags are treated as extra name filters. Leftover flags are rejected;
/// anything after a literal `--` is always a filter.
///
/// # Errors
/// Returns [`BootstrapError::Args`] for malformed or help flags,
/// [`BootstrapError::UnrecognizedArgument`] for unknown flags and
/// [`BootstrapError::Logging`] when the log sink cannot be opened.
pub fn bootstrap(args: &[String]) -> Result<Bootstrap, BootstrapError> {
    let (mut engine, remaining) = Engine::init(args)?;

    let split = split_recognized::<ProcessConfiguration>(&remaining);
    let config = ProcessConfiguration::try_parse_from(&split.consumed)?;
    let mut after_separator = false;
    for extra in split.leftovers() {
        if after_separator || !extra.starts_with('-') {
            engine.include(extra);
        } else if extra == "--" {
            after_separator = true;
        } else {
            return Err(BootstrapError::UnrecognizedArgument(extra.clone()));
        }
    }

    let program = program_name(args.first().map_or("", String::as_str));
    let policy = config.diagnostics_policy();
    logging::init(&program, &policy)?;

    let context = TestContext::new();
    info!(
        "{program} starting: min severity {:?}, trace level {}, console copy {}",
        policy.min_severity, policy.verbosity.level, policy.also_log_to_stderr
    );

    Ok(Bootstrap {
        program,
        config,
        engine,
        context,
    })
}

impl Bootstrap {
    /// Program name bound to diagnostic records.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Parsed process configuration.
    #[must_use]
    pub const fn config(&self) -> &ProcessConfiguration {
        &self.config
    }

    /// Engine configured from the `--test-*` flags.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Template cloned into every case; gravity starts at zero.
    #[must_use]
    pub const fn context(&self) -> &TestContext {
        &self.context
    }

    /// Lists or runs the selected cases of `registry`, writing the report
    /// to `out`.
    ///
    /// With `--test-list` nothing runs and the returned summary is empty.
    ///
    /// # Errors
    /// Returns [`BootstrapError::Engine`] when the report cannot be written.
    pub fn run(
        &self,
        registry: &TestSuiteRegistry,
        out: &mut dyn Write,
    ) -> Result<RunSummary, BootstrapError> {
        if self.engine.options().list {
            self.engine.list(registry, out)?;
            return Ok(RunSummary::default());
        }
        Ok(self.engine.run_all(registry, &self.context, out)?)
    }
}
