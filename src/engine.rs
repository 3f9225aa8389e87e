//! Test-execution engine.
//!
//! The engine owns the `--test-*` flags, selects cases from a
//! [`TestSuiteRegistry`], runs each one against its own copy of the
//! bootstrap [`TestContext`] and prints a console summary in the familiar
//! `[ RUN      ]` / `[       OK ]` layout. A failing or panicking case is
//! recorded and the run continues with the next case.

use std::any::Any;
use std::fs;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::args::split_recognized;
use crate::environment::TestContext;
use crate::filter::NameFilter;
use crate::registry::{Suite, TestCase, TestSuiteRegistry};
use crate::vlog;

/// Help text for the engine flags, appended to the process `--help`.
pub const FLAGS_HELP: &str = "\
Test selection:
      --test-filter <PATTERN>    Run only Suite.case names matching POS[:POS][-NEG[:NEG]]
      --test-list                List matching cases without running them
      --test-repeat <N>          Run the selection N times
      --test-also-run-disabled   Include disabled cases
      --test-brief               Only print failures and the final summary
      --test-output <PATH>       Also write the run summary as JSON";

/// Options read by the engine before any other flag parsing.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "gravitas-tests",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct EngineOptions {
    /// Wildcard filter over `Suite.case` names.
    #[arg(long = "test-filter", value_name = "PATTERN", allow_hyphen_values = true)]
    pub filter: Option<String>,
    /// List the selected cases and exit without running them.
    #[arg(long = "test-list")]
    pub list: bool,
    /// Number of times to run the selection.
    #[arg(
        long = "test-repeat",
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub repeat: u32,
    /// Also run cases registered as disabled.
    #[arg(long = "test-also-run-disabled")]
    pub also_run_disabled: bool,
    /// Only print failures and the final summary.
    #[arg(long = "test-brief")]
    pub brief: bool,
    /// Write the run summary as JSON to this path.
    #[arg(long = "test-output", value_name = "PATH", allow_hyphen_values = true)]
    pub output: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            filter: None,
            list: false,
            repeat: 1,
            also_run_disabled: false,
            brief: false,
            output: None,
        }
    }
}

/// Errors that stop the engine from completing a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The console report could not be written.
    #[error("cannot write test output: {0}")]
    Io(#[from] io::Error),
    /// The JSON report could not be written.
    #[error("cannot write report {path}: {source}")]
    Report {
        /// Report destination.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// An explicit name filter selected no case.
    #[error("no test case matches filter `{0}`")]
    NoMatch(String),
    /// The summary could not be serialised.
    #[error("cannot serialise report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of one case execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Every expectation held.
    Passed,
    /// The check returned an error or panicked.
    Failed {
        /// Failure description.
        message: String,
    },
}

/// Result of one case in one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    /// Suite name.
    pub suite: String,
    /// Case name.
    pub case: String,
    /// One-based iteration number.
    pub iteration: u32,
    /// Pass or fail.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl CaseReport {
    /// `Suite.case`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.suite, self.case)
    }

    /// `true` when the case passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }
}

/// Aggregated results of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Every executed case, in execution order.
    pub cases: Vec<CaseReport>,
    /// Disabled cases that matched the filter but were not run.
    pub disabled: usize,
    /// Iterations performed.
    pub iterations: u32,
    /// Total wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Number of passing case executions.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    /// Failing case executions.
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed())
    }

    /// `true` when no executed case failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(CaseReport::passed)
    }

    /// Process exit status: `0` when every case passed, `1` otherwise.
    #[must_use]
    pub fn exit_status(&self) -> u8 {
        u8::from(!self.all_passed())
    }
}

type Selection<'r> = Vec<(&'r Suite, Vec<&'r TestCase>)>;

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    text.map_or_else(
        || "test case panicked".to_owned(),
        |message| format!("panicked: {message}"),
    )
}

fn run_case(case: &TestCase, ctx: &mut TestContext) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| case.run(ctx))) {
        Ok(Ok(())) => Outcome::Passed,
        Ok(Err(err)) => Outcome::Failed {
            message: format!("{err:#}"),
        },
        Err(payload) => Outcome::Failed {
            message: panic_message(payload.as_ref()),
        },
    }
}

/// Runs registered cases and reports their outcomes.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
    filter: NameFilter,
}

impl Engine {
    /// Creates an engine from already parsed options.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        let filter = options
            .filter
            .as_deref()
            .map(NameFilter::parse)
            .unwrap_or_default();
        Self { options, filter }
    }

    /// Consumes the engine's `--test-*` flags from `args`.
    ///
    /// Returns the engine and the remaining arguments, program name first,
    /// in their original order.
    ///
    /// # Errors
    /// Returns the `clap` error for malformed engine flags.
    pub fn init(args: &[String]) -> Result<(Self, Vec<String>), clap::Error> {
        let split = split_recognized::<EngineOptions>(args);
        let options = EngineOptions::try_parse_from(&split.consumed)?;
        Ok((Self::new(options), split.remaining))
    }

    /// Parsed options.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Adds a positive name pattern to the filter.
    pub fn include(&mut self, pattern: &str) {
        self.filter.include(pattern);
    }

    fn select<'r>(
        &self,
        registry: &'r TestSuiteRegistry,
    ) -> Result<(Selection<'r>, usize), EngineError> {
        let mut disabled = 0;
        let mut selection = Vec::new();
        for suite in registry.suites() {
            let cases: Vec<&TestCase> = suite
                .cases()
                .iter()
                .filter(|case| {
                    self.filter
                        .matches(&format!("{}.{}", suite.name(), case.name()))
                })
                .filter(|case| {
                    let skip = case.is_disabled() && !self.options.also_run_disabled;
                    disabled += usize::from(skip);
                    !skip
                })
                .collect();
            if !cases.is_empty() {
                selection.push((suite, cases));
            }
        }
        if selection.is_empty() && !self.filter.is_unrestricted() {
            return Err(EngineError::NoMatch(self.filter.to_string()));
        }
        Ok((selection, disabled))
    }

    /// Writes the selected case names, grouped by suite.
    ///
    /// # Errors
    /// Returns [`EngineError::NoMatch`] when an explicit filter selects
    /// nothing and [`EngineError::Io`] on write failures.
    pub fn list(
        &self,
        registry: &TestSuiteRegistry,
        out: &mut dyn Write,
    ) -> Result<(), EngineError> {
        let (selection, _) = self.select(registry)?;
        for (suite, cases) in selection {
            writeln!(out, "{}.", suite.name())?;
            for case in cases {
                writeln!(out, "  {}", case.name())?;
            }
        }
        Ok(())
    }

    /// Runs every selected case `repeat` times.
    ///
    /// Each case receives a fresh copy of `template`. Cases run sequentially
    /// on the calling thread and never stop the run early.
    ///
    /// # Errors
    /// Returns [`EngineError::NoMatch`] when an explicit filter selects no
    /// case, and another [`EngineError`] when the console output or the JSON
    /// report cannot be written. Case failures are reported in the summary,
    /// not as errors.
    pub fn run_all(
        &self,
        registry: &TestSuiteRegistry,
        template: &TestContext,
        out: &mut dyn Write,
    ) -> Result<RunSummary, EngineError> {
        let started = Instant::now();
        let (selection, disabled) = self.select(registry)?;
        let total: usize = selection.iter().map(|(_, cases)| cases.len()).sum();
        info!(
            "running {} from {}",
            plural(total, "test"),
            plural(selection.len(), "test suite")
        );

        let mut summary = RunSummary {
            disabled,
            ..RunSummary::default()
        };
        for iteration in 1..=self.options.repeat {
            if self.options.repeat > 1 {
                writeln!(out, "\nRepeating all tests (iteration {iteration}) . . .\n")?;
            }
            let first = summary.cases.len();
            let iteration_started = Instant::now();
            self.run_iteration(&selection, template, iteration, &mut summary, out)?;
            let reports = summary.cases.get(first..).unwrap_or_default();
            write_totals(out, reports, selection.len(), disabled, iteration_started.elapsed())?;
            summary.iterations = iteration;
        }
        summary.elapsed_ms = millis(started.elapsed());

        let failed = summary.failures().count();
        if failed == 0 {
            info!("all {} passed", plural(summary.cases.len(), "test"));
        } else {
            warn!("{} of {} failed", plural(failed, "test"), summary.cases.len());
        }

        if let Some(path) = &self.options.output {
            let json = serde_json::to_vec_pretty(&summary)?;
            fs::write(path, json).map_err(|source| EngineError::Report {
                path: path.clone(),
                source,
            })?;
        }
        Ok(summary)
    }

    fn run_iteration(
        &self,
        selection: &Selection<'_>,
        template: &TestContext,
        iteration: u32,
        summary: &mut RunSummary,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let brief = self.options.brief;
        let total: usize = selection.iter().map(|(_, cases)| cases.len()).sum();
        writeln!(
            out,
            "[==========] Running {} from {}.",
            plural(total, "test"),
            plural(selection.len(), "test suite")
        )?;

        for (suite, cases) in selection {
            let suite_started = Instant::now();
            if !brief {
                writeln!(out, "[----------] {} from {}", plural(cases.len(), "test"), suite.name())?;
            }
            for case in cases {
                let name = format!("{}.{}", suite.name(), case.name());
                if !brief {
                    writeln!(out, "[ RUN      ] {name}")?;
                }
                vlog!(1, "starting {name}");
                let mut ctx = template.for_case(suite.name(), case.name());
                let case_started = Instant::now();
                let outcome = run_case(case, &mut ctx);
                let duration_ms = millis(case_started.elapsed());
                match &outcome {
                    Outcome::Passed => {
                        if !brief {
                            writeln!(out, "[       OK ] {name} ({duration_ms} ms)")?;
                        }
                    }
                    Outcome::Failed { message } => {
                        warn!("{name} failed: {message}");
                        writeln!(out, "{message}")?;
                        writeln!(out, "[  FAILED  ] {name} ({duration_ms} ms)")?;
                    }
                }
                summary.cases.push(CaseReport {
                    suite: suite.name().to_owned(),
                    case: case.name().to_owned(),
                    iteration,
                    outcome,
                    duration_ms,
                });
            }
            if !brief {
                writeln!(
                    out,
                    "[----------] {} from {} ({} ms total)\n",
                    plural(cases.len(), "test"),
                    suite.name(),
                    millis(suite_started.elapsed())
                )?;
            }
        }
        Ok(())
    }
}

fn write_totals(
    out: &mut dyn Write,
    reports: &[CaseReport],
    suites: usize,
    disabled: usize,
    elapsed: Duration,
) -> io::Result<()> {
    writeln!(
        out,
        "[==========] {} from {} ran. ({} ms total)",
        plural(reports.len(), "test"),
        plural(suites, "test suite"),
        millis(elapsed)
    )?;
    let passed = reports.iter().filter(|r| r.passed()).count();
    writeln!(out, "[  PASSED  ] {}.", plural(passed, "test"))?;

    let failed: Vec<&CaseReport> = reports.iter().filter(|r| !r.passed()).collect();
    if !failed.is_empty() {
        writeln!(out, "[  FAILED  ] {}, listed below:", plural(failed.len(), "test"))?;
        for report in &failed {
            writeln!(out, "[  FAILED  ] {}", report.qualified_name())?;
        }
        writeln!(out, "\n{} FAILED {}", failed.len(), if failed.len() == 1 { "TEST" } else { "TESTS" })?;
    }
    if disabled > 0 {
        writeln!(
            out,
            "  YOU HAVE {disabled} DISABLED {}",
            if disabled == 1 { "TEST" } else { "TESTS" }
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CheckResult;

    fn pass(_: &mut TestContext) -> CheckResult {
        Ok(())
    }

    fn fail(_: &mut TestContext) -> CheckResult {
        anyhow::bail!("expected failure")
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn init_consumes_only_engine_flags() {
        let args = strings(&["prog", "--v=1", "--test-filter", "A.*", "x", "--test-brief"]);
        let (engine, remaining) = Engine::init(&args).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(remaining, strings(&["prog", "--v=1", "x"]));
        assert_eq!(engine.options().filter.as_deref(), Some("A.*"));
        assert!(engine.options().brief);
        assert_eq!(engine.options().repeat, 1);
    }

    #[test]
    fn init_rejects_zero_repeat() {
        assert!(Engine::init(&strings(&["prog", "--test-repeat", "0"])).is_err());
    }

    #[test]
    fn panics_are_recorded_as_failures() {
        let mut registry = TestSuiteRegistry::new();
        let panicking = |_: &mut TestContext| -> CheckResult { panic!("boom") };
        assert!(registry.register("A", "panics", panicking).is_ok());
        assert!(registry.register("A", "passes", pass).is_ok());
        let mut out = Vec::new();
        let summary = Engine::default()
            .run_all(&registry, &TestContext::new(), &mut out)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(summary.cases.len(), 2);
        assert_eq!(summary.passed(), 1);
        assert_eq!(
            summary.cases[0].outcome,
            Outcome::Failed {
                message: "panicked: boom".into()
            }
        );
        assert_eq!(summary.exit_status(), 1);
    }

    #[test]
    fn disabled_cases_are_counted_not_run() {
        let mut registry = TestSuiteRegistry::new();
        assert!(registry.register_disabled("A", "broken", fail).is_ok());
        assert!(registry.register("A", "ok", pass).is_ok());
        let mut out = Vec::new();
        let summary = Engine::default()
            .run_all(&registry, &TestContext::new(), &mut out)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(summary.disabled, 1);
        assert_eq!(summary.cases.len(), 1);
        assert_eq!(summary.exit_status(), 0);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("YOU HAVE 1 DISABLED TEST"));

        let engine = Engine::new(EngineOptions {
            also_run_disabled: true,
            ..EngineOptions::default()
        });
        let summary = engine
            .run_all(&registry, &TestContext::new(), &mut Vec::new())
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(summary.cases.len(), 2);
        assert_eq!(summary.exit_status(), 1);
    }

    #[test]
    fn repeat_runs_selection_again() {
        let mut registry = TestSuiteRegistry::new();
        assert!(registry.register("A", "ok", pass).is_ok());
        let engine = Engine::new(EngineOptions {
            repeat: 3,
            ..EngineOptions::default()
        });
        let summary = engine
            .run_all(&registry, &TestContext::new(), &mut Vec::new())
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(summary.iterations, 3);
        let iterations: Vec<u32> = summary.cases.iter().map(|c| c.iteration).collect();
        assert_eq!(iterations, [1, 2, 3]);
    }

    fn totals_ms(text: &str) -> Vec<u64> {
        text.lines()
            .filter(|line| line.starts_with("[==========]") && line.contains(" ran. ("))
            .filter_map(|line| line.rsplit('(').next()?.split(' ').next()?.parse().ok())
            .collect()
    }

    #[test]
    fn each_iteration_reports_its_own_time() {
        let mut registry = TestSuiteRegistry::new();
        let slow = |_: &mut TestContext| -> CheckResult {
            std::thread::sleep(Duration::from_millis(40));
            Ok(())
        };
        assert!(registry.register("A", "slow", slow).is_ok());
        let engine = Engine::new(EngineOptions {
            repeat: 3,
            ..EngineOptions::default()
        });
        let mut out = Vec::new();
        let summary = engine
            .run_all(&registry, &TestContext::new(), &mut out)
            .unwrap_or_else(|e| panic!("{e}"));
        let totals = totals_ms(&String::from_utf8_lossy(&out));
        assert_eq!(totals.len(), 3);
        assert!(totals.iter().all(|&ms| ms >= 40), "{totals:?}");
        assert!(totals.iter().sum::<u64>() <= summary.elapsed_ms, "{totals:?}");
    }

    #[test]
    fn list_prints_selected_names() {
        let mut registry = TestSuiteRegistry::new();
        assert!(registry.register("A", "one", pass).is_ok());
        assert!(registry.register("B", "two", pass).is_ok());
        let mut engine = Engine::new(EngineOptions {
            filter: Some("B.*".into()),
            ..EngineOptions::default()
        });
        let mut out = Vec::new();
        engine.list(&registry, &mut out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(String::from_utf8_lossy(&out), "B.\n  two\n");

        engine.include("A.one");
        let mut out = Vec::new();
        engine.list(&registry, &mut out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(String::from_utf8_lossy(&out), "A.\n  one\nB.\n  two\n");
    }

    #[test]
    fn filter_matching_nothing_is_an_error() {
        let mut registry = TestSuiteRegistry::new();
        assert!(registry.register("Model3d", "free_fall", pass).is_ok());
        let mut engine = Engine::default();
        engine.include("Modle3d.*");
        let mut out = Vec::new();
        let err = engine.run_all(&registry, &TestContext::new(), &mut out).err();
        assert!(matches!(err, Some(EngineError::NoMatch(ref f)) if f == "Modle3d.*"));
        assert!(out.is_empty());
        assert!(matches!(
            engine.list(&registry, &mut Vec::new()),
            Err(EngineError::NoMatch(_))
        ));
    }

    #[test]
    fn empty_registry_without_filter_passes() {
        let summary = Engine::default()
            .run_all(&TestSuiteRegistry::new(), &TestContext::new(), &mut Vec::new())
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(summary.cases.is_empty());
        assert_eq!(summary.exit_status(), 0);
    }

    #[test]
    fn negative_only_filter_value_may_start_with_a_hyphen() {
        let args = strings(&[
            "prog",
            "--test-filter",
            "-Optimizer.*",
            "--test-output",
            "-report.json",
        ]);
        let (engine, remaining) = Engine::init(&args).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(remaining, strings(&["prog"]));
        assert_eq!(engine.options().filter.as_deref(), Some("-Optimizer.*"));
        assert_eq!(
            engine.options().output.as_deref(),
            Some(std::path::Path::new("-report.json"))
        );
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(&"static"), "panicked: static");
        assert_eq!(panic_message(&String::from("owned")), "panicked: owned");
        assert_eq!(panic_message(&42_u8), "test case panicked");
    }
}
