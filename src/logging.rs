//! Diagnostics setup for the test process.
//!
//! Records flow through the `log` facade into an `env_logger` logger built
//! from a [`DiagnosticsPolicy`]. Every record carries the program name. The
//! fine-grained trace level gates [`vlog!`](crate::vlog) records, optionally
//! overridden per module.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;

use clap::ValueEnum;
use env_logger::{Builder, Logger, Target, WriteStyle};
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::filter::wildcard_match;

/// Extra `env_logger` filter directives applied after the policy.
pub const LOG_ENV: &str = "GRAVITAS_LOG";

/// Errors raised while setting up diagnostics.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory or file could not be created.
    #[error("cannot open log sink {path}: {source}")]
    Sink {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A `--vmodule` entry was not of the form `pattern=level`.
    #[error("invalid module verbosity entry `{0}`, expected pattern=level")]
    ModuleEntry(String),
}

/// Minimum severity of emitted records, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Severity {
    /// Debug and above.
    Debug,
    /// Informational and above.
    #[value(alias = "0")]
    Info,
    /// Warnings and errors.
    #[value(alias = "1")]
    Warning,
    /// Errors only.
    #[value(alias = "2")]
    Error,
}

impl Severity {
    /// The `log` filter admitting this severity and everything above it.
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::Debug,
            Self::Info => LevelFilter::Info,
            Self::Warning => LevelFilter::Warn,
            Self::Error => LevelFilter::Error,
        }
    }
}

/// Per-module trace level overrides, parsed from `pattern=level,...`.
///
/// A pattern matches either the full module path or its last segment.
///
/// ```
/// use gravitas::logging::ModuleLevels;
/// let levels: ModuleLevels = "optimizer=2,model*=1".parse().unwrap();
/// assert_eq!(levels.level_for("gravitas::optimizer"), Some(2));
/// assert_eq!(levels.level_for("gravitas::model3d"), Some(1));
/// assert_eq!(levels.level_for("gravitas::engine"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleLevels(Vec<(String, u8)>);

impl ModuleLevels {
    /// The override for `module`, if any entry matches. First match wins.
    #[must_use]
    pub fn level_for(&self, module: &str) -> Option<u8> {
        let last = module.rsplit("::").next().unwrap_or(module);
        self.0
            .iter()
            .find(|(pattern, _)| wildcard_match(pattern, module) || wildcard_match(pattern, last))
            .map(|(_, level)| *level)
    }
}

impl FromStr for ModuleLevels {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry
                    .split_once('=')
                    .and_then(|(pattern, raw)| {
                        let level = raw.trim().parse().ok()?;
                        Some((pattern.trim().to_owned(), level))
                    })
                    .ok_or_else(|| LoggingError::ModuleEntry(entry.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Fine-grained trace level plus per-module overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verbosity {
    /// Global trace level; `0` disables every `vlog!` above level zero.
    pub level: u8,
    /// Overrides consulted before `level`.
    pub modules: ModuleLevels,
}

impl Verbosity {
    /// Whether a `vlog!` record at `level` from `module` is emitted.
    #[must_use]
    pub fn is_on(&self, module: &str, level: u8) -> bool {
        level <= self.modules.level_for(module).unwrap_or(self.level)
    }
}

static VERBOSITY: Lazy<RwLock<Verbosity>> = Lazy::new(|| RwLock::new(Verbosity::default()));

/// Replaces the process-wide trace verbosity.
pub fn set_verbosity(verbosity: Verbosity) {
    match VERBOSITY.write() {
        Ok(mut guard) => *guard = verbosity,
        Err(poisoned) => *poisoned.into_inner() = verbosity,
    }
}

/// Returns the process-wide trace verbosity.
#[must_use]
pub fn verbosity() -> Verbosity {
    match VERBOSITY.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Whether a `vlog!` record at `level` from `module` is currently enabled.
#[must_use]
pub fn vlog_is_on(module: &str, level: u8) -> bool {
    match VERBOSITY.read() {
        Ok(guard) => guard.is_on(module, level),
        Err(poisoned) => poisoned.into_inner().is_on(module, level),
    }
}

/// The diagnostics policy applied at startup.
///
/// Defaults: records are duplicated to the console, records below
/// [`Severity::Info`] are dropped, the trace level is `0` and no log
/// directory is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsPolicy {
    /// Duplicate file records to standard error.
    pub also_log_to_stderr: bool,
    /// Records below this severity are suppressed.
    pub min_severity: Severity,
    /// Gate for `vlog!` records.
    pub verbosity: Verbosity,
    /// Directory holding `<program>.log`; console only when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for DiagnosticsPolicy {
    fn default() -> Self {
        Self {
            also_log_to_stderr: true,
            min_severity: Severity::Info,
            verbosity: Verbosity::default(),
            log_dir: None,
        }
    }
}

impl DiagnosticsPolicy {
    /// Whether a record at `level` passes the severity threshold.
    #[must_use]
    pub fn admits(&self, level: Level) -> bool {
        level <= self.min_severity.level_filter()
    }
}

/// Writes every record to a primary sink and optionally to the console.
#[derive(Debug)]
pub struct DualSink<P, C> {
    primary: P,
    console: Option<C>,
}

impl<P: Write, C: Write> DualSink<P, C> {
    /// Creates a sink writing to `primary` and, when present, `console`.
    pub const fn new(primary: P, console: Option<C>) -> Self {
        Self { primary, console }
    }
}

impl<P: Write, C: Write> Write for DualSink<P, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        if let Some(console) = self.console.as_mut() {
            console.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        if let Some(console) = self.console.as_mut() {
            console.flush()?;
        }
        Ok(())
    }
}

/// Path of the log file for `program` inside `dir`.
#[must_use]
pub fn log_file_path(dir: &Path, program: &str) -> PathBuf {
    dir.join(format!("{program}.log"))
}

fn sink_error(path: &Path) -> impl FnOnce(io::Error) -> LoggingError {
    let path = path.to_path_buf();
    move |source| LoggingError::Sink { path, source }
}

/// Opens the sink described by `policy`.
///
/// # Errors
/// Returns [`LoggingError::Sink`] when the log directory or file cannot be
/// created.
pub fn open_sink(
    program: &str,
    policy: &DiagnosticsPolicy,
) -> Result<Box<dyn Write + Send>, LoggingError> {
    let Some(dir) = policy.log_dir.as_deref() else {
        return Ok(Box::new(io::stderr()));
    };
    fs::create_dir_all(dir).map_err(sink_error(dir))?;
    let path = log_file_path(dir, program);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(sink_error(&path))?;
    let console = policy.also_log_to_stderr.then(io::stderr);
    Ok(Box::new(DualSink::new(file, console)))
}

const fn level_letter(level: Level) -> char {
    match level {
        Level::Error => 'E',
        Level::Warn => 'W',
        Level::Info => 'I',
        Level::Debug => 'D',
        Level::Trace => 'T',
    }
}

fn builder(program: &str, policy: &DiagnosticsPolicy, sink: Box<dyn Write + Send>) -> Builder {
    let program = program.to_owned();
    let mut builder = Builder::new();
    builder
        .filter_level(policy.min_severity.level_filter())
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(sink))
        .format(move |buf, record| {
            writeln!(
                buf,
                "{}{} {} {}] {}",
                level_letter(record.level()),
                buf.timestamp_seconds(),
                program,
                record.target(),
                record.args()
            )
        });
    builder
}

/// Builds a logger for `policy` writing to `sink` without installing it.
#[must_use]
pub fn build_logger(
    program: &str,
    policy: &DiagnosticsPolicy,
    sink: Box<dyn Write + Send>,
) -> Logger {
    builder(program, policy, sink).build()
}

/// Initialises the global logger and trace verbosity.
///
/// Directives in [`LOG_ENV`] refine the policy's filter. A logger that is
/// already installed is left in place so tests can call `init` repeatedly;
/// the trace verbosity is always replaced.
///
/// # Errors
/// Returns [`LoggingError::Sink`] when the configured log file cannot be
/// opened.
pub fn init(program: &str, policy: &DiagnosticsPolicy) -> Result<(), LoggingError> {
    let sink = open_sink(program, policy)?;
    let mut builder = builder(program, policy, sink);
    if let Ok(directives) = env::var(LOG_ENV) {
        builder.parse_filters(&directives);
    }
    set_verbosity(policy.verbosity.clone());

    // `try_init` only fails if a logger was already set.
    if builder.try_init().is_err() {
        log::debug!("logger already installed; keeping the existing one");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Ok(vec![]))]
    #[case("a=1", Ok(vec![("a", 1)]))]
    #[case(" a = 1 , b*=3 ", Ok(vec![("a", 1), ("b*", 3)]))]
    #[case("a", Err(()))]
    #[case("a=x", Err(()))]
    fn parses_module_levels(#[case] input: &str, #[case] expected: Result<Vec<(&str, u8)>, ()>) {
        let parsed = input.parse::<ModuleLevels>().map_err(|_| ());
        let expected = expected.map(|entries| {
            ModuleLevels(entries.into_iter().map(|(p, l)| (p.to_owned(), l)).collect())
        });
        assert_eq!(parsed, expected);
    }

    #[test]
    fn module_override_beats_global_level() {
        let verbosity = Verbosity {
            level: 0,
            modules: "optimizer=2".parse().unwrap_or_default(),
        };
        assert!(verbosity.is_on("gravitas::optimizer", 2));
        assert!(!verbosity.is_on("gravitas::optimizer", 3));
        assert!(!verbosity.is_on("gravitas::model3d", 1));
        assert!(verbosity.is_on("gravitas::model3d", 0));
    }

    #[test]
    fn default_policy_matches_fixed_startup_values() {
        let policy = DiagnosticsPolicy::default();
        assert!(policy.also_log_to_stderr);
        assert_eq!(policy.min_severity, Severity::Info);
        assert_eq!(policy.verbosity.level, 0);
        assert!(policy.log_dir.is_none());
    }

    #[rstest]
    #[case(Severity::Debug, Level::Debug, true)]
    #[case(Severity::Debug, Level::Trace, false)]
    #[case(Severity::Info, Level::Debug, false)]
    #[case(Severity::Info, Level::Info, true)]
    #[case(Severity::Warning, Level::Info, false)]
    #[case(Severity::Warning, Level::Error, true)]
    #[case(Severity::Error, Level::Warn, false)]
    fn policy_admits_by_severity(
        #[case] min: Severity,
        #[case] level: Level,
        #[case] expected: bool,
    ) {
        let policy = DiagnosticsPolicy {
            min_severity: min,
            ..DiagnosticsPolicy::default()
        };
        assert_eq!(policy.admits(level), expected);
    }

    #[test]
    fn dual_sink_duplicates_bytes() {
        let mut sink = DualSink::new(Vec::new(), Some(Vec::new()));
        sink.write_all(b"record\n").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(sink.primary, b"record\n");
        assert_eq!(sink.console.as_deref(), Some(&b"record\n"[..]));
    }

    #[test]
    fn dual_sink_without_console_writes_primary_only() {
        let mut sink: DualSink<Vec<u8>, Vec<u8>> = DualSink::new(Vec::new(), None);
        sink.write_all(b"x").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(sink.primary, b"x");
    }
}
