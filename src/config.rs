//! Process configuration parsed from the command line.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::engine::FLAGS_HELP;
use crate::logging::{DiagnosticsPolicy, ModuleLevels, Severity, Verbosity};

/// Runtime options recognised by the test process.
///
/// Built once at startup and never modified afterwards. Flags the engine
/// owns (`--test-*`) are removed before this parser sees the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "gravitas-tests",
    about = "Runs the 3D model and optimizer test suites",
    after_help = FLAGS_HELP,
    disable_version_flag = true
)]
pub struct ProcessConfiguration {
    /// Also write every log record to standard error.
    #[arg(
        long,
        value_name = "BOOL",
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub alsologtostderr: bool,

    /// Suppress records below this severity.
    #[arg(
        long,
        value_enum,
        value_name = "SEVERITY",
        default_value_t = Severity::Info,
        allow_hyphen_values = true
    )]
    pub minloglevel: Severity,

    /// Fine-grained trace level; `vlog!` records above it are suppressed.
    #[arg(long = "v", value_name = "N", default_value_t = 0, allow_hyphen_values = true)]
    pub verbosity: u8,

    /// Per-module trace levels, e.g. `optimizer=2,model*=1`.
    #[arg(long, value_name = "PATTERN=N,...", allow_hyphen_values = true)]
    pub vmodule: Option<ModuleLevels>,

    /// Directory for `<program>.log`; the console is the only sink when unset.
    #[arg(long, value_name = "DIR", allow_hyphen_values = true)]
    pub log_dir: Option<PathBuf>,
}

impl Default for ProcessConfiguration {
    fn default() -> Self {
        Self {
            alsologtostderr: true,
            minloglevel: Severity::Info,
            verbosity: 0,
            vmodule: None,
            log_dir: None,
        }
    }
}

impl ProcessConfiguration {
    /// Diagnostics policy derived from these options.
    #[must_use]
    pub fn diagnostics_policy(&self) -> DiagnosticsPolicy {
        DiagnosticsPolicy {
            also_log_to_stderr: self.alsologtostderr,
            min_severity: self.minloglevel,
            verbosity: Verbosity {
                level: self.verbosity,
                modules: self.vmodule.clone().unwrap_or_default(),
            },
            log_dir: self.log_dir.clone(),
        }
    }
}
