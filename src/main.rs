//! Runs the built-in "3D model" and "optimizer" suites.
//!
//! Exit status is `0` when every executed case passed, `1` when any case
//! failed or setup went wrong and `2` for argument errors.

use std::io::{self, Write};
use std::process::ExitCode;

use gravitas::engine::EngineError;
use gravitas::{bootstrap, suites, BootstrapError};
use log::{error, LevelFilter};

fn run(args: &[String]) -> Result<u8, BootstrapError> {
    let boot = bootstrap(args)?;
    let registry = suites::registry()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = boot.run(&registry, &mut out)?;
    out.flush().map_err(EngineError::from)?;
    Ok(summary.exit_status())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(status) => ExitCode::from(status),
        Err(BootstrapError::Args(err)) => err.exit(),
        Err(err) => {
            // Before diagnostics are up the logger is still a no-op.
            if log::max_level() == LevelFilter::Off {
                writeln!(io::stderr(), "error: {err}").ok();
            } else {
                error!("{err}");
            }
            ExitCode::from(err.exit_status())
        }
    }
}
