//! Logging macros.
//!
//! Provides `vlog!`, a fine-grained trace record gated by the process trace
//! level (`--v`) and per-module overrides (`--vmodule`). Records that pass
//! the gate are emitted at info severity, so `--minloglevel` still applies.
//!
//! # Examples
//!
//! ```rust
//! use gravitas::vlog;
//!
//! vlog!(1, "iteration {} residual {:.3e}", 4, 1.0e-7);
//! ```
//!
//! Level `0` records are always emitted; higher levels need `--v` or a
//! matching `--vmodule` entry at least as large.
/// Emits an info-level record when the verbose trace level for the calling
/// module is at least `$level`.
#[macro_export]
macro_rules! vlog {
    ($level:expr, $($arg:tt)+) => {
        if $crate::logging::vlog_is_on(::core::module_path!(), $level) {
            $crate::__macro_deps::log::info!($($arg)+);
        }
    };
}
