#![cfg_attr(docsrs, feature(doc_cfg))]
//! Test bootstrap for a small numerical simulation library.
//!
//! The crate provides a point-mass [`model3d`] and a gradient-descent
//! [`optimizer`], the two suites that exercise them, and the machinery that
//! runs those suites: argument splitting, diagnostics setup, the shared
//! gravity fixture and a test-execution engine.
pub mod args;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod engine;
pub mod environment;
pub mod filter;
pub mod logging;
mod macros;
pub mod model3d;
pub mod optimizer;
pub mod physics;
pub mod registry;
pub mod suites;
pub use constants::*;

#[doc(hidden)]
pub mod __macro_deps {
    // Public solely for cross-crate macro hygiene; do not depend on it directly.
    // This module sits outside the semver-stable public API surface.
    pub use log;
}

// Re-export commonly used items
pub use bootstrap::{bootstrap, program_name, Bootstrap, BootstrapError};
pub use config::ProcessConfiguration;
pub use engine::{Engine, EngineOptions, RunSummary};
pub use environment::{GravityVector, TestContext};
pub use logging::{DiagnosticsPolicy, Severity};
pub use physics::applied_acceleration;
pub use registry::{CheckResult, TestSuiteRegistry};
