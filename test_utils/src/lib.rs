//! Utility helpers for tests.

pub mod fixtures;
pub mod output;

pub use fixtures::{always_fail, always_pass, registry_from, CaseSpec};
pub use output::SharedBuffer;

use glam::DVec3;

/// Assert that all strings in `keys` are present in `text`.
///
/// # Panics
/// Panics with a helpful message if any key is missing.
pub fn assert_all_present(text: &str, keys: &[&str]) {
    for key in keys {
        assert!(text.contains(key), "{key} not found in output:\n{text}");
    }
}

/// Assert that all strings in `keys` are absent from `text`.
///
/// # Panics
/// Panics with a helpful message if any key is found.
pub fn assert_all_absent(text: &str, keys: &[&str]) {
    for key in keys {
        assert!(!text.contains(key), "{key} should not be present in:\n{text}");
    }
}

/// Assert that two vectors agree component-wise within `tolerance`.
///
/// # Panics
/// Panics naming both vectors when any component differs by more.
///
/// # Examples
/// ```
/// use glam::DVec3;
/// use test_utils::assert_dvec3_close;
/// assert_dvec3_close(DVec3::new(1.0, 2.0, 3.0), DVec3::new(1.0, 2.0, 3.0 + 1e-9), 1e-6);
/// ```
pub fn assert_dvec3_close(actual: DVec3, expected: DVec3, tolerance: f64) {
    assert!(
        actual.abs_diff_eq(expected, tolerance),
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}
