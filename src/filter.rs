//! Wildcard name filters.
//!
//! Patterns support `*` (any run of characters) and `?` (exactly one
//! character). A filter string has the form `POS[:POS...][-NEG[:NEG...]]`:
//! a name is selected when it matches any positive pattern and no negative
//! one. An empty positive list selects everything.

use std::fmt;

/// Returns `true` when `name` matches the wildcard `pattern`.
///
/// ```
/// use gravitas::filter::wildcard_match;
/// assert!(wildcard_match("Model3d.*", "Model3d.free_fall"));
/// assert!(wildcard_match("?ptimizer.*", "Optimizer.bowl"));
/// assert!(!wildcard_match("Optimizer.*", "Model3d.free_fall"));
/// ```
#[must_use]
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` seen and the name index it was matched against.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < text.len() {
        match pat.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || text.get(n) == Some(&c) => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pat.iter().skip(p).all(|c| *c == '*')
}

/// Parsed `POS-NEG` filter over fully qualified `Suite.case` names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl NameFilter {
    /// Parses a filter expression.
    ///
    /// ```
    /// use gravitas::filter::NameFilter;
    /// let filter = NameFilter::parse("Model3d.*:Optimizer.bowl-*.slow");
    /// assert!(filter.matches("Model3d.free_fall"));
    /// assert!(filter.matches("Optimizer.bowl"));
    /// assert!(!filter.matches("Model3d.slow"));
    /// assert!(!filter.matches("Optimizer.rosenbrock"));
    /// ```
    #[must_use]
    pub fn parse(expression: &str) -> Self {
        let (positive, negative) = expression
            .split_once('-')
            .unwrap_or((expression, ""));
        Self {
            positive: split_patterns(positive),
            negative: split_patterns(negative),
        }
    }

    /// Adds a positive pattern.
    pub fn include(&mut self, pattern: impl Into<String>) {
        self.positive.push(pattern.into());
    }

    /// `true` when no pattern was given, so every name is selected.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    /// Returns `true` when `name` is selected.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let included = self.positive.is_empty()
            || self.positive.iter().any(|p| wildcard_match(p, name));
        included && !self.negative.iter().any(|p| wildcard_match(p, name))
    }
}

impl fmt::Display for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.positive.join(":"))?;
        if !self.negative.is_empty() {
            write!(f, "-{}", self.negative.join(":"))?;
        }
        Ok(())
    }
}

fn split_patterns(list: &str) -> Vec<String> {
    list.split(':')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}
