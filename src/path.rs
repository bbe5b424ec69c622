//! Dotted key paths
//!
//! Values are addressed by key paths such as `alertmanager.config.retention`:
//! mapping keys joined with `.`. There is no escape syntax, so a key that
//! itself contains a `.` cannot be told apart from two nested keys. Such keys
//! are reported with [`is_ambiguous`] and otherwise handled as-is.

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// Append a key to a path prefix.
///
/// An empty prefix yields the bare segment.
pub fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, segment)
    }
}

/// Whether `path` is `rule` or lies beneath it.
///
/// Matching is on whole segments: `ab` does not match the rule `a`.
pub fn matches(path: &str, rule: &str) -> bool {
    path == rule
        || path
            .strip_prefix(rule)
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Split a path into its key segments.
pub fn split(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(SEPARATOR).collect()
}

/// Whether a mapping key cannot be expressed unambiguously as a path segment.
pub fn is_ambiguous(segment: &str) -> bool {
    segment.contains(SEPARATOR)
}

/// Iterate over the strict ancestors of a path, nearest first.
///
/// `a.b.c` yields `a.b` then `a`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.char_indices()
        .rev()
        .filter(|(_, ch)| *ch == SEPARATOR)
        .map(move |(idx, _)| &path[..idx])
}
