//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors raised by the command line
//! should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use valgrade::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("No chart repository given");
//!
//! // Use:
//! return Err(suggestions::missing_repository());
//! ```

use std::path::Path;

/// Extensions recognized for values files.
const SUPPORTED_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Generate an error for when an explicitly named settings file is missing.
///
/// Includes hints about:
/// - The default settings file name
/// - Using the --config flag
/// - Using the VALGRADE_CONFIG environment variable
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Settings file not found: {path}\n\n\
         hint: Without --config, valgrade reads .valgrade.yaml from the current directory when present\n\
         hint: Check the path given to --config\n\
         hint: Unset VALGRADE_CONFIG if it points to a stale file",
        path = path.display()
    )
}

/// Generate an error for when no chart repository was given.
pub fn missing_repository() -> anyhow::Error {
    anyhow::anyhow!(
        "No chart repository given\n\n\
         hint: Pass -r/--repository with an http(s):// repository, an oci:// registry or a directory\n\
         hint: Set VALGRADE_REPOSITORY or 'repository' in .valgrade.yaml"
    )
}

/// Generate an error for when no chart name was given.
pub fn missing_chart() -> anyhow::Error {
    anyhow::anyhow!(
        "No chart name given\n\n\
         hint: Pass -c/--chart with the chart's name in the repository\n\
         hint: Set VALGRADE_CHART or 'chart' in .valgrade.yaml"
    )
}

/// Generate an error for when the values file to upgrade does not exist.
pub fn values_file_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Values file not found: {path}\n\n\
         hint: -f/--values names the customized values file to upgrade\n\
         hint: An empty file is accepted when the chart defaults were never changed",
        path = path.display()
    )
}

/// Generate an error for a values file whose extension is not supported.
///
/// Suggests the closest supported extension when the given one looks like
/// a typo.
pub fn unsupported_extension(path: &Path, extension: &str) -> anyhow::Error {
    let did_you_mean = find_similar(&extension.to_lowercase(), &SUPPORTED_EXTENSIONS)
        .map(|s| format!("\nhint: Did you mean '.{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unsupported values file format: {path}{did_you_mean}\n\n\
         Supported extensions are: {exts}",
        path = path.display(),
        exts = SUPPORTED_EXTENSIONS
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (a_len, b_len) = (a_chars.len(), b_chars.len());

    if a_len == 0 || b_len == 0 {
        return a_len.max(b_len);
    }

    // Single rolling row
    let mut row: Vec<usize> = (0..=b_len).collect();
    for i in 1..=a_len {
        let mut diagonal = row[0];
        row[0] = i;
        for j in 1..=b_len {
            let above = row[j];
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            row[j] = (above + 1).min(row[j - 1] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[b_len]
}
