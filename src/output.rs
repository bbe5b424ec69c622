//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color support based on terminal capabilities and user
//! preferences, and renders the change summary printed after an upgrade.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use valgrade::output::{render_summary, OutputConfig};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! eprint!("{}", render_summary(&delta, &config));
//! ```

use std::env;

use console::style;

use crate::diff::{ChangeKind, Delta};
use crate::value;

/// Longest value rendering shown in a summary line.
const MAX_VALUE_WIDTH: usize = 60;

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stderr is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        // The summary goes to stderr
        console::Term::stderr().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Render the list of changes of an upgrade, one line per path, followed by
/// a count line.
pub fn render_summary(delta: &Delta, config: &OutputConfig) -> String {
    if delta.is_empty() {
        return "No changes: the values already match the target defaults.\n".to_string();
    }

    let mut out = String::new();
    for (kind, path, value) in delta.changes() {
        let line = match kind {
            ChangeKind::Added => style(format!("+ {}: {}", path, shorten(&value::describe(value))))
                .green(),
            ChangeKind::Modified => {
                style(format!("~ {}: {}", path, shorten(&value::describe(value)))).yellow()
            }
            ChangeKind::Removed => style(format!("- {}", path)).red(),
        };
        out.push_str(&format!("  {}\n", line.force_styling(config.use_color)));
    }

    out.push_str(&format!(
        "{} change(s): {} added, {} modified, {} removed\n",
        style(delta.len()).bold().force_styling(config.use_color),
        delta.added.len(),
        delta.modified.len(),
        delta.removed.len()
    ));
    out
}

fn shorten(text: &str) -> String {
    if text.chars().count() <= MAX_VALUE_WIDTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_VALUE_WIDTH - 3).collect();
    format!("{}...", cut)
}
