//! # Settings File
//!
//! This module defines the optional `.valgrade.yaml` settings file. It holds
//! the options that rarely change between runs against the same chart, so
//! that a typical invocation only names the versions and the values file:
//!
//! ```yaml
//! repository: https://prometheus-community.github.io/helm-charts
//! chart: kube-prometheus-stack
//! keep:
//!   - grafana.adminPassword
//!   - alertmanager.config
//! ignoreMissing: false
//! cacheRoot: /var/cache/valgrade
//! ```
//!
//! Command-line options take precedence over the file; keep lists from both
//! sources are combined.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::{ALT_CONFIG_FILE, DEFAULT_CONFIG_FILE};
use crate::error::{Error, Result};

/// Contents of a settings file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    /// Chart repository address.
    #[serde(default)]
    pub repository: Option<String>,
    /// Chart name within the repository.
    #[serde(default)]
    pub chart: Option<String>,
    /// Keep rules, as dotted paths.
    #[serde(default)]
    pub keep: Vec<String>,
    /// Do not propagate keys that the target version dropped.
    #[serde(default)]
    pub ignore_missing: bool,
    /// Directory of the chart cache.
    #[serde(default)]
    pub cache_root: Option<PathBuf>,
}

/// Parse settings from YAML text. A document without content yields the
/// defaults.
pub fn parse(text: &str) -> Result<Settings> {
    let has_content = text.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && line != "---"
    });
    if !has_content {
        return Ok(Settings::default());
    }
    serde_yaml::from_str::<Settings>(text).map_err(|e| {
        let message = e.to_string();
        let hint = message.contains("unknown field").then(|| {
            "Valid keys are repository, chart, keep, ignoreMissing and cacheRoot".to_string()
        });
        Error::ConfigParse { message, hint }
    })
}

/// Read and parse a settings file.
pub fn from_file(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text).map_err(|e| match e {
        Error::ConfigParse { message, hint } => Error::ConfigParse {
            message: format!("{}: {}", path.display(), message),
            hint,
        },
        other => other,
    })
}

/// Find a settings file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    [DEFAULT_CONFIG_FILE, ALT_CONFIG_FILE]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
