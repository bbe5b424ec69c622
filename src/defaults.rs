//! Default values for valgrade configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Settings file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".valgrade.yaml";

/// Alternative spelling of [`DEFAULT_CONFIG_FILE`].
pub const ALT_CONFIG_FILE: &str = ".valgrade.yml";

/// Returns the default chart cache directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/valgrade` (XDG Base Directory)
/// - macOS: `~/Library/Caches/valgrade`
/// - Windows: `{FOLDERID_LocalAppData}\valgrade`
///
/// Falls back to `.valgrade-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag, the
/// `VALGRADE_CACHE` environment variable or `cacheRoot` in the settings file.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".valgrade-cache"))
        .join("valgrade")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_root_returns_path() {
        let cache_root = default_cache_root();
        assert!(cache_root.ends_with("valgrade"));
    }

    #[test]
    fn test_default_cache_root_is_absolute_or_fallback() {
        let cache_root = default_cache_root();
        // Either absolute (normal case) or relative fallback
        assert!(
            cache_root.is_absolute() || cache_root.starts_with(".valgrade-cache"),
            "Expected absolute path or fallback, got: {:?}",
            cache_root
        );
    }
}
