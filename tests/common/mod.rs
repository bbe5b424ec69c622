//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and chart
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_demo_charts().with_values(charts::USER_VALUES);
//!     fixture.upgrade().arg("-i").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::charts;
    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
}

/// Chart values used across tests: a `demo` chart released as 1.0.0 and
/// 2.0.0.
#[allow(dead_code)]
pub mod charts {
    pub const NAME: &str = "demo";
    pub const BASE: &str = "1.0.0";
    pub const TARGET: &str = "2.0.0";

    /// Defaults of version 1.0.0.
    pub const BASE_VALUES: &str = r#"replicaCount: 1
image:
  repository: nginx
  tag: "1.25"
  pullPolicy: IfNotPresent
service:
  type: ClusterIP
  port: 80
legacy:
  enabled: false
"#;

    /// Defaults of version 2.0.0: new tag and pull policy, a new probes
    /// section, `legacy` dropped.
    pub const TARGET_VALUES: &str = r#"replicaCount: 1
image:
  repository: nginx
  tag: "1.27"
  pullPolicy: Always
service:
  type: ClusterIP
  port: 80
probes:
  enabled: true
"#;

    /// A user's customized values for 1.0.0.
    pub const USER_VALUES: &str = r#"# Production overrides
replicaCount: 3 # scaled for traffic

image:
  repository: nginx
  tag: "1.25"
  pullPolicy: IfNotPresent

service:
  type: LoadBalancer
  port: 80
legacy:
  enabled: false
"#;

    /// USER_VALUES upgraded to 2.0.0 with no options.
    pub const UPGRADED_VALUES: &str = r#"# Production overrides
replicaCount: 3 # scaled for traffic

image:
  repository: nginx
  tag: '1.27'
  pullPolicy: Always

service:
  type: LoadBalancer
  port: 80
probes:
  enabled: true
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "invalid: yaml: content:";
}

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// A test fixture that provides a temporary directory holding a local chart
/// repository and a values file.
///
/// Charts go to `charts/<name>-<version>/`, the values file to
/// `values.yaml`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add one chart version to the local repository.
    pub fn with_chart(self, name: &str, version: &str, values: &str) -> Self {
        let dir = format!("charts/{}-{}", name, version);
        self.temp_dir
            .child(format!("{}/values.yaml", dir))
            .write_str(values)
            .expect("Failed to write chart values");
        self.temp_dir
            .child(format!("{}/Chart.yaml", dir))
            .write_str(&format!("apiVersion: v2\nname: {}\nversion: {}\n", name, version))
            .expect("Failed to write Chart.yaml");
        self
    }

    /// Add both versions of the demo chart.
    pub fn with_demo_charts(self) -> Self {
        self.with_chart(charts::NAME, charts::BASE, charts::BASE_VALUES)
            .with_chart(charts::NAME, charts::TARGET, charts::TARGET_VALUES)
    }

    /// Write the values file.
    pub fn with_values(self, content: &str) -> Self {
        self.with_file("values.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the local chart repository.
    pub fn charts_path(&self) -> PathBuf {
        self.temp_dir.path().join("charts")
    }

    /// Path of the values file.
    pub fn values_path(&self) -> PathBuf {
        self.temp_dir.path().join("values.yaml")
    }

    /// Read a file of the fixture.
    #[allow(dead_code)]
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(path)).expect("Failed to read file")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command configured to run in this fixture's directory, with
    /// any `VALGRADE_*` variables of the calling environment cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("valgrade");
        cmd.current_dir(self.path())
            .env_remove("VALGRADE_REPOSITORY")
            .env_remove("VALGRADE_CHART")
            .env_remove("VALGRADE_CONFIG")
            .env_remove("VALGRADE_LOG")
            .env("VALGRADE_CACHE", self.path().join("cache"))
            .env("NO_COLOR", "1");
        cmd
    }

    /// Create a command upgrading `values.yaml` from the demo chart's base
    /// to its target version against the local repository. Output options
    /// are left to the caller.
    pub fn upgrade(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("-b")
            .arg(charts::BASE)
            .arg("-t")
            .arg(charts::TARGET)
            .arg("-f")
            .arg(self.values_path())
            .arg("-r")
            .arg(self.charts_path())
            .arg("-c")
            .arg(charts::NAME);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_demo_charts() {
        let fixture = TestFixture::new().with_demo_charts();
        assert!(fixture.charts_path().join("demo-1.0.0/values.yaml").exists());
        assert!(fixture.charts_path().join("demo-2.0.0/Chart.yaml").exists());
    }

    #[test]
    fn test_chart_values_are_valid_yaml() {
        let values = [
            charts::BASE_VALUES,
            charts::TARGET_VALUES,
            charts::USER_VALUES,
            charts::UPGRADED_VALUES,
        ];

        for values in values {
            serde_yaml::from_str::<serde_yaml::Value>(values).expect("Values should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(charts::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
