use std::env;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use log::debug;

use super::{retrieval_error, Chart, ChartProvider};
use crate::error::Result;

/// Fetches charts with the system `helm` binary.
///
/// Going through helm picks up whatever it is configured with: repository
/// credentials, registry logins, proxies and TLS settings.
#[derive(Debug, Clone)]
pub struct HelmProvider {
    binary: PathBuf,
}

impl HelmProvider {
    /// Use `$HELM_BIN` (set by helm when running plugins) or `helm` from `PATH`.
    pub fn new() -> Self {
        let binary = env::var_os("HELM_BIN")
            .filter(|bin| !bin.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("helm"));
        Self { binary }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments for `helm show <what>` of a chart version.
    ///
    /// OCI charts are addressed by reference, classic repositories by
    /// `--repo`.
    pub fn show_args(what: &str, repository: &str, name: &str, version: &str) -> Vec<String> {
        let mut args = vec!["show".to_string(), what.to_string()];
        if repository.starts_with("oci://") {
            args.push(format!("{}/{}", repository.trim_end_matches('/'), name));
        } else {
            args.push(name.to_string());
            args.push("--repo".to_string());
            args.push(repository.to_string());
        }
        args.push("--version".to_string());
        args.push(version.to_string());
        args
    }

    fn show(&self, what: &str, repository: &str, name: &str, version: &str) -> Result<String> {
        let args = Self::show_args(what, repository, name, version);
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary).args(&args).output().map_err(|e| {
            let hint = (e.kind() == ErrorKind::NotFound)
                .then_some("Install helm (https://helm.sh) or point HELM_BIN at it");
            retrieval_error(
                repository,
                name,
                version,
                format!("could not run {}: {}", self.binary.display(), e),
                hint,
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();

            // Provide helpful hints for common failures
            let hint = if stderr.contains("401") || stderr.contains("unauthorized") {
                Some("Authenticate with `helm registry login` or `helm repo add --username`")
            } else if stderr.contains("not found") || stderr.contains("no chart version") {
                Some("Check the chart name and that this version is published in the repository")
            } else {
                None
            };

            return Err(retrieval_error(
                repository,
                name,
                version,
                format!("helm show {} failed: {}", what, stderr),
                hint,
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for HelmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartProvider for HelmProvider {
    fn fetch(&self, repository: &str, name: &str, version: &str) -> Result<Chart> {
        let values = self.show("values", repository, name, version)?;
        let chart_yaml = self.show("chart", repository, name, version)?;
        Chart::from_sources(name, version, &values, Some(&chart_yaml)).map_err(|err| {
            retrieval_error(
                repository,
                name,
                version,
                format!("unreadable chart: {}", err),
                None,
            )
        })
    }
}
