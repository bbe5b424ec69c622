use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use url::Url;

use super::{retrieval_error, Chart, ChartProvider};
use crate::error::Result;

/// Reads charts unpacked in a local directory.
///
/// Each version lives in its own `<chart>-<version>` directory holding a
/// `values.yaml` and optionally a `Chart.yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

impl LocalProvider {
    fn root(repository: &str) -> PathBuf {
        Url::parse(repository)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .unwrap_or_else(|| PathBuf::from(repository))
    }
}

impl ChartProvider for LocalProvider {
    fn fetch(&self, repository: &str, name: &str, version: &str) -> Result<Chart> {
        let dir = Self::root(repository).join(format!("{}-{}", name, version));
        if !dir.is_dir() {
            return Err(retrieval_error(
                repository,
                name,
                version,
                format!("{} does not exist", dir.display()),
                Some("Local repositories hold one <chart>-<version> directory per version"),
            ));
        }

        let read = |file: &str| -> Result<Option<String>> {
            match fs::read_to_string(dir.join(file)) {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(retrieval_error(
                    repository,
                    name,
                    version,
                    format!("could not read {}: {}", file, e),
                    None,
                )),
            }
        };

        let values = read("values.yaml")?.unwrap_or_default();
        let chart_yaml = read("Chart.yaml")?;
        let chart = Chart::from_sources(name, version, &values, chart_yaml.as_deref()).map_err(|err| {
            retrieval_error(
                repository,
                name,
                version,
                format!("unreadable chart in {}: {}", dir.display(), err),
                None,
            )
        })?;

        if chart.metadata.version != version {
            return Err(retrieval_error(
                repository,
                name,
                version,
                format!(
                    "{} declares version {}",
                    dir.join("Chart.yaml").display(),
                    chart.metadata.version
                ),
                None,
            ));
        }
        Ok(chart)
    }
}
