//! # Chart Retrieval
//!
//! This module fetches the default values of a chart at a given version. The
//! comparison needs two of them: the version the user's values were written
//! against and the version being upgraded to.
//!
//! ## Design
//!
//! Retrieval is behind the [`ChartProvider`] trait so the concrete source can
//! be swapped out:
//!
//! - **`HelmProvider`**: shells out to the `helm` binary for HTTP(S) chart
//!   repositories and OCI registries.
//! - **`LocalProvider`**: reads charts unpacked in a local directory, one
//!   `<chart>-<version>` directory per version.
//!
//! [`ChartManager`] picks the provider for a repository address and, for
//! remote repositories, keeps fetched charts in the on-disk [`ChartCache`].
//! In tests the provider is replaced with a mock.

mod helm;
mod local;

pub use helm::HelmProvider;
pub use local::LocalProvider;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use url::Url;

use crate::cache::ChartCache;
use crate::error::{Error, Result};
use crate::value;

/// The subset of `Chart.yaml` that valgrade reports on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A chart version's metadata and default values.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub metadata: ChartMetadata,
    pub values: Value,
}

impl Chart {
    /// Build a chart from the text of its `values.yaml` and, if available,
    /// its `Chart.yaml`. Without `Chart.yaml` the metadata only carries the
    /// requested name and version.
    pub fn from_sources(name: &str, version: &str, values: &str, chart_yaml: Option<&str>) -> Result<Self> {
        let values = match value::stringify_keys(serde_yaml::from_str(values)?) {
            Value::Null => Value::Mapping(Mapping::new()),
            mapping @ Value::Mapping(_) => mapping,
            other => {
                return Err(Error::Format {
                    message: format!(
                        "chart default values must be a mapping, found {}",
                        value::ValueKind::of(&other).name()
                    ),
                })
            }
        };

        let metadata = match chart_yaml {
            Some(text) => serde_yaml::from_str(text)?,
            None => ChartMetadata {
                name: name.to_string(),
                version: version.to_string(),
                app_version: None,
                description: None,
            },
        };

        Ok(Self { metadata, values })
    }
}

/// A source of chart versions.
pub trait ChartProvider: Send + Sync {
    /// Fetch `name` at exactly `version` from `repository`.
    fn fetch(&self, repository: &str, name: &str, version: &str) -> Result<Chart>;
}

/// A classified repository address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repository {
    /// A directory of unpacked charts.
    Local(PathBuf),
    /// An HTTP(S) chart repository with an `index.yaml`.
    Http(Url),
    /// An OCI registry namespace, e.g. `oci://registry.example.com/charts`.
    Oci(String),
}

impl Repository {
    pub fn parse(address: &str) -> Result<Self> {
        if address.starts_with("oci://") {
            return Ok(Repository::Oci(address.trim_end_matches('/').to_string()));
        }
        if Path::new(address).is_dir() {
            return Ok(Repository::Local(PathBuf::from(address)));
        }

        let url = Url::parse(address).map_err(|err| Error::ConfigParse {
            message: format!("Invalid repository '{}': {}", address, err),
            hint: Some(
                "Use an http(s):// chart repository, an oci:// registry or an existing directory"
                    .to_string(),
            ),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Repository::Http(url)),
            "file" => url
                .to_file_path()
                .map(Repository::Local)
                .map_err(|_| Error::ConfigParse {
                    message: format!("Invalid file repository '{}'", address),
                    hint: None,
                }),
            scheme => Err(Error::ConfigParse {
                message: format!("Unsupported repository scheme '{}' in '{}'", scheme, address),
                hint: Some("Supported schemes are http, https, oci and file".to_string()),
            }),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Repository::Local(_))
    }
}

/// Fetches charts through a provider, caching remote charts on disk.
pub struct ChartManager {
    provider: Box<dyn ChartProvider>,
    cache: Option<ChartCache>,
    refresh: bool,
}

impl ChartManager {
    /// Create a manager for `repository`.
    ///
    /// Local repositories are read directly. Remote charts are cached under
    /// `cache_root`; with `refresh` set, cached entries are ignored and
    /// overwritten.
    pub fn for_repository(repository: &Repository, cache_root: PathBuf, refresh: bool) -> Self {
        match repository {
            Repository::Local(_) => Self {
                provider: Box::new(LocalProvider),
                cache: None,
                refresh,
            },
            Repository::Http(_) | Repository::Oci(_) => Self {
                provider: Box::new(HelmProvider::new()),
                cache: Some(ChartCache::new(cache_root)),
                refresh,
            },
        }
    }

    /// Create a manager with a custom provider.
    pub fn with_provider(provider: Box<dyn ChartProvider>, cache: Option<ChartCache>, refresh: bool) -> Self {
        Self {
            provider,
            cache,
            refresh,
        }
    }

    pub fn fetch(&self, repository: &str, name: &str, version: &str) -> Result<Chart> {
        let Some(cache) = &self.cache else {
            return self.provider.fetch(repository, name, version);
        };

        if !self.refresh && cache.contains(repository, name, version) {
            debug!("Using cached {}@{}", name, version);
            return cache.load(repository, name, version);
        }

        info!("Fetching {}@{} from {}", name, version, repository);
        let chart = self.provider.fetch(repository, name, version)?;
        if let Err(err) = cache.store(repository, name, version, &chart) {
            warn!("Could not cache {}@{}: {}", name, version, err);
        }
        Ok(chart)
    }
}

/// Build a retrieval error for a chart version.
pub(crate) fn retrieval_error(
    repository: &str,
    name: &str,
    version: &str,
    message: impl Into<String>,
    hint: Option<&str>,
) -> Error {
    Error::Retrieval {
        repository: repository.to_string(),
        chart: name.to_string(),
        version: version.to_string(),
        message: message.into(),
        hint: hint.map(str::to_string),
    }
}
