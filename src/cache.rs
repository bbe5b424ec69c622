//! On-disk cache of fetched chart versions
//!
//! Published chart versions are immutable, so a version fetched once is
//! reused on later runs. Each entry is a directory named after a hash of the
//! repository address, the chart name and the version, holding the chart's
//! `values.yaml` and `Chart.yaml`.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::chart::Chart;
use crate::error::{Error, Result};

const VALUES_FILE: &str = "values.yaml";
const METADATA_FILE: &str = "Chart.yaml";

#[derive(Debug, Clone)]
pub struct ChartCache {
    root: PathBuf,
}

impl ChartCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the cache entry for a chart version.
    pub fn entry_path(&self, repository: &str, name: &str, version: &str) -> PathBuf {
        // Hash the repository address for a filesystem-safe directory name
        let mut hasher = DefaultHasher::new();
        repository.trim_end_matches('/').hash(&mut hasher);
        let repository_hash = format!("{:x}", hasher.finish());

        let safe = |part: &str| part.replace(&['/', '\\'][..], "-");
        self.root
            .join(format!("{}-{}-{}", repository_hash, safe(name), safe(version)))
    }

    pub fn contains(&self, repository: &str, name: &str, version: &str) -> bool {
        self.entry_path(repository, name, version)
            .join(VALUES_FILE)
            .is_file()
    }

    pub fn load(&self, repository: &str, name: &str, version: &str) -> Result<Chart> {
        let dir = self.entry_path(repository, name, version);
        let read = |file: &str| {
            fs::read_to_string(dir.join(file)).map_err(|e| Error::Cache {
                message: format!("Failed to read {}: {}", dir.join(file).display(), e),
            })
        };

        let values = read(VALUES_FILE)?;
        let metadata = read(METADATA_FILE)?;
        Chart::from_sources(name, version, &values, Some(&metadata)).map_err(|e| Error::Cache {
            message: format!("Corrupt cache entry {}: {}", dir.display(), e),
        })
    }

    pub fn store(&self, repository: &str, name: &str, version: &str, chart: &Chart) -> Result<()> {
        let dir = self.entry_path(repository, name, version);
        let cache_error = |message: String| Error::Cache {
            message: format!("Failed to write {}: {}", dir.display(), message),
        };

        fs::create_dir_all(&dir).map_err(|e| cache_error(e.to_string()))?;
        let values = serde_yaml::to_string(&chart.values).map_err(|e| cache_error(e.to_string()))?;
        let metadata = serde_yaml::to_string(&chart.metadata).map_err(|e| cache_error(e.to_string()))?;
        // Metadata first: an entry counts as present once values.yaml exists.
        fs::write(dir.join(METADATA_FILE), metadata).map_err(|e| cache_error(e.to_string()))?;
        fs::write(dir.join(VALUES_FILE), values).map_err(|e| cache_error(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartMetadata;

    fn chart() -> Chart {
        Chart {
            metadata: ChartMetadata {
                name: "demo".to_string(),
                version: "1.0.0".to_string(),
                app_version: Some("2.0".to_string()),
                description: None,
            },
            values: serde_yaml::from_str("{replicas: 1, image: {tag: v1}}").unwrap(),
        }
    }

    #[test]
    fn test_entry_path_is_stable_and_distinct() {
        let cache = ChartCache::new(PathBuf::from("/cache"));
        let a = cache.entry_path("https://charts.example.com", "demo", "1.0.0");
        assert_eq!(a, cache.entry_path("https://charts.example.com/", "demo", "1.0.0"));
        assert_ne!(a, cache.entry_path("https://other.example.com", "demo", "1.0.0"));
        assert_ne!(a, cache.entry_path("https://charts.example.com", "demo", "1.0.1"));
        assert!(a.starts_with("/cache"));
        assert!(a.to_string_lossy().ends_with("-demo-1.0.0"));
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChartCache::new(dir.path().to_path_buf());
        assert!(!cache.contains("repo", "demo", "1.0.0"));

        cache.store("repo", "demo", "1.0.0", &chart()).unwrap();
        assert!(cache.contains("repo", "demo", "1.0.0"));
        assert_eq!(cache.load("repo", "demo", "1.0.0").unwrap(), chart());
    }

    #[test]
    fn test_load_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChartCache::new(dir.path().to_path_buf());
        assert!(matches!(
            cache.load("repo", "demo", "1.0.0"),
            Err(Error::Cache { .. })
        ));
    }

    #[test]
    fn test_corrupt_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChartCache::new(dir.path().to_path_buf());
        cache.store("repo", "demo", "1.0.0", &chart()).unwrap();
        let entry = cache.entry_path("repo", "demo", "1.0.0");
        fs::write(entry.join(VALUES_FILE), "a: [unclosed").unwrap();

        let err = cache.load("repo", "demo", "1.0.0").unwrap_err();
        assert!(format!("{}", err).contains("Corrupt cache entry"));
    }
}
