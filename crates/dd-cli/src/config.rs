use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context};
use dd_driver::{Classifier, DriverConfig};
use dd_fetch::FetchConfig;
use dd_types::Version;
use serde::{Deserialize, Serialize};

/// Oldest release whose archive layout is supported.
pub const MIN_SUPPORTED_VERSION: Version = Version::new(3, 6, 14);

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffDragonConfig {
    pub download_root: PathBuf,
    pub output_root: PathBuf,
    pub min_version: Version,
    pub versions_url: String,
    /// `{version}` is replaced by the canonical version string.
    pub archive_url_template: String,
    pub download_batch_size: usize,
    pub request_timeout_secs: u64,
    /// How long a diff waits for its releases to be extracted.
    pub folder_wait_timeout_secs: u64,
    /// Extensions to ignore on top of the built-in table.
    pub extra_ignored_extensions: Vec<String>,
}

impl Default for DiffDragonConfig {
    fn default() -> Self {
        let fetch = FetchConfig::default();
        Self {
            download_root: PathBuf::from("ddragon"),
            output_root: PathBuf::from("diffdragon"),
            min_version: MIN_SUPPORTED_VERSION,
            versions_url: fetch.versions_url,
            archive_url_template: fetch.archive_url_template,
            download_batch_size: 3,
            request_timeout_secs: fetch.request_timeout.as_secs(),
            folder_wait_timeout_secs: 60 * 60,
            extra_ignored_extensions: Vec::new(),
        }
    }
}

impl DiffDragonConfig {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.download_batch_size > 0, "download_batch_size must be at least 1");
        ensure!(
            self.archive_url_template.contains("{version}"),
            "archive_url_template must contain {{version}}"
        );
        ensure!(self.folder_wait_timeout_secs > 0, "folder_wait_timeout_secs must be positive");
        Ok(())
    }

    pub fn folder_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.folder_wait_timeout_secs)
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            output_root: self.output_root.clone(),
            classifier: Classifier::default().with_ignored(&self.extra_ignored_extensions),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            versions_url: self.versions_url.clone(),
            archive_url_template: self.archive_url_template.clone(),
            download_root: self.download_root.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DiffDragonConfig::default();
        assert_eq!(c.min_version, Version::new(3, 6, 14));
        assert_eq!(c.download_batch_size, 3);
        assert_eq!(c.output_root, PathBuf::from("diffdragon"));
        c.validate().unwrap();
    }

    #[test]
    fn load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diffdragon.toml");
        std::fs::write(
            &path,
            "output_root = \"/srv/diff\"\nmin_version = \"9.1.1\"\nextra_ignored_extensions = [\"skn\"]\n",
        )
        .unwrap();

        let c = DiffDragonConfig::load(&path).unwrap();
        assert_eq!(c.output_root, PathBuf::from("/srv/diff"));
        assert_eq!(c.min_version, Version::new(9, 1, 1));
        assert_eq!(c.download_batch_size, 3);
        assert!(c.driver_config().classifier.ignored.contains("skn"));
    }

    #[test]
    fn load_rejects_bad_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diffdragon.toml");
        std::fs::write(&path, "min_version = \"latest\"\n").unwrap();
        assert!(DiffDragonConfig::load(&path).is_err());
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let c = DiffDragonConfig {
            download_batch_size: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn fetch_config_carries_timeouts() {
        let c = DiffDragonConfig {
            request_timeout_secs: 5,
            ..Default::default()
        };
        assert_eq!(c.fetch_config().request_timeout, Duration::from_secs(5));
        assert_eq!(c.fetch_config().download_root, PathBuf::from("ddragon"));
    }
}
