use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classify::Classifier;

/// Configuration for the release tree walker.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Root of the diff bundle. Each processed release gets one subdirectory
    /// named by its canonical version string.
    pub output_root: PathBuf,
    /// Extension table deciding which comparator handles a file.
    pub classifier: Classifier,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("diffdragon"),
            classifier: Classifier::default(),
        }
    }
}

impl DriverConfig {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DriverConfig::default();
        assert_eq!(c.output_root, PathBuf::from("diffdragon"));
        assert_eq!(c.classifier, Classifier::default());
    }

    #[test]
    fn new_keeps_default_classifier() {
        let c = DriverConfig::new("/tmp/out");
        assert_eq!(c.output_root, PathBuf::from("/tmp/out"));
        assert!(c.classifier.structured.contains("json"));
    }
}
