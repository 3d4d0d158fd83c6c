use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use dd_types::{versions_since, Version};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Source of the release history to process.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// All releases not older than `min`, oldest first.
    async fn versions(&self, min: &Version) -> FetchResult<Vec<Version>>;
}

/// Reads the version log from an HTTP endpoint.
pub struct HttpVersionSource {
    client: Client,
    url: String,
}

impl HttpVersionSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl VersionSource for HttpVersionSource {
    async fn versions(&self, min: &Version) -> FetchResult<Vec<Version>> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }
        let log: Vec<Value> = response.json().await?;
        debug!(url = %self.url, entries = log.len(), "fetched version log");
        Ok(history_from_log(&log, min))
    }
}

/// Reads the version log from a local JSON file, for offline runs.
pub struct FileVersionSource {
    path: PathBuf,
}

impl FileVersionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VersionSource for FileVersionSource {
    async fn versions(&self, min: &Version) -> FetchResult<Vec<Version>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| FetchError::io(&self.path, e))?;
        let log: Vec<Value> = serde_json::from_slice(&bytes)?;
        Ok(history_from_log(&log, min))
    }
}

/// Non-string entries end the usable history, same as unparsable strings.
fn history_from_log(log: &[Value], min: &Version) -> Vec<Version> {
    let names: Vec<&str> = log.iter().map(|v| v.as_str().unwrap_or_default()).collect();
    versions_since(&names, min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_string_entry_stops_history() {
        let log = vec![json!("9.2.1"), json!(42), json!("9.1.1")];
        assert_eq!(history_from_log(&log, &Version::new(0, 0, 0)), vec![Version::new(9, 2, 1)]);
    }

    #[tokio::test]
    async fn file_source_reads_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versions.json");
        std::fs::write(&path, br#"["9.3.1","9.2.1","3.6.14","3.6.13","lolpatch_3.7"]"#).unwrap();

        let source = FileVersionSource::new(&path);
        let versions = source.versions(&Version::new(3, 6, 14)).await.unwrap();
        assert_eq!(
            versions,
            vec![Version::new(3, 6, 14), Version::new(9, 2, 1), Version::new(9, 3, 1)]
        );
    }

    #[tokio::test]
    async fn file_source_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versions.json");
        std::fs::write(&path, br#"{"latest":"9.3.1"}"#).unwrap();

        let err = FileVersionSource::new(&path)
            .versions(&Version::new(0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::VersionLog(_)));
    }

    #[tokio::test]
    async fn file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileVersionSource::new(dir.path().join("nope.json"))
            .versions(&Version::new(0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
