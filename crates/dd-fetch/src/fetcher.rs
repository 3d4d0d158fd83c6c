use std::fs::{self, File};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dd_types::Version;
use flate2::read::GzDecoder;
use reqwest::{Client, StatusCode};
use tar::Archive;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::{FetchError, FetchResult};

/// Makes one release's extracted tree available on disk.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Return the folder holding the fully extracted release.
    ///
    /// Implementations skip all work when the folder already exists.
    async fn fetch(&self, version: &Version) -> FetchResult<PathBuf>;
}

/// Downloads `dragontail-<version>.tgz` and extracts it under the download
/// root.
///
/// The archive is streamed to a `.part` file, unpacked into a staging
/// directory and only then renamed into place, so a destination that exists
/// is always complete.
pub struct ArchiveFetcher {
    client: Client,
    config: FetchConfig,
}

impl ArchiveFetcher {
    pub fn new(config: FetchConfig) -> FetchResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    /// Extracted folder for a release.
    pub fn destination(&self, version: &Version) -> PathBuf {
        self.config.download_root.join(format!("dragontail-{version}"))
    }

    pub fn archive_url(&self, version: &Version) -> String {
        self.config
            .archive_url_template
            .replace("{version}", &version.to_string())
    }

    async fn download(&self, version: &Version, target: &Path) -> FetchResult<u64> {
        let url = self.archive_url(version);
        let mut response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| FetchError::io(target, e))?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(target, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| FetchError::io(target, e))?;
        debug!(%url, bytes = written, "archive downloaded");
        Ok(written)
    }
}

#[async_trait]
impl Fetcher for ArchiveFetcher {
    async fn fetch(&self, version: &Version) -> FetchResult<PathBuf> {
        let destination = self.destination(version);
        if destination.exists() {
            debug!(%version, path = ?destination, "release already extracted");
            return Ok(destination);
        }

        let root = &self.config.download_root;
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| FetchError::io(root, e))?;

        let archive = root.join(format!("dragontail-{version}.tgz.part"));
        info!(%version, url = %self.archive_url(version), "downloading release");
        self.download(version, &archive).await?;

        let staging = root.join(format!("dragontail-{version}.partial"));
        let (archive_path, staging_path) = (archive.clone(), staging.clone());
        tokio::task::spawn_blocking(move || extract_archive(&archive_path, &staging_path))
            .await
            .map_err(|e| FetchError::TaskFailed(e.to_string()))??;

        tokio::fs::rename(&staging, &destination)
            .await
            .map_err(|e| FetchError::io(&destination, e))?;
        tokio::fs::remove_file(&archive)
            .await
            .map_err(|e| FetchError::io(&archive, e))?;

        info!(%version, path = ?destination, "release extracted");
        Ok(destination)
    }
}

/// Unpack a gzip-compressed tarball into `dest`, replacing any leftovers of
/// an earlier interrupted extraction.
pub fn extract_archive(archive: &Path, dest: &Path) -> FetchResult<()> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| FetchError::io(dest, e))?;
    }
    fs::create_dir_all(dest).map_err(|e| FetchError::io(dest, e))?;

    let file = File::open(archive).map_err(|e| FetchError::io(archive, e))?;
    let mut tarball = Archive::new(GzDecoder::new(file));
    tarball.unpack(dest).map_err(|e| FetchError::Archive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn build_archive(path: &Path, files: &[(&str, &[u8])]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn fetcher(root: &Path) -> ArchiveFetcher {
        ArchiveFetcher::new(FetchConfig {
            download_root: root.to_path_buf(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn extracts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("release.tgz");
        build_archive(
            &archive,
            &[
                ("9.2.1/data/en_US/champion.json", &br#"{"a":1}"#[..]),
                ("img/champion/Ashe.png", &b"pixels"[..]),
            ],
        );

        let dest = dir.path().join("out");
        extract_archive(&archive, &dest).unwrap();
        assert_eq!(fs::read(dest.join("9.2.1/data/en_US/champion.json")).unwrap(), br#"{"a":1}"#);
        assert_eq!(fs::read(dest.join("img/champion/Ashe.png")).unwrap(), b"pixels");
    }

    #[test]
    fn extraction_replaces_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("release.tgz");
        build_archive(&archive, &[("a.json", &b"{}"[..])]);
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.json"), b"{}").unwrap();

        extract_archive(&archive, &dest).unwrap();
        assert!(!dest.join("stale.json").exists());
        assert!(dest.join("a.json").exists());
    }

    #[test]
    fn corrupt_archive_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("release.tgz");
        fs::write(&archive, b"definitely not gzip").unwrap();

        let err = extract_archive(&archive, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, FetchError::Archive { .. }));
    }

    #[test]
    fn urls_and_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let f = fetcher(dir.path());
        let v = Version::new(9, 2, 1);
        assert_eq!(
            f.archive_url(&v),
            "https://ddragon.leagueoflegends.com/cdn/dragontail-9.2.1.tgz"
        );
        assert_eq!(f.destination(&v), dir.path().join("dragontail-9.2.1"));
    }

    #[tokio::test]
    async fn existing_destination_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let f = fetcher(dir.path());
        let v = Version::new(9, 2, 1);
        fs::create_dir_all(f.destination(&v)).unwrap();

        // No server is involved: the existing folder short-circuits.
        assert_eq!(f.fetch(&v).await.unwrap(), f.destination(&v));
    }
}
