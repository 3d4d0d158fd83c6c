use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dd_diff::{diff_asset, diff_json_file};
use dd_types::Version;
use tracing::{debug, info, warn};

use crate::classify::FileCategory;
use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};
use crate::report::DiffReport;

/// The release a pair is diffed against, with its extracted tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviousRelease {
    pub version: Version,
    pub folder: PathBuf,
}

impl PreviousRelease {
    pub fn new(version: Version, folder: impl Into<PathBuf>) -> Self {
        Self {
            version,
            folder: folder.into(),
        }
    }
}

/// Walks one release tree and writes its diff bundle.
///
/// Cheap to clone; clones share the configuration. Different pairs may run
/// concurrently because each writes only below its own version directory.
#[derive(Clone, Debug)]
pub struct DiffDriver {
    config: Arc<DriverConfig>,
}

impl DiffDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Output directory for a release: `<output_root>/<version>`.
    pub fn output_dir(&self, version: &Version) -> PathBuf {
        self.config.output_root.join(version.to_string())
    }

    /// Diff `next_folder` against `previous` on the blocking thread pool.
    ///
    /// `previous` is `None` for the first release processed; every file is
    /// then copied into the bundle as-is.
    pub async fn run(
        &self,
        previous: Option<PreviousRelease>,
        next: Version,
        next_folder: PathBuf,
    ) -> DriverResult<DiffReport> {
        let driver = self.clone();
        tokio::task::spawn_blocking(move || driver.run_blocking(previous.as_ref(), next, &next_folder))
            .await
            .map_err(|e| DriverError::TaskFailed(e.to_string()))?
    }

    /// Synchronous traversal. Per-file failures are recorded in the report
    /// and never stop the walk; only output preparation errors are fatal.
    pub fn run_blocking(
        &self,
        previous: Option<&PreviousRelease>,
        next: Version,
        next_folder: &Path,
    ) -> DriverResult<DiffReport> {
        if !next_folder.is_dir() {
            return Err(DriverError::MissingSource(next_folder.to_path_buf()));
        }
        let out_dir = self.prepare_output(&next)?;
        match previous {
            Some(p) => info!(previous = %p.version, next = %next, "diffing release"),
            None => info!(next = %next, "copying base release"),
        }

        let mut report = DiffReport::new(previous.map(|p| p.version), next);
        let mut queue = VecDeque::from([(next_folder.to_path_buf(), PathBuf::new())]);
        // Canonical paths of queued directories. Symlinks are followed, so
        // a link back to an ancestor would otherwise loop forever.
        let mut visited = HashSet::new();
        if let Ok(root) = fs::canonicalize(next_folder) {
            visited.insert(root);
        }

        while let Some((dir, rel_dir)) = queue.pop_front() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = ?dir, error = %e, "cannot list directory");
                    report.record_failure(rel_dir, e);
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(path = ?dir, error = %e, "cannot read directory entry");
                        report.record_failure(rel_dir.clone(), e);
                        continue;
                    }
                };
                let path = entry.path();
                let rel = rel_dir.join(entry.file_name());

                let metadata = match fs::metadata(&path) {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(path = ?rel, error = %e, "cannot stat entry");
                        report.record_failure(rel, e);
                        continue;
                    }
                };

                if metadata.is_dir() {
                    let canonical = match fs::canonicalize(&path) {
                        Ok(canonical) => canonical,
                        Err(e) => {
                            warn!(path = ?rel, error = %e, "cannot resolve directory");
                            report.record_failure(rel, e);
                            continue;
                        }
                    };
                    if !visited.insert(canonical) {
                        warn!(path = ?rel, "directory already visited through another link; skipping");
                        continue;
                    }
                    let mirrored = out_dir.join(&rel);
                    match fs::create_dir_all(&mirrored) {
                        Ok(()) => report.directories += 1,
                        Err(e) => {
                            warn!(path = ?mirrored, error = %e, "cannot mirror directory");
                            report.record_failure(rel.clone(), e);
                        }
                    }
                    queue.push_back((path, rel));
                } else if metadata.is_file() {
                    self.diff_file(previous, &next, &path, &rel, &out_dir, &mut report);
                }
            }
        }

        info!(
            next = %next,
            written = report.files_written(),
            failures = report.failures.len(),
            unrecognized = report.unrecognized.len(),
            "release diff complete"
        );
        Ok(report)
    }

    /// Create `<output_root>/<next>` fresh. An existing directory for the
    /// same release is removed first: runs are never incremental.
    fn prepare_output(&self, next: &Version) -> DriverResult<PathBuf> {
        let root = &self.config.output_root;
        fs::create_dir_all(root).map_err(|source| DriverError::Output {
            path: root.clone(),
            source,
        })?;

        let out_dir = self.output_dir(next);
        let result = if out_dir.exists() {
            warn!(path = ?out_dir, version = %next, "output directory exists; removing it and rebuilding");
            fs::remove_dir_all(&out_dir).and_then(|()| fs::create_dir(&out_dir))
        } else {
            fs::create_dir(&out_dir)
        };
        result.map_err(|source| DriverError::Output {
            path: out_dir.clone(),
            source,
        })?;
        Ok(out_dir)
    }

    fn diff_file(
        &self,
        previous: Option<&PreviousRelease>,
        next: &Version,
        path: &Path,
        rel: &Path,
        out_dir: &Path,
        report: &mut DiffReport,
    ) {
        let output = out_dir.join(rel);
        let previous_path = previous.map(|p| p.folder.join(previous_relative_path(rel, next, &p.version)));

        match self.config.classifier.classify(rel) {
            FileCategory::Structured => match diff_json_file(previous_path.as_deref(), path, &output) {
                Ok(outcome) => {
                    debug!(path = ?rel, ?outcome, "structured document");
                    report.record_structured(outcome);
                }
                Err(e) => {
                    warn!(path = ?rel, error = %e, "structured diff failed");
                    report.record_failure(rel.to_path_buf(), e);
                }
            },
            FileCategory::Image => match diff_asset(previous_path.as_deref(), path, &output) {
                Ok(outcome) => {
                    debug!(path = ?rel, ?outcome, "asset");
                    report.record_asset(outcome);
                }
                Err(e) => {
                    warn!(path = ?rel, error = %e, "asset diff failed");
                    report.record_failure(rel.to_path_buf(), e);
                }
            },
            FileCategory::Ignored => report.ignored += 1,
            FileCategory::Unrecognized => {
                warn!(path = ?rel, "unrecognized file extension; skipping");
                report.unrecognized.push(rel.to_path_buf());
            }
        }
    }
}

/// Map a path relative to the next release's root onto the previous release.
///
/// Release archives embed their version in directory names
/// (`9.2.1/data/...`, `dragontail-9.2.1/...`). Every occurrence of the next
/// version that is not part of a longer version number is replaced by the
/// previous version.
pub fn previous_relative_path(rel: &Path, next: &Version, previous: &Version) -> PathBuf {
    let from = next.to_string();
    let to = previous.to_string();
    rel.components()
        .map(|component| match component {
            Component::Normal(name) => match name.to_str() {
                Some(text) => OsString::from(replace_version(text, &from, &to)),
                None => name.to_os_string(),
            },
            other => other.as_os_str().to_os_string(),
        })
        .collect()
}

fn replace_version(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for (idx, _) in text.match_indices(from) {
        let end = idx + from.len();
        let mut before = text[..idx].chars().rev();
        let mut after = text[end..].chars();
        if extends_version(before.next(), before.next()) || extends_version(after.next(), after.next()) {
            continue;
        }
        out.push_str(&text[copied..idx]);
        out.push_str(to);
        copied = end;
    }
    out.push_str(&text[copied..]);
    out
}

/// Whether the character next to a match (and the one beyond it) would make
/// the match part of a longer version number, e.g. `9.2.1` inside `9.2.10`.
fn extends_version(neighbor: Option<char>, beyond: Option<char>) -> bool {
    match neighbor {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => matches!(beyond, Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::parse(text).unwrap()
    }

    #[test]
    fn previous_path_swaps_version_directories() {
        let rel = Path::new("9.2.1/data/en_US/champion.json");
        assert_eq!(
            previous_relative_path(rel, &v("9.2.1"), &v("9.1.1")),
            PathBuf::from("9.1.1/data/en_US/champion.json")
        );
    }

    #[test]
    fn previous_path_swaps_embedded_versions() {
        let rel = Path::new("dragontail-9.2.1/img/Ashe.png");
        assert_eq!(
            previous_relative_path(rel, &v("9.2.1"), &v("9.1.1")),
            PathBuf::from("dragontail-9.1.1/img/Ashe.png")
        );
    }

    #[test]
    fn previous_path_leaves_longer_versions_alone() {
        let rel = Path::new("9.2.10/lolpatch_9.2.1.5/9.2.1.json");
        assert_eq!(
            previous_relative_path(rel, &v("9.2.1"), &v("9.1.1")),
            PathBuf::from("9.2.10/lolpatch_9.2.1.5/9.1.1.json")
        );
    }

    #[test]
    fn previous_path_without_versions_is_unchanged() {
        let rel = Path::new("img/champion/Ashe.png");
        assert_eq!(previous_relative_path(rel, &v("9.2.1"), &v("9.1.1")), rel.to_path_buf());
    }

    #[test]
    fn missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let driver = DiffDriver::new(DriverConfig::new(dir.path().join("out")));
        let err = driver
            .run_blocking(None, v("9.1.1"), &dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, DriverError::MissingSource(_)));
    }

    #[test]
    fn existing_output_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.json"), br#"{"a":1}"#).unwrap();

        let driver = DiffDriver::new(DriverConfig::new(dir.path().join("out")));
        let stale = driver.output_dir(&v("9.1.1")).join("stale.json");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"{}").unwrap();

        driver.run_blocking(None, v("9.1.1"), &source).unwrap();
        assert!(!stale.exists());
        assert!(driver.output_dir(&v("9.1.1")).join("a.json").exists());
    }

    #[test]
    fn per_file_failures_do_not_stop_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let prev = dir.path().join("prev");
        let next = dir.path().join("next");
        fs::create_dir_all(&prev).unwrap();
        fs::create_dir_all(&next).unwrap();
        fs::write(prev.join("bad.json"), b"{oops").unwrap();
        fs::write(next.join("bad.json"), br#"{"a":1}"#).unwrap();
        fs::write(next.join("good.json"), br#"{"a":1}"#).unwrap();
        fs::write(next.join("notes.xyz"), b"?").unwrap();
        fs::write(next.join("app.js"), b"//").unwrap();

        let driver = DiffDriver::new(DriverConfig::new(dir.path().join("out")));
        let report = driver
            .run_blocking(Some(&PreviousRelease::new(v("9.1.1"), &prev)), v("9.2.1"), &next)
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("bad.json"));
        assert_eq!(report.structured_written, 1);
        assert_eq!(report.unrecognized, vec![PathBuf::from("notes.xyz")]);
        assert_eq!(report.ignored, 1);
        let out = driver.output_dir(&v("9.2.1"));
        assert!(out.join("good.json").exists());
        assert!(!out.join("bad.json").exists());
        assert!(!out.join("app.js").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_walked_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::write(source.join("a/x.json"), br#"{"a":1}"#).unwrap();
        std::os::unix::fs::symlink(&source, source.join("a/loop")).unwrap();

        let driver = DiffDriver::new(DriverConfig::new(dir.path().join("out")));
        let report = driver.run_blocking(None, v("9.1.1"), &source).unwrap();

        assert_eq!(report.directories, 1);
        assert_eq!(report.structured_written, 1);
        assert!(report.is_clean());
        assert!(!driver.output_dir(&v("9.1.1")).join("a/loop").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_elsewhere_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("icon.png"), b"pixels").unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        std::os::unix::fs::symlink(&shared, source.join("img")).unwrap();

        let driver = DiffDriver::new(DriverConfig::new(dir.path().join("out")));
        let report = driver.run_blocking(None, v("9.1.1"), &source).unwrap();

        assert_eq!(report.assets_copied, 1);
        assert!(driver.output_dir(&v("9.1.1")).join("img/icon.png").exists());
    }

    #[tokio::test]
    async fn async_run_matches_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(source.join("img")).unwrap();
        fs::write(source.join("img/a.png"), b"pixels").unwrap();

        let driver = DiffDriver::new(DriverConfig::new(dir.path().join("out")));
        let report = driver.run(None, v("9.1.1"), source).await.unwrap();
        assert_eq!(report.assets_copied, 1);
        assert_eq!(report.directories, 1);
    }
}
