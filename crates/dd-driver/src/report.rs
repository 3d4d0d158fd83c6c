use std::path::PathBuf;

use dd_diff::{AssetOutcome, JsonFileOutcome};
use dd_types::Version;
use serde::Serialize;

/// A file that could not be diffed. The traversal continued past it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Path relative to the release root.
    pub path: PathBuf,
    pub error: String,
}

/// Summary of one release pair's traversal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub previous: Option<Version>,
    pub next: Version,
    /// Directories mirrored into the output tree (the root excluded).
    pub directories: usize,
    /// Structured documents written to the bundle, patched or copied whole.
    pub structured_written: usize,
    pub structured_unchanged: usize,
    pub assets_copied: usize,
    pub assets_skipped: usize,
    pub ignored: usize,
    /// Relative paths whose extension is not in the classifier table.
    pub unrecognized: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl DiffReport {
    pub fn new(previous: Option<Version>, next: Version) -> Self {
        Self {
            previous,
            next,
            directories: 0,
            structured_written: 0,
            structured_unchanged: 0,
            assets_copied: 0,
            assets_skipped: 0,
            ignored: 0,
            unrecognized: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of files that ended up in the bundle.
    pub fn files_written(&self) -> usize {
        self.structured_written + self.assets_copied
    }

    /// Returns `true` if every file was processed without error.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record_structured(&mut self, outcome: JsonFileOutcome) {
        match outcome {
            JsonFileOutcome::Copied | JsonFileOutcome::Written => self.structured_written += 1,
            JsonFileOutcome::Unchanged | JsonFileOutcome::NextMissing => self.structured_unchanged += 1,
        }
    }

    pub(crate) fn record_asset(&mut self, outcome: AssetOutcome) {
        match outcome {
            AssetOutcome::New | AssetOutcome::Changed => self.assets_copied += 1,
            AssetOutcome::Unchanged | AssetOutcome::Removed => self.assets_skipped += 1,
        }
    }

    pub(crate) fn record_failure(&mut self, path: PathBuf, error: impl ToString) {
        self.failures.push(FileFailure {
            path,
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_outcomes() {
        let mut report = DiffReport::new(None, Version::new(9, 1, 1));
        report.record_structured(JsonFileOutcome::Copied);
        report.record_structured(JsonFileOutcome::Unchanged);
        report.record_asset(AssetOutcome::Changed);
        report.record_asset(AssetOutcome::Unchanged);
        report.record_asset(AssetOutcome::Removed);

        assert_eq!(report.files_written(), 2);
        assert_eq!(report.structured_unchanged, 1);
        assert_eq!(report.assets_skipped, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn failures_make_report_unclean() {
        let mut report = DiffReport::new(Some(Version::new(9, 1, 1)), Version::new(9, 2, 1));
        report.record_failure("data/bad.json".into(), "malformed");
        assert!(!report.is_clean());
        assert_eq!(report.failures[0].path, PathBuf::from("data/bad.json"));
    }

    #[test]
    fn serializes_versions_as_strings() {
        let report = DiffReport::new(Some(Version::new(9, 1, 1)), Version::new(9, 2, 1));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["previous"], "9.1.1");
        assert_eq!(json["next"], "9.2.1");
    }
}
