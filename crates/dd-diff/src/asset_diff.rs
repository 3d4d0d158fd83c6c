//! Binary asset diff: whole-file equality by content digest.
//!
//! Assets are never patched. Either the next release's bytes are copied into
//! the bundle verbatim, or the asset is skipped.

use std::fs;
use std::path::Path;

use dd_crypto::ContentHasher;
use tracing::debug;

use crate::error::{DiffError, DiffResult};
use crate::json_diff::ensure_parent;

/// What to do with an asset in the diff bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetAction {
    /// Copy the next release's bytes into the bundle.
    Copy,
    /// Leave the asset out of the bundle.
    Skip,
}

/// Why an asset was copied or skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetOutcome {
    /// No previous release, or the asset did not exist in it.
    New,
    /// Both releases have the asset and the digests differ.
    Changed,
    /// Both releases have the asset with identical content.
    Unchanged,
    /// The asset is absent from the next release.
    Removed,
}

impl AssetOutcome {
    pub fn action(&self) -> AssetAction {
        match self {
            Self::New | Self::Changed => AssetAction::Copy,
            Self::Unchanged | Self::Removed => AssetAction::Skip,
        }
    }
}

/// Decide whether the asset at `next` differs from the one at `previous`.
///
/// `previous` is `None` when there is no previous release at all. Does not
/// touch the output tree.
pub fn compare_assets(previous: Option<&Path>, next: &Path) -> DiffResult<AssetOutcome> {
    if !next.exists() {
        return Ok(AssetOutcome::Removed);
    }
    let Some(previous) = previous.filter(|p| p.exists()) else {
        return Ok(AssetOutcome::New);
    };

    let previous_digest = ContentHasher::ASSET.hash_file(previous)?;
    let next_digest = ContentHasher::ASSET.hash_file(next)?;
    debug!(previous = %previous_digest.short_hex(), next = %next_digest.short_hex(), path = ?next, "asset digests");

    if previous_digest == next_digest {
        Ok(AssetOutcome::Unchanged)
    } else {
        Ok(AssetOutcome::Changed)
    }
}

/// Copy an asset's bytes verbatim, creating parent directories as needed.
/// Returns the number of bytes copied.
pub fn copy_asset(next: &Path, output: &Path) -> DiffResult<u64> {
    ensure_parent(output)?;
    fs::copy(next, output).map_err(|e| DiffError::io(output, e))
}

/// Compare an asset and, when it is new or changed, copy it to `output`.
pub fn diff_asset(previous: Option<&Path>, next: &Path, output: &Path) -> DiffResult<AssetOutcome> {
    let outcome = compare_assets(previous, next)?;
    if outcome.action() == AssetAction::Copy {
        copy_asset(next, output)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(seed: u8) -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend((0..=255u8).map(|b| b.wrapping_mul(seed)));
        bytes
    }

    #[test]
    fn no_previous_release_copies() {
        let dir = tempfile::tempdir().unwrap();
        let next = dir.path().join("next.png");
        let out = dir.path().join("out/img/next.png");
        fs::write(&next, png_bytes(3)).unwrap();

        assert_eq!(diff_asset(None, &next, &out).unwrap(), AssetOutcome::New);
        assert_eq!(fs::read(&out).unwrap(), png_bytes(3));
    }

    #[test]
    fn missing_previous_file_copies() {
        let dir = tempfile::tempdir().unwrap();
        let next = dir.path().join("next.png");
        fs::write(&next, png_bytes(3)).unwrap();

        let outcome = compare_assets(Some(&dir.path().join("prev.png")), &next).unwrap();
        assert_eq!(outcome, AssetOutcome::New);
        assert_eq!(outcome.action(), AssetAction::Copy);
    }

    #[test]
    fn identical_content_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let prev = dir.path().join("Ashe_P.png");
        let next = dir.path().join("Ashe_P_renamed.png");
        let out = dir.path().join("out.png");
        fs::write(&prev, png_bytes(5)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(&next, png_bytes(5)).unwrap();

        assert_eq!(diff_asset(Some(&prev), &next, &out).unwrap(), AssetOutcome::Unchanged);
        assert!(!out.exists());
    }

    #[test]
    fn changed_content_copies_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let prev = dir.path().join("prev.png");
        let next = dir.path().join("next.png");
        let out = dir.path().join("out.png");
        fs::write(&prev, png_bytes(5)).unwrap();
        fs::write(&next, png_bytes(7)).unwrap();

        assert_eq!(diff_asset(Some(&prev), &next, &out).unwrap(), AssetOutcome::Changed);
        assert_eq!(fs::read(&out).unwrap(), png_bytes(7));
    }

    #[test]
    fn removed_asset_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let prev = dir.path().join("prev.png");
        let out = dir.path().join("out.png");
        fs::write(&prev, png_bytes(5)).unwrap();

        let outcome = diff_asset(Some(&prev), &dir.path().join("next.png"), &out).unwrap();
        assert_eq!(outcome, AssetOutcome::Removed);
        assert_eq!(outcome.action(), AssetAction::Skip);
        assert!(!out.exists());
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let next = dir.path().join("next.png");
        fs::write(&next, png_bytes(1)).unwrap();
        // A regular file where the output's parent directory should be.
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();

        let err = diff_asset(None, &next, &blocker.join("out.png")).unwrap_err();
        assert!(matches!(err, DiffError::Io { .. }));
    }
}
