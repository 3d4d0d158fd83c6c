//! Diff engine for DiffDragon.
//!
//! Compares one file of the previous release with the same file of the next
//! release and decides what, if anything, belongs in the diff bundle.
//! Only additions and changes are reported; removals never are.
//!
//! # Key Types
//!
//! - [`diff_documents`] -- Minimal JSON patch between two parsed documents
//! - [`diff_json_file`] / [`JsonFileOutcome`] -- File-level wrapper writing the patch
//! - [`diff_asset`] / [`AssetOutcome`] / [`AssetAction`] -- Whole-file binary comparison

pub mod asset_diff;
pub mod error;
pub mod json_diff;

pub use asset_diff::{compare_assets, copy_asset, diff_asset, AssetAction, AssetOutcome};
pub use error::{DiffError, DiffResult};
pub use json_diff::{diff_documents, diff_json_file, JsonFileOutcome, VERSION_KEY};
