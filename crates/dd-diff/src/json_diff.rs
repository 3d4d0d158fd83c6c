//! Structural diff: compare two JSON documents and keep only what changed.
//!
//! The patch contains every key of `next` whose value was added or changed,
//! with nested objects diffed recursively. Arrays are diffed element by
//! element and patched as an object keyed by index. Keys and elements
//! removed from `previous` are never reported. A patch whose only content is the `"version"` stamp
//! collapses to nothing.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{DiffError, DiffResult};

/// Key carrying the per-file release stamp. It is written into patches that
/// have other changes but never makes a patch non-empty on its own.
pub const VERSION_KEY: &str = "version";

/// Compute the patch that takes `previous` to `next`.
///
/// Returns `None` when there is nothing to report: `next` is absent, or no
/// key other than [`VERSION_KEY`] was added or changed.
///
/// Object roots are diffed key by key, and an array root is diffed by index
/// against an array. Any other root is treated as a single value: equal
/// roots yield `None`, otherwise the patch is `next` itself.
pub fn diff_documents(previous: Option<&Value>, next: Option<&Value>) -> Option<Value> {
    let next = next?;
    match (previous, next) {
        (previous, Value::Object(next_map)) => {
            diff_objects(previous.and_then(Value::as_object), next_map).map(Value::Object)
        }
        (Some(Value::Array(previous)), Value::Array(next)) => diff_arrays(previous, next).map(Value::Object),
        (previous, next) if previous == Some(next) => None,
        (_, next) => Some(next.clone()),
    }
}

fn diff_objects(previous: Option<&Map<String, Value>>, next: &Map<String, Value>) -> Option<Map<String, Value>> {
    let mut patch = Map::new();
    let mut has_changes = false;

    for (key, next_value) in next {
        let previous_value = previous.and_then(|map| map.get(key));
        let Some(staged) = diff_value(previous_value, next_value) else {
            continue;
        };
        if key != VERSION_KEY {
            has_changes = true;
        }
        patch.insert(key.clone(), staged);
    }

    has_changes.then_some(patch)
}

/// Elements are matched by position. The patch is keyed by the index of
/// each added or changed element; trailing elements dropped from `previous`
/// are not reported.
fn diff_arrays(previous: &[Value], next: &[Value]) -> Option<Map<String, Value>> {
    let mut patch = Map::new();
    for (index, next_value) in next.iter().enumerate() {
        if let Some(staged) = diff_value(previous.get(index), next_value) {
            patch.insert(index.to_string(), staged);
        }
    }
    (!patch.is_empty()).then_some(patch)
}

/// Diff one key's value. Objects and arrays recurse when both sides have the
/// same shape; everything else is compared as a whole and staged in full
/// when it differs.
fn diff_value(previous: Option<&Value>, next: &Value) -> Option<Value> {
    match (previous, next) {
        (None, next) => Some(next.clone()),
        (Some(Value::Object(previous)), Value::Object(next)) => {
            diff_objects(Some(previous), next).map(Value::Object)
        }
        (Some(Value::Array(previous)), Value::Array(next)) => diff_arrays(previous, next).map(Value::Object),
        (Some(previous), next) if previous == next => None,
        (Some(_), next) => Some(next.clone()),
    }
}

/// What the file-level wrapper did with one structured document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonFileOutcome {
    /// No previous release exists; the file was copied verbatim.
    Copied,
    /// A non-empty patch was written to the output location.
    Written,
    /// The documents differ in nothing worth reporting.
    Unchanged,
    /// The next file does not exist, so there is nothing to diff.
    NextMissing,
}

/// Diff one structured document on disk and write the patch, if any.
///
/// - `previous`: location of the file in the previous release, or `None`
///   when this is the first release processed. In that case `next` is copied
///   verbatim to `output`.
/// - A `previous` location whose file does not exist is read as an empty
///   object, so every key of `next` counts as an addition.
/// - Parse failures on either side are returned as
///   [`DiffError::MalformedDocument`].
pub fn diff_json_file(previous: Option<&Path>, next: &Path, output: &Path) -> DiffResult<JsonFileOutcome> {
    if !next.exists() {
        return Ok(JsonFileOutcome::NextMissing);
    }

    let Some(previous) = previous else {
        ensure_parent(output)?;
        fs::copy(next, output).map_err(|e| DiffError::io(output, e))?;
        return Ok(JsonFileOutcome::Copied);
    };

    let previous_doc = if previous.exists() {
        read_document(previous)?
    } else {
        debug!(path = ?previous, "no previous document, treating as empty");
        Value::Object(Map::new())
    };
    let next_doc = read_document(next)?;

    match diff_documents(Some(&previous_doc), Some(&next_doc)) {
        Some(patch) => {
            let bytes = serde_json::to_vec(&patch).map_err(|e| DiffError::Serialization(e.to_string()))?;
            ensure_parent(output)?;
            fs::write(output, bytes).map_err(|e| DiffError::io(output, e))?;
            Ok(JsonFileOutcome::Written)
        }
        None => Ok(JsonFileOutcome::Unchanged),
    }
}

fn read_document(path: &Path) -> DiffResult<Value> {
    let bytes = fs::read(path).map_err(|e| DiffError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| DiffError::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn ensure_parent(path: &Path) -> DiffResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DiffError::io(parent, e))?;
    }
    Ok(())
}
