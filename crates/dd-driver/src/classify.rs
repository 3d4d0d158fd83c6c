use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// How the walker treats a file, decided by its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// JSON-like documents, diffed key by key.
    Structured,
    /// Bitmap assets, compared by content digest.
    Image,
    /// Scripts, stylesheets, server config and extensionless files.
    Ignored,
    /// Anything else. Logged, never fatal, produces no output.
    Unrecognized,
}

/// Extension table used to classify files.
///
/// Extensions are stored lowercase without the leading dot. A file without an
/// extension is always [`FileCategory::Ignored`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classifier {
    pub structured: BTreeSet<String>,
    pub image: BTreeSet<String>,
    pub ignored: BTreeSet<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        fn set(exts: &[&str]) -> BTreeSet<String> {
            exts.iter().map(|e| e.to_string()).collect()
        }
        Self {
            structured: set(&["json"]),
            image: set(&["png", "jpg", "jpeg", "gif", "webp", "bmp"]),
            ignored: set(&["js", "css", "html", "htm", "php", "htaccess", "txt", "map"]),
        }
    }
}

impl Classifier {
    /// Classify a path by its extension.
    pub fn classify(&self, path: &Path) -> FileCategory {
        let Some(ext) = extension_of(path) else {
            return FileCategory::Ignored;
        };
        if self.structured.contains(&ext) {
            FileCategory::Structured
        } else if self.image.contains(&ext) {
            FileCategory::Image
        } else if self.ignored.contains(&ext) {
            FileCategory::Ignored
        } else {
            FileCategory::Unrecognized
        }
    }

    /// Add extra ignored extensions on top of the current table.
    pub fn with_ignored<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored.extend(extensions.into_iter().map(|e| normalize(e.as_ref())));
        self
    }
}

/// Lowercase extension without the dot. Dotfiles such as `.htaccess` have no
/// extension in `Path` terms, so their name after the dot is used instead.
fn extension_of(path: &Path) -> Option<String> {
    if let Some(ext) = path.extension() {
        return Some(ext.to_string_lossy().to_ascii_lowercase());
    }
    let name = path.file_name()?.to_str()?;
    name.strip_prefix('.')
        .filter(|rest| !rest.is_empty())
        .map(str::to_ascii_lowercase)
}

fn normalize(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}
