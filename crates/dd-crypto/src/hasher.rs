use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use dd_types::AssetDigest;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is prepended to every hash computation, so asset digests
/// never collide with digests of the same bytes taken for another purpose.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for binary assets (images).
    pub const ASSET: Self = Self {
        domain: "dd-asset-v1",
    };

    /// Hash everything a reader yields, without buffering it whole.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<AssetDigest> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        io::copy(&mut reader, &mut hasher)?;
        Ok(AssetDigest::from_hash(*hasher.finalize().as_bytes()))
    }

    /// Hash the full byte content of a file.
    pub fn hash_file(&self, path: &Path) -> Result<AssetDigest, HasherError> {
        let io_err = |source| HasherError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        self.hash_reader(file).map_err(io_err)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
