use std::fmt;

/// Content digest of a binary asset.
///
/// Two assets with the same digest are treated as byte-identical. The digest
/// covers file content only; names and timestamps never contribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetDigest([u8; 32]);

impl AssetDigest {
    /// Wrap a pre-computed 32-byte hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for AssetDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetDigest({})", self.short_hex())
    }
}
