//! Content hashing for DiffDragon.
//!
//! Provides a domain-separated BLAKE3 hasher producing [`AssetDigest`]s for
//! whole-file equality checks. No custom cryptography: this only wraps
//! `blake3`.
//!
//! [`AssetDigest`]: dd_types::AssetDigest

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};
