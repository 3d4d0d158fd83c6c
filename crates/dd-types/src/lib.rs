//! Foundation types for DiffDragon.
//!
//! DiffDragon turns successive releases of a versioned asset bundle into
//! forward-only diff bundles. This crate holds the small value types every
//! other crate shares.
//!
//! # Key Types
//!
//! - [`Version`]: Three-part release identifier with a total order
//! - [`versions_since`]: Turns a newest-first version log into the ordered history to process
//! - [`AssetDigest`]: Fixed-size content digest of a binary asset

pub mod digest;
pub mod error;
pub mod version;

pub use digest::AssetDigest;
pub use error::TypeError;
pub use version::{versions_since, Version};
