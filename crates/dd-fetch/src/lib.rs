//! Release acquisition for DiffDragon.
//!
//! Everything the diff engine needs but does not do itself: reading the
//! version log, downloading and extracting release archives, and handing
//! extracted folders from the download stage to the diff stage.
//!
//! # Key Types
//!
//! - [`VersionSource`] -- Ordered, floored release history ([`HttpVersionSource`], [`FileVersionSource`])
//! - [`Fetcher`] / [`ArchiveFetcher`] -- Materializes one release on disk, idempotently
//! - [`FolderRegistry`] -- Shared map from version to extracted folder with awaitable slots
//! - [`download_in_batches`] -- Bounded-concurrency download stage

pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod registry;
pub mod source;

pub use batch::{download_in_batches, BatchSummary};
pub use config::FetchConfig;
pub use error::{FetchError, FetchResult};
pub use fetcher::{extract_archive, ArchiveFetcher, Fetcher};
pub use registry::{FolderRegistry, FolderState};
pub use source::{FileVersionSource, HttpVersionSource, VersionSource};
