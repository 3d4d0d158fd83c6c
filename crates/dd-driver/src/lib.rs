//! Release tree walker for DiffDragon.
//!
//! Walks the extracted tree of the next release breadth-first, mirrors its
//! directory layout into `<output_root>/<next version>/`, and hands every
//! file to the structural or binary comparator according to its extension.

pub mod classify;
pub mod config;
pub mod driver;
pub mod error;
pub mod report;

pub use classify::{Classifier, FileCategory};
pub use config::DriverConfig;
pub use driver::{previous_relative_path, DiffDriver, PreviousRelease};
pub use error::{DriverError, DriverResult};
pub use report::{DiffReport, FileFailure};
