//! Set operations and merge of sorted buffers.
//!
//! The merge of two sorted inputs is split in partitions of equal length along its diagonals.
//! The balanced path places the partition boundaries so that equal elements of both inputs are
//! matched in pairs, which lets every partition run the bounded serial set kernel independently.
//! The outputs of the partitions are then compacted with the offsets computed by the scan.

#![warn(missing_docs)]

mod comparator;
mod error;
mod launch;
mod merge;
mod operation;
mod partition;
mod search;
mod serial;

pub use comparator::*;
pub use error::*;
pub use launch::*;
pub use merge::*;
pub use operation::*;
pub use search::*;
pub use serial::*;

/// Test generators, instantiated by the crates providing a runtime.
#[cfg(feature = "export_tests")]
pub mod tests;
