//! Prefix scans and reductions over device buffers.
//!
//! The single-pass scan streams the input once: every cube publishes the reduction of its tile
//! in a status array and looks back at the tiles before it to find its carry. The multi-pass
//! scans reduce every tile first, scan the tile sums, then scan every tile with its carry.

#![warn(missing_docs)]

mod error;
mod instructions;
mod launch;
mod lookback;
mod multi_pass;
mod reduce;
mod status;
mod tile;

pub use error::*;
pub use instructions::*;
pub use launch::*;
pub use lookback::*;
pub use multi_pass::*;
pub use reduce::*;
pub use status::*;
pub use tile::*;

/// Test generators, instantiated by the crates providing a runtime.
#[cfg(feature = "export_tests")]
pub mod tests;
