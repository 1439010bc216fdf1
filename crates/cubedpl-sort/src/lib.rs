//! Onesweep least significant digit radix sort.
//!
//! A first kernel counts the buckets of every digit of every key, then one onesweep pass per
//! digit scatters the keys: tiles publish their bucket counts in a status array and look back at
//! the tiles before them to find where their keys go. Passes ping-pong between the user buffer
//! and a scratch buffer, the last one writing the user buffer.

#![warn(missing_docs)]

mod config;
mod error;
mod histogram;
mod key;
mod launch;
mod onesweep;

pub use config::*;
pub use error::*;
pub use histogram::*;
pub use key::*;
pub use launch::*;
pub use onesweep::*;

/// Test generators, instantiated by the crates providing a runtime.
#[cfg(feature = "export_tests")]
pub mod tests;
