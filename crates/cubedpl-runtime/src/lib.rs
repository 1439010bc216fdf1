#![warn(missing_docs)]

//! Runtime for the cubedpl algorithms.
//!
//! The runtime exposes an emulated data-parallel device: kernels are launched as a grid of
//! cubes (work-groups), each cube being executed by one of the CPU workers owned by the device.
//! Inside a cube, units are grouped in planes that advance in lock-step, which is how the
//! cross-lane primitives of the [plane] module operate.

#[macro_use]
extern crate derive_new;

mod backtrace;
mod base;
mod id;

/// Locked access to a server.
pub mod channel;
/// Client submitting work to a device.
pub mod client;
/// Emulated CPU device.
pub mod compute;
/// Global configuration.
pub mod config;
/// Cube execution context and launch geometry.
pub mod cube;
/// Element types stored on the device.
pub mod element;
/// Buffer views over host slices.
pub mod host;
/// Kernels and their launch parameters.
pub mod kernel;
/// Logging of kernel launches.
pub mod logging;
/// Memory pool of a device.
pub mod memory_management;
/// Cross-lane primitives.
pub mod plane;
/// Runtimes and their devices.
pub mod runtime;
/// Server trait, handles and errors.
pub mod server;
/// Byte storage and typed views.
pub mod storage;
/// Common kernels used by the algorithm crates.
pub mod utils;

pub use backtrace::*;
pub use base::*;
