/// Execution config module.
pub mod execution;
/// Launch logging config module.
pub mod launch;
/// Memory config module.
pub mod memory;

mod base;
mod logger;

pub use base::*;
pub use logger::*;
