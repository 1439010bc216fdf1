//! Parallel algorithms on emulated compute devices.
//!
//! - Single-pass scans with decoupled lookback, and reduce-then-scan exclusive scans.
//! - Onesweep radix sorts of keys and key/value pairs.
//! - Set operations and merges of sorted inputs, split on the balanced path.
//! - Policies selecting the device running submitted work.
//!
//! Every algorithm works on device buffers through a [ComputeClient](runtime::client::ComputeClient),
//! and has a host slice counterpart in this crate.

#![warn(missing_docs)]

mod host;

pub use host::*;

pub use cubedpl_runtime as runtime;
pub use cubedpl_scan as scan;
pub use cubedpl_select as select;
pub use cubedpl_set as set;
pub use cubedpl_sort as sort;

/// The types and functions used by most programs.
pub mod prelude {
    pub use crate::host::*;
    pub use cubedpl_runtime::{
        client::ComputeClient,
        kernel::KernelParams,
        runtime::{CpuDevice, CpuRuntime, Runtime},
        server::Handle,
    };
    pub use cubedpl_scan::{Add, BitAnd, BitOr, BitXor, Max, Min, Mul, ScanFn, ScanInstruction};
    pub use cubedpl_select::{
        DynamicLoadPolicy, FixedResourcePolicy, RoundRobinPolicy, RuntimeBackend, Submit,
        SubmitAndWait, TrySubmit,
    };
    pub use cubedpl_set::{CompareFn, Comparator, GreaterThan, LessThan, SetOperation};
    pub use cubedpl_sort::{RadixKey, SortOrder};
}

#[cfg(test)]
mod tests {
    pub type TestRuntime = cubedpl_runtime::runtime::CpuRuntime;

    cubedpl_scan::testgen_scan!();
    cubedpl_sort::testgen_sort!();
    cubedpl_set::testgen_set!();
}
