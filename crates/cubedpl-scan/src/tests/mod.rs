pub mod exclusive;

use crate::ScanInstruction;
use cubedpl_runtime::element::{CubeElement, Numeric};
use rand::{Rng, SeedableRng, distr::Uniform, rngs::StdRng};

#[allow(missing_docs)]
#[macro_export]
macro_rules! testgen_scan {
    () => {
        mod test_scan {
            use super::*;

            $crate::testgen_scan_inclusive!();
            $crate::testgen_scan_exclusive!();
            $crate::testgen_scan_reduce!();
        }
    };
}

/// Small values, so sums of floats stay exact.
pub fn random_data<N: Numeric>(len: usize, seed: u64) -> Vec<N> {
    StdRng::seed_from_u64(seed)
        .sample_iter(Uniform::<u32>::new(1, 20).unwrap())
        .take(len)
        .map(N::from_u32)
        .collect()
}

/// Serial inclusive scan.
pub fn reference_inclusive<N: CubeElement, I: ScanInstruction<N>>(
    data: &[N],
    init: Option<N>,
    instruction: &I,
) -> Vec<N> {
    data.iter()
        .scan(init.unwrap_or_else(|| instruction.identity()), |acc, value| {
            *acc = instruction.combine(*acc, *value);
            Some(*acc)
        })
        .collect()
}

/// Serial exclusive scan.
pub fn reference_exclusive<N: CubeElement, I: ScanInstruction<N>>(
    data: &[N],
    init: Option<N>,
    instruction: &I,
) -> Vec<N> {
    data.iter()
        .scan(init.unwrap_or_else(|| instruction.identity()), |acc, value| {
            let current = *acc;
            *acc = instruction.combine(*acc, *value);
            Some(current)
        })
        .collect()
}
