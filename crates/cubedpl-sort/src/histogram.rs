use crate::{RADIX, RadixKey, SortOrder, radix_bucket};
use core::{marker::PhantomData, sync::atomic::Ordering};
use cubedpl_runtime::{
    cube::{CubeContext, CubeDim},
    kernel::{CubeKernel, KernelBindings},
};
use cubedpl_scan::{Add, cube_exclusive_scan};

/// Counts the keys of every bucket of every digit.
///
/// Cubes stripe over the keys, count them in a private table in shared memory, then add the
/// table to the global histogram `hist[digit * RADIX + bucket]`, which must start zeroed.
pub struct GlobalHistogramKernel<K> {
    len: usize,
    order: SortOrder,
    work_group_size: u32,
    _key: PhantomData<K>,
}

impl<K: RadixKey> GlobalHistogramKernel<K> {
    /// Create the kernel for the first `len` keys.
    pub fn new(len: usize, order: SortOrder, work_group_size: u32) -> Self {
        Self {
            len,
            order,
            work_group_size,
            _key: PhantomData,
        }
    }
}

// SAFETY: Keys are only read and the histogram is only accessed atomically.
unsafe impl<K: RadixKey> CubeKernel for GlobalHistogramKernel<K> {
    fn name(&self) -> &'static str {
        "global_histogram"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(self.work_group_size)
    }

    fn shared_memory_size(&self) -> usize {
        K::digits() as usize * RADIX as usize * core::mem::size_of::<u32>()
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let keys = bindings.array::<K>(0);
        let hist = bindings.atomic(1);
        let digits = K::digits();
        let units = cube.units() as usize;
        let stride = cube.cube_count as usize * units;
        let mut local = vec![0u32; digits as usize * RADIX as usize];

        for unit in 0..units {
            let mut index = cube.cube_pos as usize * units + unit;
            while index < self.len {
                let key = keys.read(index);
                for digit in 0..digits {
                    let bucket = radix_bucket(key, digit, self.order);
                    local[(digit * RADIX + bucket) as usize] += 1;
                }
                index += stride;
            }
        }

        for (index, count) in local.into_iter().enumerate() {
            if count != 0 {
                hist.fetch_add(index, count, Ordering::Relaxed);
            }
        }
    }
}

/// Replaces the counts of every digit by their exclusive prefix sum, one cube per digit.
pub struct HistogramScanKernel;

// SAFETY: Every cube scans the counts of its own digit.
unsafe impl CubeKernel for HistogramScanKernel {
    fn name(&self) -> &'static str {
        "histogram_scan"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(RADIX)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let hist = bindings.array::<u32>(0);
        let offset = (cube.cube_pos * RADIX) as usize;

        let mut counts = hist.load(offset..offset + RADIX as usize);
        cube_exclusive_scan(cube, &mut counts, 1, 0, &Add);
        hist.store(offset, &counts);
    }
}
