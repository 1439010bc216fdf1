use crate::{RADIX, RadixKey, SortOrder, radix_bucket};
use core::marker::PhantomData;
use cubedpl_runtime::{
    cube::{CubeContext, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings, KernelParams},
};
use cubedpl_scan::{Add, StatusLayout, TileStatus, decoupled_lookback};

/// One onesweep pass: scatters the keys, and optionally their values, by one digit.
///
/// Bindings: source keys, destination keys, scanned histogram, status cells, status values, then
/// source and destination values when sorting pairs. The status array has one bucket per radix
/// value: every tile publishes its count of every bucket, then looks back for the count of every
/// bucket in the tiles before it. A key goes at the offset of its bucket, plus the keys of the
/// bucket in previous tiles, plus its rank among the keys of the bucket in its tile. Ranks follow
/// the source order, keeping the sort stable.
pub struct OnesweepKernel<K, V> {
    digit: u32,
    len: usize,
    order: SortOrder,
    params: KernelParams,
    layout: StatusLayout,
    with_values: bool,
    _types: PhantomData<(K, V)>,
}

impl<K: RadixKey, V: CubeElement> OnesweepKernel<K, V> {
    /// Create the pass sorting `len` keys by `digit`.
    pub fn new(
        digit: u32,
        len: usize,
        order: SortOrder,
        params: KernelParams,
        layout: StatusLayout,
        with_values: bool,
    ) -> Self {
        debug_assert_eq!(layout.width, RADIX);

        Self {
            digit,
            len,
            order,
            params,
            layout,
            with_values,
            _types: PhantomData,
        }
    }
}

// SAFETY: Destinations are a permutation of the source indices, so cubes write disjoint
// elements. Status cells are accessed atomically, status values through release/acquire.
unsafe impl<K: RadixKey, V: CubeElement> CubeKernel for OnesweepKernel<K, V> {
    fn name(&self) -> &'static str {
        self.params.name
    }

    fn cube_dim(&self) -> CubeDim {
        self.params.cube_dim()
    }

    fn shared_memory_size(&self) -> usize {
        self.params.tile_size() as usize * core::mem::size_of::<u32>()
            + 2 * RADIX as usize * core::mem::size_of::<u32>()
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let keys_in = bindings.array::<K>(0);
        let keys_out = bindings.array::<K>(1);
        let offsets = bindings.array::<u32>(2);
        let status = TileStatus::new(bindings.atomic(3), bindings.array::<u32>(4), self.layout);
        let tile_size = self.params.tile_size() as usize;

        let tile = status.acquire_tile_id(cube);
        let lo = tile as usize * tile_size;
        let hi = (lo + tile_size).min(self.len);
        let keys = keys_in.load(lo..hi);

        let mut counts = vec![0u32; RADIX as usize];
        let mut ranks = Vec::with_capacity(keys.len());
        let buckets: Vec<u32> = keys
            .iter()
            .map(|key| radix_bucket(*key, self.digit, self.order))
            .collect();
        for bucket in buckets.iter() {
            ranks.push(counts[*bucket as usize]);
            counts[*bucket as usize] += 1;
        }

        let mut prefixes = vec![0u32; RADIX as usize];
        if tile == 0 {
            for (bucket, count) in counts.iter().enumerate() {
                status.publish_full(tile, bucket as u32, *count);
            }
        } else {
            for (bucket, count) in counts.iter().enumerate() {
                status.publish_partial(tile, bucket as u32, *count);
            }
            for (bucket, count) in counts.iter().enumerate() {
                let prefix = decoupled_lookback(cube, &status, tile, bucket as u32, &Add);
                status.publish_full(tile, bucket as u32, prefix.wrapping_add(*count));
                prefixes[bucket] = prefix;
            }
        }

        let base = (self.digit * RADIX) as usize;
        let positions: Vec<usize> = buckets
            .iter()
            .zip(ranks)
            .map(|(bucket, rank)| {
                let bucket = *bucket as usize;
                (offsets.read(base + bucket) + prefixes[bucket] + rank) as usize
            })
            .collect();

        for (key, position) in keys.iter().zip(positions.iter()) {
            keys_out.write(*position, *key);
        }

        if self.with_values {
            let values_in = bindings.array::<V>(5);
            let values_out = bindings.array::<V>(6);
            for (value, position) in values_in.load(lo..hi).into_iter().zip(positions) {
                values_out.write(position, value);
            }
        }
    }
}
