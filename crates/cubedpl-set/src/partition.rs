use crate::{Comparator, Sequence, SetError, balanced_path, merge_path};
use cubedpl_runtime::{
    client::ComputeClient,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings},
    server::{Bindings, ComputeServer, Handle},
    storage::Array,
};
use core::marker::PhantomData;

/// How partition boundaries are placed on their diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathKind {
    /// Merge path, for merges.
    Merge,
    /// Balanced path, for set operations.
    Balanced,
}

/// The first `len` elements of a device array.
struct DeviceSequence<'a, T> {
    array: Array<'a, T>,
    len: usize,
}

impl<T: CubeElement> Sequence<T> for DeviceSequence<'_, T> {
    fn len(&self) -> usize {
        self.len
    }

    fn at(&self, index: usize) -> T {
        self.array.read(index)
    }
}

/// Number of partitions of `span` merge steps covering both inputs.
pub(crate) fn partition_count(a_len: usize, b_len: usize, span: usize) -> usize {
    (a_len + b_len).div_ceil(span)
}

/// Inputs split in partitions of `span` merge steps.
pub(crate) struct Partitions<'a> {
    pub(crate) a: &'a Handle,
    pub(crate) a_len: usize,
    pub(crate) b: &'a Handle,
    pub(crate) b_len: usize,
    pub(crate) span: usize,
    pub(crate) count: usize,
}

impl Partitions<'_> {
    /// Launch the search of the boundaries, returning the coordinates buffer.
    pub(crate) fn search<S, T, C>(
        &self,
        client: &ComputeClient<S>,
        kind: PathKind,
        comp: &C,
        units: u32,
    ) -> Result<Handle, SetError>
    where
        S: ComputeServer,
        T: CubeElement,
        C: Comparator<T>,
    {
        let boundaries = self.count + 1;
        let coords = client.empty_array::<u32>(2 * boundaries)?;

        client.launch(
            PartitionKernel::<T, C> {
                a_len: self.a_len,
                b_len: self.b_len,
                span: self.span,
                partitions: self.count,
                units,
                kind,
                comp: comp.clone(),
                _elem: PhantomData,
            },
            CubeCount::new_1d(boundaries.div_ceil(units as usize) as u32),
            Bindings::new()
                .with_buffer(self.a.clone().binding())
                .with_buffer(self.b.clone().binding())
                .with_buffer(coords.clone().binding()),
        )?;

        Ok(coords)
    }
}

/// Bounds of partition `index` in both inputs, read from the coordinates buffer.
pub(crate) fn partition_bounds(
    coords: &Array<'_, u32>,
    index: usize,
) -> (core::ops::Range<usize>, core::ops::Range<usize>) {
    let coord = |at: usize| coords.read(at) as usize;
    let (a_lo, b_lo) = (coord(2 * index), coord(2 * index + 1));
    let (a_hi, b_hi) = (coord(2 * index + 2), coord(2 * index + 3));

    (a_lo..a_hi, b_lo..b_hi)
}

/// Computes the `partitions + 1` boundaries of the partitions, written as `[i, j]` pairs of
/// `u32` in the coordinates buffer.
///
/// Boundary `k` lies on diagonal `min(k × span, a_len + b_len)`. Every unit searches one
/// boundary.
struct PartitionKernel<T, C> {
    a_len: usize,
    b_len: usize,
    span: usize,
    partitions: usize,
    units: u32,
    kind: PathKind,
    comp: C,
    _elem: PhantomData<T>,
}

// SAFETY: The inputs are only read and every unit writes its own boundary.
unsafe impl<T: CubeElement, C: Comparator<T>> CubeKernel for PartitionKernel<T, C> {
    fn name(&self) -> &'static str {
        match self.kind {
            PathKind::Merge => "merge_path_partition",
            PathKind::Balanced => "balanced_path_partition",
        }
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(self.units)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let a = DeviceSequence {
            array: bindings.array::<T>(0),
            len: self.a_len,
        };
        let b = DeviceSequence {
            array: bindings.array::<T>(1),
            len: self.b_len,
        };
        let coords = bindings.array::<u32>(2);
        let total = self.a_len + self.b_len;

        let first = cube.cube_pos as usize * cube.units() as usize;
        let last = (first + cube.units() as usize).min(self.partitions + 1);

        for boundary in first..last {
            let diag = (boundary * self.span).min(total);
            let (i, j) = match self.kind {
                PathKind::Merge => merge_path(&a, &b, diag, &self.comp),
                PathKind::Balanced => {
                    let path = balanced_path(&a, &b, diag, &self.comp);
                    (path.i, path.j)
                }
            };

            coords.write(2 * boundary, i as u32);
            coords.write(2 * boundary + 1, j as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_cover_every_step() {
        assert_eq!(partition_count(0, 0, 16), 0);
        assert_eq!(partition_count(10, 6, 16), 1);
        assert_eq!(partition_count(10, 7, 16), 2);
        assert_eq!(partition_count(0, 5, 1), 5);
    }
}
