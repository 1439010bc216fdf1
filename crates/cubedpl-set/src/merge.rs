use crate::{
    Comparator, SetError, check_inputs, default_set_params,
    partition::{PathKind, Partitions, partition_bounds, partition_count},
    serial_merge,
};
use cubedpl_runtime::{
    client::ComputeClient,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings, KernelParams},
    runtime::Runtime,
    server::{Bindings, Handle},
};
use core::marker::PhantomData;

/// Stable merge of the first `a_len` and `b_len` elements of two buffers sorted by `comp`, into
/// a new buffer of `a_len + b_len` elements. Elements of `A` come first on ties.
///
/// The merge is split on the merge path in partitions of `elements_per_workitem` elements,
/// every unit merging one partition to its final position.
pub fn parallel_merge<R, T, C>(
    client: &ComputeClient<R::Server>,
    a: &Handle,
    a_len: usize,
    b: &Handle,
    b_len: usize,
    comp: C,
    params: Option<KernelParams>,
) -> Result<Handle, SetError>
where
    R: Runtime,
    T: CubeElement,
    C: Comparator<T>,
{
    let params = params.unwrap_or_else(default_set_params);
    params.validate(client.properties().plane_size)?;
    check_inputs::<T>(a, a_len, b, b_len)?;

    let span = params.elements_per_workitem as usize;
    let partitions = Partitions {
        a,
        a_len,
        b,
        b_len,
        span,
        count: partition_count(a_len, b_len, span),
    };
    let output = client.empty_array::<T>(a_len + b_len)?;

    if partitions.count == 0 {
        return Ok(output);
    }

    let units = params.workgroup_size;
    let coords = partitions.search::<_, T, C>(client, PathKind::Merge, &comp, units)?;

    client.launch(
        MergeKernel::<T, C> {
            comp,
            partitions: partitions.count,
            units,
            _elem: PhantomData,
        },
        CubeCount::new_1d(partitions.count.div_ceil(units as usize) as u32),
        Bindings::new()
            .with_buffer(a.clone().binding())
            .with_buffer(b.clone().binding())
            .with_buffer(coords.binding())
            .with_buffer(output.clone().binding()),
    )?;

    Ok(output)
}

struct MergeKernel<T, C> {
    comp: C,
    partitions: usize,
    units: u32,
    _elem: PhantomData<T>,
}

// SAFETY: The inputs are only read, partition `k` writes the output range of its diagonals.
unsafe impl<T: CubeElement, C: Comparator<T>> CubeKernel for MergeKernel<T, C> {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(self.units)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let a = bindings.array::<T>(0);
        let b = bindings.array::<T>(1);
        let coords = bindings.array::<u32>(2);
        let output = bindings.array::<T>(3);

        let first = cube.cube_pos as usize * cube.units() as usize;
        let last = (first + cube.units() as usize).min(self.partitions);

        for partition in first..last {
            let (a_range, b_range) = partition_bounds(&coords, partition);
            let offset = a_range.start + b_range.start;
            let a_part = a.load(a_range);
            let b_part = b.load(b_range);

            let mut merged = a_part.clone();
            merged.extend_from_slice(&b_part);
            serial_merge(&a_part, &b_part, &mut merged, &self.comp);

            output.store(offset, &merged);
        }
    }
}
