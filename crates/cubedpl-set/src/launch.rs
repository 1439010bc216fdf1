use crate::{
    Comparator, SetError, SetOperation, bounded_set_op, check_capacity,
    partition::{PathKind, Partitions, partition_bounds, partition_count},
};
use cubedpl_runtime::{
    client::ComputeClient,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings, KernelParams},
    runtime::Runtime,
    server::{Bindings, Handle},
};
use cubedpl_scan::{Add, single_pass_inclusive_scan};
use core::marker::PhantomData;

/// Maximum number of elements of both inputs, merge coordinates being 32 bits wide.
pub const MAX_SET_LEN: usize = u32::MAX as usize;

/// Parameters of the set operations and merges when none are given.
///
/// Every unit handles a partition of `elements_per_workitem` merge steps.
pub fn default_set_params() -> KernelParams {
    KernelParams::new(16, 128, "set_operation")
}

pub(crate) fn check_inputs<T: CubeElement>(
    a: &Handle,
    a_len: usize,
    b: &Handle,
    b_len: usize,
) -> Result<(), SetError> {
    check_capacity("a", a.len::<T>(), a_len)?;
    check_capacity("b", b.len::<T>(), b_len)?;

    match a_len.checked_add(b_len) {
        Some(len) if len <= MAX_SET_LEN => Ok(()),
        _ => Err(SetError::InputTooLarge {
            len: a_len.saturating_add(b_len),
            max: MAX_SET_LEN,
        }),
    }
}

/// Set operation on the first `a_len` and `b_len` elements of two buffers sorted by `comp`.
///
/// Returns a new buffer holding the output and its length. The merge of both inputs is split
/// on the balanced path, every partition runs the serial set kernel into its own slot, and the
/// slots are compacted with the offsets given by a scan of their lengths. The length is read
/// back on the host, so this waits for the work submitted before.
pub fn parallel_set_op<R, T, C>(
    client: &ComputeClient<R::Server>,
    a: &Handle,
    a_len: usize,
    b: &Handle,
    b_len: usize,
    comp: C,
    op: SetOperation,
    params: Option<KernelParams>,
) -> Result<(Handle, usize), SetError>
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

    if partitions.count == 0 {
        return Ok((client.empty_array::<T>(0)?, 0));
    }

    log::trace!(
        "{}: {op:?} of {a_len} and {b_len} elements in {} partitions",
        params.name,
        partitions.count
    );

    let units = params.workgroup_size;
    let cubes = CubeCount::new_1d(partitions.count.div_ceil(units as usize) as u32);
    let coords = partitions.search::<_, T, C>(client, PathKind::Balanced, &comp, units)?;

    // Partitions ending on a split pair take one more step.
    let stride = span + 1;
    let slots = client.empty_array::<T>(partitions.count * stride)?;
    let counts = client.empty_array::<u32>(partitions.count)?;

    client.launch(
        SetOperationKernel::<T, C> {
            op,
            comp,
            stride,
            partitions: partitions.count,
            units,
            name: params.name,
            _elem: PhantomData,
        },
        cubes,
        Bindings::new()
            .with_buffer(a.clone().binding())
            .with_buffer(b.clone().binding())
            .with_buffer(coords.binding())
            .with_buffer(slots.clone().binding())
            .with_buffer(counts.clone().binding()),
    )?;

    single_pass_inclusive_scan::<R, u32, Add>(
        client,
        &counts,
        &counts,
        partitions.count,
        Add,
        None,
        None,
    )?;

    let offsets = client.read_array::<u32>(counts.clone())?;
    let len = offsets.last().copied().unwrap_or(0) as usize;
    let output = client.empty_array::<T>(len)?;

    if len > 0 {
        client.launch(
            CompactKernel::<T> {
                stride,
                partitions: partitions.count,
                units,
                _elem: PhantomData,
            },
            cubes,
            Bindings::new()
                .with_buffer(slots.binding())
                .with_buffer(counts.binding())
                .with_buffer(output.clone().binding()),
        )?;
    }

    Ok((output, len))
}

/// Union of two sorted buffers, see [parallel_set_op].
pub fn parallel_set_union<R: Runtime, T: CubeElement, C: Comparator<T>>(
    client: &ComputeClient<R::Server>,
    a: &Handle,
    a_len: usize,
    b: &Handle,
    b_len: usize,
    comp: C,
    params: Option<KernelParams>,
) -> Result<(Handle, usize), SetError> {
    parallel_set_op::<R, T, C>(client, a, a_len, b, b_len, comp, SetOperation::Union, params)
}

/// Intersection of two sorted buffers, see [parallel_set_op].
pub fn parallel_set_intersection<R: Runtime, T: CubeElement, C: Comparator<T>>(
    client: &ComputeClient<R::Server>,
    a: &Handle,
    a_len: usize,
    b: &Handle,
    b_len: usize,
    comp: C,
    params: Option<KernelParams>,
) -> Result<(Handle, usize), SetError> {
    let op = SetOperation::Intersection;
    parallel_set_op::<R, T, C>(client, a, a_len, b, b_len, comp, op, params)
}

/// Elements of `A` not in `B`, see [parallel_set_op].
pub fn parallel_set_difference<R: Runtime, T: CubeElement, C: Comparator<T>>(
    client: &ComputeClient<R::Server>,
    a: &Handle,
    a_len: usize,
    b: &Handle,
    b_len: usize,
    comp: C,
    params: Option<KernelParams>,
) -> Result<(Handle, usize), SetError> {
    let op = SetOperation::Difference;
    parallel_set_op::<R, T, C>(client, a, a_len, b, b_len, comp, op, params)
}

/// Elements of only one of two sorted buffers, see [parallel_set_op].
pub fn parallel_set_symmetric_difference<R: Runtime, T: CubeElement, C: Comparator<T>>(
    client: &ComputeClient<R::Server>,
    a: &Handle,
    a_len: usize,
    b: &Handle,
    b_len: usize,
    comp: C,
    params: Option<KernelParams>,
) -> Result<(Handle, usize), SetError> {
    let op = SetOperation::SymmetricDifference;
    parallel_set_op::<R, T, C>(client, a, a_len, b, b_len, comp, op, params)
}

struct SetOperationKernel<T, C> {
    op: SetOperation,
    comp: C,
    stride: usize,
    partitions: usize,
    units: u32,
    name: &'static str,
    _elem: PhantomData<T>,
}

// SAFETY: The inputs are only read, every partition writes its own slot and count.
unsafe impl<T: CubeElement, C: Comparator<T>> CubeKernel for SetOperationKernel<T, C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(self.units)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let a = bindings.array::<T>(0);
        let b = bindings.array::<T>(1);
        let coords = bindings.array::<u32>(2);
        let slots = bindings.array::<T>(3);
        let counts = bindings.array::<u32>(4);

        let first = cube.cube_pos as usize * cube.units() as usize;
        let last = (first + cube.units() as usize).min(self.partitions);
        let mut output = vec![<T as bytemuck::Zeroable>::zeroed(); self.stride];

        for partition in first..last {
            let (a_range, b_range) = partition_bounds(&coords, partition);
            let a_part = a.load(a_range);
            let b_part = b.load(b_range);

            let outcome = bounded_set_op(&a_part, &b_part, &mut output, None, &self.comp, self.op);
            debug_assert_eq!(
                (outcome.a_consumed, outcome.b_consumed),
                (a_part.len(), b_part.len())
            );

            slots.store(partition * self.stride, &output[..outcome.count]);
            counts.write(partition, outcome.count as u32);
        }
    }
}

/// Moves the output of every partition to its offset, given by the inclusive scan of the
/// output lengths.
struct CompactKernel<T> {
    stride: usize,
    partitions: usize,
    units: u32,
    _elem: PhantomData<T>,
}

// SAFETY: Offsets are increasing, the partitions write disjoint ranges of the output.
unsafe impl<T: CubeElement> CubeKernel for CompactKernel<T> {
    fn name(&self) -> &'static str {
        "set_operation_compact"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(self.units)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let slots = bindings.array::<T>(0);
        let offsets = bindings.array::<u32>(1);
        let output = bindings.array::<T>(2);

        let first = cube.cube_pos as usize * cube.units() as usize;
        let last = (first + cube.units() as usize).min(self.partitions);

        for partition in first..last {
            let start = match partition {
                0 => 0,
                _ => offsets.read(partition - 1) as usize,
            };
            let end = offsets.read(partition) as usize;
            if start == end {
                continue;
            }

            let slot = partition * self.stride;
            let values = slots.load(slot..slot + end - start);
            output.store(start, &values);
        }
    }
}
