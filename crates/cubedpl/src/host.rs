use cubedpl_runtime::{
    client::ComputeClient,
    element::CubeElement,
    host::{AccessMode, HostBuffer},
    runtime::Runtime,
};
use cubedpl_scan::{ScanError, ScanInstruction, exclusive_scan, reduce, single_pass_inclusive_scan};
use cubedpl_set::{Comparator, SetError, SetOperation, parallel_merge, parallel_set_op};
use cubedpl_sort::{RadixKey, SortError, SortOrder, argsort, onesweep_sort, onesweep_sort_pairs};

/// Inclusive scan of a host slice into another, see [single_pass_inclusive_scan].
///
/// Elements of `output` past the length of `input` are left untouched.
pub fn inclusive_scan_slice<R, N, I>(
    client: &ComputeClient<R::Server>,
    input: &[N],
    output: &mut [N],
    instruction: I,
    init: Option<N>,
) -> Result<(), ScanError>
where
    R: Runtime,
    N: CubeElement,
    I: ScanInstruction<N>,
{
    let len = input.len();
    let input = HostBuffer::read_only(client, input)?;
    let output = HostBuffer::new(client, output, AccessMode::Write)?;

    single_pass_inclusive_scan::<R, N, I>(
        client,
        input.handle(),
        output.handle(),
        len,
        instruction,
        init,
        None,
    )?;

    input.finish()?;
    output.finish()?;
    Ok(())
}

/// Inclusive scan of a host slice in place.
pub fn inclusive_scan_in_place<R, N, I>(
    client: &ComputeClient<R::Server>,
    data: &mut [N],
    instruction: I,
    init: Option<N>,
) -> Result<(), ScanError>
where
    R: Runtime,
    N: CubeElement,
    I: ScanInstruction<N>,
{
    let len = data.len();
    let data = HostBuffer::new(client, data, AccessMode::ReadWrite)?;

    single_pass_inclusive_scan::<R, N, I>(
        client,
        data.handle(),
        data.handle(),
        len,
        instruction,
        init,
        None,
    )?;

    data.finish()?;
    Ok(())
}

/// Exclusive scan of a host slice into another, see [exclusive_scan].
pub fn exclusive_scan_slice<R, N, I>(
    client: &ComputeClient<R::Server>,
    input: &[N],
    output: &mut [N],
    instruction: I,
    init: Option<N>,
) -> Result<(), ScanError>
where
    R: Runtime,
    N: CubeElement,
    I: ScanInstruction<N>,
{
    let len = input.len();
    let input = HostBuffer::read_only(client, input)?;
    let output = HostBuffer::new(client, output, AccessMode::Write)?;

    exclusive_scan::<R, N, I>(
        client,
        input.handle(),
        output.handle(),
        len,
        instruction,
        init,
        None,
    )?;

    input.finish()?;
    output.finish()?;
    Ok(())
}

/// Reduction of a host slice, the identity of the operator when empty.
pub fn reduce_slice<R, N, I>(
    client: &ComputeClient<R::Server>,
    input: &[N],
    instruction: I,
) -> Result<N, ScanError>
where
    R: Runtime,
    N: CubeElement,
    I: ScanInstruction<N>,
{
    let input = HostBuffer::read_only(client, input)?;
    reduce::<R, N, I>(client, input.handle(), input.len(), instruction, None)
}

/// Stable radix sort of a host slice.
pub fn sort_slice<R: Runtime, K: RadixKey>(
    client: &ComputeClient<R::Server>,
    keys: &mut [K],
    order: SortOrder,
) -> Result<(), SortError> {
    let len = keys.len();
    let keys = HostBuffer::new(client, keys, AccessMode::ReadWrite)?;

    onesweep_sort::<R, K>(client, keys.handle(), len, order, None)?;

    keys.finish()?;
    Ok(())
}

/// Stable radix sort of host keys, moving the values with their keys.
pub fn sort_pairs_slice<R: Runtime, K: RadixKey, V: CubeElement>(
    client: &ComputeClient<R::Server>,
    keys: &mut [K],
    values: &mut [V],
    order: SortOrder,
) -> Result<(), SortError> {
    let len = keys.len();
    let keys = HostBuffer::new(client, keys, AccessMode::ReadWrite)?;
    let values = HostBuffer::new(client, values, AccessMode::ReadWrite)?;

    onesweep_sort_pairs::<R, K, V>(client, keys.handle(), values.handle(), len, order, None)?;

    keys.finish()?;
    values.finish()?;
    Ok(())
}

/// The stable permutation sorting host keys, see [argsort].
pub fn argsort_slice<R: Runtime, K: RadixKey>(
    client: &ComputeClient<R::Server>,
    keys: &[K],
    order: SortOrder,
) -> Result<Vec<u32>, SortError> {
    let keys = HostBuffer::read_only(client, keys)?;
    let indices = argsort::<R, K>(client, keys.handle(), keys.len(), order, None)?;

    Ok(client.read_array::<u32>(indices)?)
}

/// Set operation on host slices sorted by `comp`, see [parallel_set_op].
pub fn set_operation_slices<R, T, C>(
    client: &ComputeClient<R::Server>,
    a: &[T],
    b: &[T],
    comp: C,
    op: SetOperation,
) -> Result<Vec<T>, SetError>
where
    R: Runtime,
    T: CubeElement,
    C: Comparator<T>,
{
    let a = HostBuffer::read_only(client, a)?;
    let b = HostBuffer::read_only(client, b)?;

    let (output, len) =
        parallel_set_op::<R, T, C>(client, a.handle(), a.len(), b.handle(), b.len(), comp, op, None)?;
    log::trace!("{op:?} of {} and {} elements: {len} elements", a.len(), b.len());

    Ok(client.read_array::<T>(output)?)
}

/// Stable merge of host slices sorted by `comp`, see [parallel_merge].
pub fn merge_slices<R, T, C>(
    client: &ComputeClient<R::Server>,
    a: &[T],
    b: &[T],
    comp: C,
) -> Result<Vec<T>, SetError>
where
    R: Runtime,
    T: CubeElement,
    C: Comparator<T>,
{
    let a = HostBuffer::read_only(client, a)?;
    let b = HostBuffer::read_only(client, b)?;

    let output = parallel_merge::<R, T, C>(client, a.handle(), a.len(), b.handle(), b.len(), comp, None)?;

    Ok(client.read_array::<T>(output)?)
}
