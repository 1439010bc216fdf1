use crate::{
    GlobalHistogramKernel, HistogramScanKernel, OnesweepKernel, RADIX, RadixKey, SortError,
    SortOrder, SortParams,
};
use cubedpl_runtime::{
    client::ComputeClient,
    cube::CubeCount,
    element::CubeElement,
    runtime::Runtime,
    server::{Bindings, Handle},
    utils,
};
use cubedpl_scan::{StatusBuffers, StatusLayout};

/// Maximum number of keys of a sort, bucket counters being 32 bits wide.
pub const MAX_SORT_LEN: usize = u32::MAX as usize;

/// Sort the first `len` keys of a buffer in place.
///
/// The sort is stable and enqueued on the device, errors raised while executing it are reported
/// by the next synchronization of the client.
pub fn onesweep_sort<R: Runtime, K: RadixKey>(
    client: &ComputeClient<R::Server>,
    keys: &Handle,
    len: usize,
    order: SortOrder,
    params: Option<SortParams>,
) -> Result<(), SortError> {
    sort::<R, K, u32>(client, keys, None, len, order, params)
}

/// Sort the first `len` keys of a buffer in place, moving the values with their keys.
pub fn onesweep_sort_pairs<R: Runtime, K: RadixKey, V: CubeElement>(
    client: &ComputeClient<R::Server>,
    keys: &Handle,
    values: &Handle,
    len: usize,
    order: SortOrder,
    params: Option<SortParams>,
) -> Result<(), SortError> {
    check_capacity("values", values.len::<V>(), len)?;
    sort::<R, K, V>(client, keys, Some(values), len, order, params)
}

/// The stable permutation sorting the first `len` keys: a new `u32` buffer where element `i` is
/// the index of the `i`-th key in sorted order. The keys are left untouched.
pub fn argsort<R: Runtime, K: RadixKey>(
    client: &ComputeClient<R::Server>,
    keys: &Handle,
    len: usize,
    order: SortOrder,
    params: Option<SortParams>,
) -> Result<Handle, SortError> {
    check_capacity("keys", keys.len::<K>(), len)?;
    check_len(len)?;

    let sorted_keys = client.empty_array::<K>(len)?;
    let indices = client.empty_array::<u32>(len)?;
    client.copy(keys, &sorted_keys)?;
    utils::sequence(client, &indices, len)?;

    sort::<R, K, u32>(client, &sorted_keys, Some(&indices), len, order, params)?;

    Ok(indices)
}

fn check_capacity(buffer: &'static str, capacity: usize, len: usize) -> Result<(), SortError> {
    match capacity < len {
        true => Err(SortError::BufferTooSmall {
            buffer,
            len,
            capacity,
        }),
        false => Ok(()),
    }
}

fn check_len(len: usize) -> Result<(), SortError> {
    match len > MAX_SORT_LEN {
        true => Err(SortError::InputTooLarge {
            len,
            max: MAX_SORT_LEN,
        }),
        false => Ok(()),
    }
}

fn sort<R: Runtime, K: RadixKey, V: CubeElement>(
    client: &ComputeClient<R::Server>,
    keys: &Handle,
    values: Option<&Handle>,
    len: usize,
    order: SortOrder,
    params: Option<SortParams>,
) -> Result<(), SortError> {
    let params = params.unwrap_or_default();
    let plane_dim = client.properties().plane_size;
    params.validate(plane_dim)?;
    check_capacity("keys", keys.len::<K>(), len)?;
    check_len(len)?;

    if len <= 1 {
        return Ok(());
    }

    let digits = K::digits();
    let hist = global_histogram::<R, K>(client, keys, len, order, &params)?;

    let tiles = cubedpl_scan::tile_count(len, params.onesweep.tile_size())?;
    let layout = StatusLayout::new(tiles, RADIX, plane_dim);
    let status = StatusBuffers::new::<_, u32>(client, layout)?;

    let scratch_keys = client.empty_array::<K>(len)?;
    let scratch_values = match values {
        Some(_) => Some(client.empty_array::<V>(len)?),
        None => None,
    };

    // The last pass must write the user buffers.
    let mut keys_src = keys.clone();
    let mut keys_dst = scratch_keys;
    let mut values_src = values.cloned();
    let mut values_dst = scratch_values;
    if digits % 2 == 1 {
        client.copy(&keys_src, &keys_dst)?;
        core::mem::swap(&mut keys_src, &mut keys_dst);
        if let (Some(src), Some(dst)) = (values_src.as_mut(), values_dst.as_mut()) {
            client.copy(src, dst)?;
            core::mem::swap(src, dst);
        }
    }

    log::trace!(
        "onesweep sort of {len} keys of {} in {digits} passes of {tiles} tiles",
        K::type_name()
    );

    for digit in 0..digits {
        if digit > 0 {
            status.reset(client)?;
        }

        let mut bindings = Bindings::new()
            .with_buffer(keys_src.clone().binding())
            .with_buffer(keys_dst.clone().binding())
            .with_buffer(hist.clone().binding())
            .with_buffers(status.bindings());
        if let (Some(src), Some(dst)) = (&values_src, &values_dst) {
            bindings = bindings
                .with_buffer(src.clone().binding())
                .with_buffer(dst.clone().binding());
        }

        client.launch(
            OnesweepKernel::<K, V>::new(
                digit,
                len,
                order,
                params.onesweep,
                layout,
                values.is_some(),
            ),
            CubeCount::new_1d(tiles),
            bindings,
        )?;

        core::mem::swap(&mut keys_src, &mut keys_dst);
        core::mem::swap(&mut values_src, &mut values_dst);
    }

    Ok(())
}

/// Enqueue the global histogram of the keys and the scan of its counts, returning the exclusive
/// bucket offsets of every digit.
fn global_histogram<R: Runtime, K: RadixKey>(
    client: &ComputeClient<R::Server>,
    keys: &Handle,
    len: usize,
    order: SortOrder,
    params: &SortParams,
) -> Result<Handle, SortError> {
    let digits = K::digits();
    let hist_len = (digits * RADIX) as usize;
    let hist = client.empty_array::<u32>(hist_len)?;
    utils::fill(client, &hist, hist_len, 0u32)?;

    let work_group_size = params.hist_work_group_size;
    let cubes = len
        .div_ceil(work_group_size as usize)
        .min(params.hist_work_group_count as usize)
        .max(1);

    client.launch(
        GlobalHistogramKernel::<K>::new(len, order, work_group_size),
        CubeCount::new_1d(cubes as u32),
        Bindings::new()
            .with_buffer(keys.clone().binding())
            .with_buffer(hist.clone().binding()),
    )?;
    client.launch(
        HistogramScanKernel,
        CubeCount::new_1d(digits),
        Bindings::new().with_buffer(hist.clone().binding()),
    )?;

    Ok(hist)
}
