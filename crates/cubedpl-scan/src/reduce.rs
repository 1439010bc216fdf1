use crate::{
    ScanError, ScanInstruction, check_capacity, default_multi_pass_params,
    multi_pass::TileReduceKernel, tile_count,
};
use core::marker::PhantomData;
use cubedpl_runtime::{
    client::ComputeClient,
    cube::CubeCount,
    element::CubeElement,
    kernel::KernelParams,
    runtime::Runtime,
    server::{Bindings, Handle},
};

/// Reduce the first `len` elements of a buffer on the device and read the result.
///
/// Every round reduces tiles into a buffer of tile sums, until a single value is left. Returns
/// the identity of the operator for an empty input. Waits for the device.
pub fn reduce<R, N, I>(
    client: &ComputeClient<R::Server>,
    input: &Handle,
    len: usize,
    instruction: I,
    params: Option<KernelParams>,
) -> Result<N, ScanError>
where
    R: Runtime,
    N: CubeElement,
    I: ScanInstruction<N>,
{
    let params = params.unwrap_or_else(default_multi_pass_params);
    params.validate(client.properties().plane_size)?;
    check_capacity("input", input.len::<N>(), len)?;

    if len == 0 {
        return Ok(instruction.identity());
    }

    let mut current = input.clone();
    let mut remaining = len;

    loop {
        let tiles = tile_count(remaining, params.tile_size())?;
        let sums = client.empty_array::<N>(tiles as usize)?;

        client.launch(
            TileReduceKernel {
                instruction: instruction.clone(),
                len: remaining,
                params,
                _elem: PhantomData::<N>,
            },
            CubeCount::new_1d(tiles),
            Bindings::new()
                .with_buffer(current.binding())
                .with_buffer(sums.clone().binding()),
        )?;

        current = sums;
        remaining = tiles as usize;

        if remaining == 1 {
            break;
        }
    }

    let values = client.read_array::<N>(current)?;
    Ok(values[0])
}
