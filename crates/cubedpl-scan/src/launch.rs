use crate::{
    ScanError, ScanInstruction, StatusBuffers, StatusLayout, TileStatus, check_capacity,
    cube_inclusive_scan, cube_reduce, decoupled_lookback, tile_count,
};
use cubedpl_runtime::{
    client::ComputeClient,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings, KernelParams},
    plane::{plane_broadcast, plane_elect, plane_leader},
    runtime::Runtime,
    server::{Bindings, Handle},
};
use core::ops::Range;

/// Parameters of the single-pass scan when none are given.
pub fn default_scan_params() -> KernelParams {
    KernelParams::new(4, 128, "single_pass_scan")
}

/// Single-pass inclusive scan: `output[i] = init ⊕ input[0] ⊕ .. ⊕ input[i]`.
///
/// The input is read once and the output written once. Tiles are assigned dynamically: every
/// cube acquires a tile id, reduces its tile, publishes the reduction, looks back for the
/// reduction of the tiles before it, then scans its tile with that carry.
///
/// The scan is enqueued on the device, errors raised while executing it are reported by the
/// next synchronization of the client. `input` and `output` may be the same buffer.
pub fn single_pass_inclusive_scan<R, N, I>(
    client: &ComputeClient<R::Server>,
    input: &Handle,
    output: &Handle,
    len: usize,
    instruction: I,
    init: Option<N>,
    params: Option<KernelParams>,
) -> Result<(), ScanError>
where
    R: Runtime,
    N: CubeElement,
    I: ScanInstruction<N>,
{
    let params = params.unwrap_or_else(default_scan_params);
    let plane_dim = client.properties().plane_size;
    params.validate(plane_dim)?;
    check_capacity("input", input.len::<N>(), len)?;
    check_capacity("output", output.len::<N>(), len)?;

    if len == 0 {
        return Ok(());
    }

    let tiles = tile_count(len, params.tile_size())?;
    let layout = StatusLayout::scan(tiles, plane_dim);
    let status = StatusBuffers::new::<_, N>(client, layout)?;

    log::trace!(
        "{}: {len} elements in {tiles} tiles of {}",
        params.name,
        params.tile_size()
    );

    client.launch(
        SinglePassScanKernel {
            instruction,
            init,
            len,
            params,
            layout,
        },
        CubeCount::new_1d(tiles),
        Bindings::new()
            .with_buffer(input.clone().binding())
            .with_buffer(output.clone().binding())
            .with_buffers(status.bindings()),
    )?;

    Ok(())
}

struct SinglePassScanKernel<N, I> {
    instruction: I,
    init: Option<N>,
    len: usize,
    params: KernelParams,
    layout: StatusLayout,
}

impl<N: CubeElement, I: ScanInstruction<N>> SinglePassScanKernel<N, I> {
    /// Scan the tile acquired by the cube, loading its range once and storing it once.
    fn scan_tile<L, S>(
        &self,
        cube: &CubeContext<'_>,
        status: &TileStatus<'_, N>,
        load: L,
        store: S,
    ) where
        L: FnOnce(Range<usize>) -> Vec<N>,
        S: FnOnce(usize, &[N]),
    {
        let instruction = &self.instruction;
        let elements_per_unit = self.params.elements_per_workitem as usize;
        let tile_size = self.params.tile_size() as usize;

        let tile = status.acquire_tile_id(cube);
        let lo = tile as usize * tile_size;
        let hi = (lo + tile_size).min(self.len);
        let mut items = load(lo..hi);

        let local = cube_reduce(cube, &items, elements_per_unit, instruction);

        // The leader of the first plane publishes, then hands the carry to the cube.
        let carries: Vec<N> = (0..cube.plane_dim)
            .map(|lane| match plane_elect(lane) {
                true => self.leader_carry(cube, status, tile, local),
                false => instruction.identity(),
            })
            .collect();
        let prev = plane_broadcast(&carries, plane_leader(cube.plane_dim));

        cube_inclusive_scan(cube, &mut items, elements_per_unit, prev, instruction);
        store(lo, &items);
    }

    /// Publish the aggregates of `tile` and return the reduction of the tiles before it.
    fn leader_carry(
        &self,
        cube: &CubeContext<'_>,
        status: &TileStatus<'_, N>,
        tile: u32,
        local: N,
    ) -> N {
        let instruction = &self.instruction;
        let prev = match (tile, self.init) {
            (0, Some(init)) => init,
            (0, None) => instruction.identity(),
            _ => {
                status.publish_partial(tile, 0, local);
                decoupled_lookback(cube, status, tile, 0, instruction)
            }
        };
        status.publish_full(tile, 0, instruction.combine(prev, local));

        prev
    }
}

// SAFETY: Every tile reads and writes its own range of the input and output, status cells are
// accessed atomically and value slots are published with release/acquire ordering.
unsafe impl<N: CubeElement, I: ScanInstruction<N>> CubeKernel for SinglePassScanKernel<N, I> {
    fn name(&self) -> &'static str {
        self.params.name
    }

    fn cube_dim(&self) -> CubeDim {
        self.params.cube_dim()
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let input = bindings.array::<N>(0);
        let output = bindings.array::<N>(1);
        let status = TileStatus::new(bindings.atomic(2), bindings.array::<N>(3), self.layout);

        self.scan_tile(
            cube,
            &status,
            |range| input.load(range),
            |offset, items| output.store(offset, items),
        );
    }
}
