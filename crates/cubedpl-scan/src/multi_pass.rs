use core::marker::PhantomData;
use crate::{
    ScanError, ScanInstruction, check_capacity, cube_exclusive_scan, cube_inclusive_scan,
    cube_reduce, tile_count,
};
use cubedpl_runtime::{
    client::ComputeClient,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings, KernelParams},
    runtime::Runtime,
    server::{Bindings, Handle},
};

/// Parameters of the multi-pass scans when none are given.
pub fn default_multi_pass_params() -> KernelParams {
    KernelParams::new(4, 128, "multi_pass_scan")
}

/// Exclusive scan: `output[0] = init` and `output[i] = init ⊕ input[0] ⊕ .. ⊕ input[i - 1]`,
/// `init` being the identity of the operator when absent.
///
/// Runs as reduce-then-scan: one kernel reduces every tile, a single cube scans the tile
/// reductions, then every tile is scanned with its carry.
pub fn exclusive_scan<R, N, I>(
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
    reduce_then_scan::<R, N, I>(client, input, output, len, instruction, init, params, false)
}

/// Inclusive scan computed with the reduce-then-scan passes of [exclusive_scan], reading the
/// input twice.
pub fn multi_pass_inclusive_scan<R, N, I>(
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
    reduce_then_scan::<R, N, I>(client, input, output, len, instruction, init, params, true)
}

#[allow(clippy::too_many_arguments)]
fn reduce_then_scan<R, N, I>(
    client: &ComputeClient<R::Server>,
    input: &Handle,
    output: &Handle,
    len: usize,
    instruction: I,
    init: Option<N>,
    params: Option<KernelParams>,
    inclusive: bool,
) -> Result<(), ScanError>
where
    R: Runtime,
    N: CubeElement,
    I: ScanInstruction<N>,
{
    let params = params.unwrap_or_else(default_multi_pass_params);
    params.validate(client.properties().plane_size)?;
    check_capacity("input", input.len::<N>(), len)?;
    check_capacity("output", output.len::<N>(), len)?;

    if len == 0 {
        return Ok(());
    }

    let tiles = tile_count(len, params.tile_size())?;
    let carries = client.empty_array::<N>(tiles as usize)?;

    client.launch(
        TileReduceKernel {
            instruction: instruction.clone(),
            len,
            params,
            _elem: PhantomData,
        },
        CubeCount::new_1d(tiles),
        Bindings::new()
            .with_buffer(input.clone().binding())
            .with_buffer(carries.clone().binding()),
    )?;
    client.launch(
        CarryScanKernel {
            instruction: instruction.clone(),
            init,
            tiles: tiles as usize,
            params,
        },
        CubeCount::new_single(),
        Bindings::new().with_buffer(carries.clone().binding()),
    )?;
    client.launch(
        TileScanKernel {
            instruction,
            len,
            params,
            inclusive,
            _elem: PhantomData,
        },
        CubeCount::new_1d(tiles),
        Bindings::new()
            .with_buffer(input.clone().binding())
            .with_buffer(output.clone().binding())
            .with_buffer(carries.binding()),
    )?;

    Ok(())
}

/// Writes the reduction of tile `t` of the input at index `t` of the output.
pub(crate) struct TileReduceKernel<N, I> {
    pub instruction: I,
    pub len: usize,
    pub params: KernelParams,
    pub _elem: PhantomData<N>,
}

// SAFETY: Every cube reads its own tile and writes its own output element.
unsafe impl<N: CubeElement, I: ScanInstruction<N>> CubeKernel for TileReduceKernel<N, I> {
    fn name(&self) -> &'static str {
        "tile_reduce"
    }

    fn cube_dim(&self) -> CubeDim {
        self.params.cube_dim()
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let input = bindings.array::<N>(0);
        let output = bindings.array::<N>(1);
        let tile_size = self.params.tile_size() as usize;
        let lo = cube.cube_pos as usize * tile_size;
        let hi = (lo + tile_size).min(self.len);

        let items = input.load(lo..hi);
        let total = cube_reduce(
            cube,
            &items,
            self.params.elements_per_workitem as usize,
            &self.instruction,
        );
        output.write(cube.cube_pos as usize, total);
    }
}

/// Exclusive scan of the tile reductions in place, by a single cube.
struct CarryScanKernel<N, I> {
    instruction: I,
    init: Option<N>,
    tiles: usize,
    params: KernelParams,
}

// SAFETY: Launched with a single cube.
unsafe impl<N: CubeElement, I: ScanInstruction<N>> CubeKernel for CarryScanKernel<N, I> {
    fn name(&self) -> &'static str {
        "carry_scan"
    }

    fn cube_dim(&self) -> CubeDim {
        self.params.cube_dim()
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let sums = bindings.array::<N>(0);
        let elements_per_unit = self.params.elements_per_workitem as usize;
        let tile_size = self.params.tile_size() as usize;
        let mut carry = self.init.unwrap_or_else(|| self.instruction.identity());

        for lo in (0..self.tiles).step_by(tile_size) {
            let hi = (lo + tile_size).min(self.tiles);
            let mut items = sums.load(lo..hi);
            let total = cube_reduce(cube, &items, elements_per_unit, &self.instruction);

            cube_exclusive_scan(cube, &mut items, elements_per_unit, carry, &self.instruction);
            sums.store(lo, &items);
            carry = self.instruction.combine(carry, total);
        }
    }
}

/// Scans every tile with the carry computed for it.
struct TileScanKernel<N, I> {
    instruction: I,
    len: usize,
    params: KernelParams,
    inclusive: bool,
    _elem: PhantomData<N>,
}

// SAFETY: Every cube reads and writes its own tile.
unsafe impl<N: CubeElement, I: ScanInstruction<N>> CubeKernel for TileScanKernel<N, I> {
    fn name(&self) -> &'static str {
        self.params.name
    }

    fn cube_dim(&self) -> CubeDim {
        self.params.cube_dim()
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let input = bindings.array::<N>(0);
        let output = bindings.array::<N>(1);
        let carries = bindings.array::<N>(2);
        let elements_per_unit = self.params.elements_per_workitem as usize;
        let tile_size = self.params.tile_size() as usize;
        let lo = cube.cube_pos as usize * tile_size;
        let hi = (lo + tile_size).min(self.len);

        let carry = carries.read(cube.cube_pos as usize);
        let mut items = input.load(lo..hi);
        let instruction = &self.instruction;
        match self.inclusive {
            true => cube_inclusive_scan(cube, &mut items, elements_per_unit, carry, instruction),
            false => cube_exclusive_scan(cube, &mut items, elements_per_unit, carry, instruction),
        }
        output.store(lo, &items);
    }
}
