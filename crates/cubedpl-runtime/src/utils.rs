use crate::{
    client::ComputeClient,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings},
    server::{Bindings, ComputeServer, Handle, LaunchError},
};

const UNITS: u32 = 256;
const ELEMENTS_PER_UNIT: u32 = 16;

/// Cube count covering `len` elements with the element-wise kernels of this module.
fn elementwise_count(len: usize) -> CubeCount {
    let per_cube = (UNITS * ELEMENTS_PER_UNIT) as usize;
    CubeCount::new_1d(len.div_ceil(per_cube) as u32)
}

fn cube_range(cube: &CubeContext<'_>, len: usize) -> core::ops::Range<usize> {
    let per_cube = (UNITS * ELEMENTS_PER_UNIT) as usize;
    let start = cube.cube_pos as usize * per_cube;
    start.min(len)..(start + per_cube).min(len)
}

struct FillKernel<T> {
    value: T,
    len: usize,
}

// SAFETY: Every cube writes a disjoint range.
unsafe impl<T: CubeElement> CubeKernel for FillKernel<T> {
    fn name(&self) -> &'static str {
        "fill"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(UNITS)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let output = bindings.array::<T>(0);
        for index in cube_range(cube, self.len) {
            output.write(index, self.value);
        }
    }
}

struct SequenceKernel {
    len: usize,
}

// SAFETY: Every cube writes a disjoint range.
unsafe impl CubeKernel for SequenceKernel {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(UNITS)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let output = bindings.array::<u32>(0);
        for index in cube_range(cube, self.len) {
            output.write(index, index as u32);
        }
    }
}

/// Fill the first `len` elements of the buffer with `value`.
pub fn fill<S: ComputeServer, T: CubeElement>(
    client: &ComputeClient<S>,
    handle: &Handle,
    len: usize,
    value: T,
) -> Result<(), LaunchError> {
    client.launch(
        FillKernel { value, len },
        elementwise_count(len),
        Bindings::new().with_buffer(handle.clone().binding()),
    )
}

/// Write `0, 1, 2, ..` in the first `len` elements of a `u32` buffer.
pub fn sequence<S: ComputeServer>(
    client: &ComputeClient<S>,
    handle: &Handle,
    len: usize,
) -> Result<(), LaunchError> {
    client.launch(
        SequenceKernel { len },
        elementwise_count(len),
        Bindings::new().with_buffer(handle.clone().binding()),
    )
}
