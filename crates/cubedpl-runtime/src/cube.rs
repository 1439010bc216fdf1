use core::sync::atomic::{AtomicBool, Ordering};

/// The number of units across all 3 axes of a cube.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CubeDim {
    /// Units along the x axis.
    pub x: u32,
    /// Units along the y axis.
    pub y: u32,
    /// Units along the z axis.
    pub z: u32,
}

impl CubeDim {
    /// Create a new cube dim with the given number of units per axis.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create a one dimensional cube of `x` units.
    pub const fn new_1d(x: u32) -> Self {
        Self { x, y: 1, z: 1 }
    }

    /// A cube with a single unit.
    pub const fn new_single() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }

    /// The total number of units in the cube.
    pub const fn num_elems(&self) -> u32 {
        self.x * self.y * self.z
    }
}

impl Default for CubeDim {
    fn default() -> Self {
        Self::new_1d(256)
    }
}

/// Specifies the number of cubes to be dispatched for a kernel.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CubeCount {
    /// Dispatch a known count of x, y, z cubes.
    Static(u32, u32, u32),
}

impl CubeCount {
    /// Create a one dimensional cube count.
    pub const fn new_1d(x: u32) -> Self {
        CubeCount::Static(x, 1, 1)
    }

    /// Create a cube count of a single cube.
    pub const fn new_single() -> Self {
        CubeCount::Static(1, 1, 1)
    }

    /// Total number of cubes dispatched.
    pub const fn num_cubes(&self) -> u32 {
        match self {
            CubeCount::Static(x, y, z) => *x * *y * *z,
        }
    }
}

/// Panic payload used to unwind the cubes of a launch after another cube failed.
#[derive(Debug)]
pub struct LaunchAborted;

/// Execution context of one cube.
///
/// Units of a cube are emulated by the worker executing the cube: kernels iterate over the units
/// and planes they need, in lock-step.
#[derive(Debug)]
pub struct CubeContext<'a> {
    /// Linear position of the cube in the launch grid.
    pub cube_pos: u32,
    /// Total number of cubes in the launch grid.
    pub cube_count: u32,
    /// Units of the cube.
    pub cube_dim: CubeDim,
    /// Number of lanes of a plane.
    pub plane_dim: u32,
    spin_budget: u32,
    abort: &'a AtomicBool,
}

impl<'a> CubeContext<'a> {
    pub(crate) fn new(
        cube_pos: u32,
        cube_count: u32,
        cube_dim: CubeDim,
        plane_dim: u32,
        spin_budget: u32,
        abort: &'a AtomicBool,
    ) -> Self {
        Self {
            cube_pos,
            cube_count,
            cube_dim,
            plane_dim,
            spin_budget,
            abort,
        }
    }

    /// Number of units in the cube.
    pub fn units(&self) -> u32 {
        self.cube_dim.num_elems()
    }

    /// Number of planes in the cube.
    pub fn plane_count(&self) -> u32 {
        self.units().div_ceil(self.plane_dim)
    }

    /// Spin until `ready` returns true.
    ///
    /// Waiting is only valid on data published by another cube that already started executing,
    /// which is the case for any cube that acquired a lower dynamic id. After the spin budget,
    /// the worker yields between attempts, and the cube unwinds when the launch was aborted.
    pub fn spin_wait<F: FnMut() -> bool>(&self, mut ready: F) {
        let mut spins = 0u32;

        while !ready() {
            if spins < self.spin_budget {
                spins += 1;
                core::hint::spin_loop();
                continue;
            }

            if self.abort.load(Ordering::Relaxed) {
                std::panic::resume_unwind(Box::new(LaunchAborted));
            }
            std::thread::yield_now();
        }
    }
}
