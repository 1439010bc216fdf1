/// Configuration of the emulated device executing the kernels.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ExecutionConfig {
    /// Number of worker threads executing cubes, defaults to the available parallelism.
    #[serde(default)]
    pub num_workers: Option<usize>,

    /// Number of lanes of a plane, a power of two between 8 and 64.
    #[serde(default = "plane_size_default")]
    pub plane_size: u32,

    /// Number of spin iterations before a waiting cube starts yielding its worker.
    #[serde(default = "spin_budget_default")]
    pub spin_budget: u32,

    /// Maximum number of units in a cube.
    #[serde(default = "max_units_per_cube_default")]
    pub max_units_per_cube: u32,

    /// Maximum amount of shared memory a kernel can request per cube, in bytes.
    #[serde(default = "max_shared_memory_default")]
    pub max_shared_memory: usize,
}

fn plane_size_default() -> u32 {
    32
}

fn spin_budget_default() -> u32 {
    1024
}

fn max_units_per_cube_default() -> u32 {
    1024
}

fn max_shared_memory_default() -> usize {
    1024 * 1024
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            num_workers: None,
            plane_size: plane_size_default(),
            spin_budget: spin_budget_default(),
            max_units_per_cube: max_units_per_cube_default(),
            max_shared_memory: max_shared_memory_default(),
        }
    }
}

impl ExecutionConfig {
    /// The number of workers to spawn for a device.
    pub fn workers(&self) -> usize {
        match self.num_workers {
            Some(workers) => workers.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }

    /// The plane size, clamped to a supported value.
    pub fn plane_size(&self) -> u32 {
        self.plane_size.clamp(8, 64).next_power_of_two()
    }
}
