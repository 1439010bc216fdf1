use cubedpl_runtime::{
    client::ComputeClient,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    kernel::{CubeKernel, KernelBindings},
    plane::{plane_broadcast, plane_elect, plane_leader},
    server::{Binding, Bindings, ComputeServer, Handle, LaunchError},
    storage::{Array, AtomicArray},
};
use core::sync::atomic::Ordering;

/// The tile didn't publish anything yet.
pub const NOT_READY: u32 = 0;
/// The partial slot holds the reduction of the tile alone.
pub const PARTIAL_MASK: u32 = 1;
/// The full slot holds the reduction of the tile and every tile before it.
pub const FULL_MASK: u32 = 2;
/// Padding cell before the first tile.
pub const OUT_OF_BOUNDS: u32 = 4;

/// Layout of a status array and of its value slots.
///
/// Every tile owns `width` status cells, one per bucket. The first `padding` tiles are
/// [OUT_OF_BOUNDS] so a plane looking back from any tile never reads before the buffer, and the
/// cell after the last tile is the dynamic tile id dispenser. Value slots are aligned with the
/// status cells: partial slots first, then full slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLayout {
    /// Number of live tiles.
    pub tiles: u32,
    /// Number of buckets per tile.
    pub width: u32,
    /// Number of padding tiles, the plane size.
    pub padding: u32,
}

impl StatusLayout {
    /// Layout of a scan status array, one bucket per tile.
    pub fn scan(tiles: u32, padding: u32) -> Self {
        Self::new(tiles, 1, padding)
    }

    /// Create a new layout.
    pub fn new(tiles: u32, width: u32, padding: u32) -> Self {
        Self {
            tiles,
            width,
            padding,
        }
    }

    /// Number of status cells, dispenser included.
    pub fn status_len(&self) -> usize {
        self.dispenser() + 1
    }

    /// Number of value slots.
    pub fn values_len(&self) -> usize {
        (self.padding as usize + 2 * self.tiles as usize) * self.width as usize
    }

    /// Index of the tile id dispenser.
    pub fn dispenser(&self) -> usize {
        (self.padding as usize + self.tiles as usize) * self.width as usize
    }

    /// Index of the status cell of a tile, negative tiles being padding.
    pub fn status_index(&self, tile: i64, bucket: u32) -> usize {
        debug_assert!(tile >= -(self.padding as i64) && tile < self.tiles as i64);
        debug_assert!(bucket < self.width);

        (tile + self.padding as i64) as usize * self.width as usize + bucket as usize
    }

    /// Index of the partial or full value slot of a tile.
    pub fn value_index(&self, tile: i64, bucket: u32, full: bool) -> usize {
        let offset = match full {
            true => self.tiles as usize * self.width as usize,
            false => 0,
        };
        self.status_index(tile, bucket) + offset
    }
}

/// Device-side view over a status array and its value slots.
///
/// Every slot is written once by the tile owning it, before the matching status is stored with
/// release ordering. Readers load the status with acquire ordering before reading a slot.
pub struct TileStatus<'a, N> {
    flags: AtomicArray<'a>,
    values: Array<'a, N>,
    layout: StatusLayout,
}

impl<'a, N: CubeElement> TileStatus<'a, N> {
    /// Create the view from the bound status and values buffers.
    pub fn new(flags: AtomicArray<'a>, values: Array<'a, N>, layout: StatusLayout) -> Self {
        debug_assert!(flags.len() >= layout.status_len());
        debug_assert!(values.len() >= layout.values_len());

        Self {
            flags,
            values,
            layout,
        }
    }

    /// The layout of the status array.
    pub fn layout(&self) -> &StatusLayout {
        &self.layout
    }

    /// Acquire the next tile id. Ids are unique and dense in `[0, tiles)` when every cube of the
    /// launch acquires exactly one.
    ///
    /// The leader of the plane fetches the id, which every lane then reads from it.
    pub fn acquire_tile_id(&self, cube: &CubeContext<'_>) -> u32 {
        let ids: Vec<u32> = (0..cube.plane_dim)
            .map(|lane| match plane_elect(lane) {
                true => self
                    .flags
                    .fetch_add(self.layout.dispenser(), 1, Ordering::Relaxed),
                false => 0,
            })
            .collect();

        plane_broadcast(&ids, plane_leader(cube.plane_dim))
    }

    /// Publish the reduction of the tile alone.
    pub fn publish_partial(&self, tile: u32, bucket: u32, value: N) {
        self.publish(tile, bucket, value, PARTIAL_MASK);
    }

    /// Publish the reduction of the tile and every tile before it.
    pub fn publish_full(&self, tile: u32, bucket: u32, value: N) {
        self.publish(tile, bucket, value, FULL_MASK);
    }

    fn publish(&self, tile: u32, bucket: u32, value: N, flag: u32) {
        let tile = tile as i64;
        let full = flag == FULL_MASK;

        self.values
            .write(self.layout.value_index(tile, bucket, full), value);
        self.flags.store(
            self.layout.status_index(tile, bucket),
            flag,
            Ordering::Release,
        );
    }

    /// Load the status of a tile.
    pub fn load_flag(&self, tile: i64, bucket: u32) -> u32 {
        self.flags
            .load(self.layout.status_index(tile, bucket), Ordering::Acquire)
    }

    /// Read a value slot. The matching status must have been observed with [Self::load_flag].
    pub fn value(&self, tile: i64, bucket: u32, full: bool) -> N {
        self.values.read(self.layout.value_index(tile, bucket, full))
    }
}

/// Status cells and value slots reserved on the device for one launch.
#[derive(Debug, Clone)]
pub struct StatusBuffers {
    /// The layout of the buffers.
    pub layout: StatusLayout,
    /// The status cells, `u32`.
    pub flags: Handle,
    /// The value slots.
    pub values: Handle,
}

impl StatusBuffers {
    /// Reserve and initialize the buffers of a layout with values of type `N`.
    pub fn new<S: ComputeServer, N: CubeElement>(
        client: &ComputeClient<S>,
        layout: StatusLayout,
    ) -> Result<Self, LaunchError> {
        let flags = client.empty_array::<u32>(layout.status_len())?;
        let values = client.empty_array::<N>(layout.values_len())?;
        let buffers = Self {
            layout,
            flags,
            values,
        };
        buffers.reset(client)?;

        Ok(buffers)
    }

    /// Enqueue the initialization of the status cells, needed before every launch using them.
    pub fn reset<S: ComputeServer>(&self, client: &ComputeClient<S>) -> Result<(), LaunchError> {
        let len = self.layout.status_len();
        let cells_per_cube = (INIT_UNITS * INIT_CELLS_PER_UNIT) as usize;

        client.launch(
            InitStatusKernel {
                layout: self.layout,
            },
            CubeCount::new_1d(len.div_ceil(cells_per_cube) as u32),
            Bindings::new().with_buffer(self.flags.clone().binding()),
        )
    }

    /// The status and values bindings, in that order.
    pub fn bindings(&self) -> Vec<Binding> {
        vec![self.flags.clone().binding(), self.values.clone().binding()]
    }
}

const INIT_UNITS: u32 = 256;
const INIT_CELLS_PER_UNIT: u32 = 4;

/// Writes the padding, the `NOT_READY` cells and resets the dispenser.
struct InitStatusKernel {
    layout: StatusLayout,
}

// SAFETY: Cells are only accessed atomically.
unsafe impl CubeKernel for InitStatusKernel {
    fn name(&self) -> &'static str {
        "init_status"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(INIT_UNITS)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let flags = bindings.atomic(0);
        let padding_end = self.layout.padding as usize * self.layout.width as usize;
        let dispenser = self.layout.dispenser();
        let per_cube = (INIT_UNITS * INIT_CELLS_PER_UNIT) as usize;
        let start = cube.cube_pos as usize * per_cube;
        let end = (start + per_cube).min(self.layout.status_len());

        for index in start..end {
            let flag = match index {
                index if index < padding_end => OUT_OF_BOUNDS,
                index if index == dispenser => 0,
                _ => NOT_READY,
            };
            flags.store(index, flag, Ordering::Relaxed);
        }
    }
}
