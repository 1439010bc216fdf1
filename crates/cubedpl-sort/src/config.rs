use cubedpl_runtime::{kernel::KernelParams, server::LaunchError};

/// Bits of a digit.
pub const RADIX_BITS: u32 = 8;
/// Buckets of a digit.
pub const RADIX: u32 = 1 << RADIX_BITS;

/// Order of the sorted keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Smallest key first.
    #[default]
    Ascending,
    /// Largest key first.
    Descending,
}

/// Launch parameters of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortParams {
    /// Tiles of the onesweep passes.
    pub onesweep: KernelParams,
    /// Maximum number of cubes of the histogram kernel.
    pub hist_work_group_count: u32,
    /// Units of a cube of the histogram kernel.
    pub hist_work_group_size: u32,
}

impl SortParams {
    /// Create new sort parameters.
    pub fn new(onesweep: KernelParams, hist_work_group_count: u32, hist_work_group_size: u32) -> Self {
        Self {
            onesweep,
            hist_work_group_count,
            hist_work_group_size,
        }
    }

    /// Check the parameters against the plane size of the device.
    pub fn validate(&self, plane_dim: u32) -> Result<(), LaunchError> {
        self.onesweep.validate(plane_dim)?;

        if self.hist_work_group_count == 0 || self.hist_work_group_size == 0 {
            return Err(LaunchError::InvalidParams {
                reason: format!("histogram: no units to count the keys {self:?}"),
            });
        }

        Ok(())
    }
}

impl Default for SortParams {
    fn default() -> Self {
        Self::new(KernelParams::new(8, 256, "onesweep"), 64, 256)
    }
}
