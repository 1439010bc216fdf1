use crate::{
    cube::{CubeContext, CubeDim},
    element::CubeElement,
    server::{ExecutionMode, LaunchError},
    storage::{Array, AtomicArray, BytesResource},
};

/// A kernel executed by the emulated device, one call per cube.
///
/// # Safety
///
/// All cubes of a launch execute concurrently over the same buffers. An implementation must never
/// write an element that another cube of the same launch reads or writes, unless the access goes
/// through an [AtomicArray] or is ordered by a release/acquire pair on one.
pub unsafe trait CubeKernel: Send + Sync + 'static {
    /// The name of the kernel, used in logs and errors.
    fn name(&self) -> &'static str;

    /// The units of every cube.
    fn cube_dim(&self) -> CubeDim;

    /// Bytes of shared memory used by every cube.
    fn shared_memory_size(&self) -> usize {
        0
    }

    /// Execute one cube.
    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings);
}

/// Buffers bound to a launch, in binding order.
#[derive(Debug)]
pub struct KernelBindings {
    buffers: Vec<BytesResource>,
    mode: ExecutionMode,
}

impl KernelBindings {
    pub(crate) fn new(buffers: Vec<BytesResource>, mode: ExecutionMode) -> Self {
        Self { buffers, mode }
    }

    /// Number of bound buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no buffer is bound.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Typed view over the buffer at `index`.
    pub fn array<T: CubeElement>(&self, index: usize) -> Array<'_, T> {
        Array::new(&self.buffers[index], self.checked())
    }

    /// Atomic view over the buffer at `index`.
    pub fn atomic(&self, index: usize) -> AtomicArray<'_> {
        AtomicArray::new(&self.buffers[index], self.checked())
    }

    fn checked(&self) -> bool {
        matches!(self.mode, ExecutionMode::Checked)
    }
}

/// Compile-time configuration of an algorithm kernel.
///
/// A tile covers `workgroup_size × elements_per_workitem` contiguous elements.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelParams {
    /// Elements processed by every unit.
    pub elements_per_workitem: u32,
    /// Units per cube.
    pub workgroup_size: u32,
    /// Name used to identify the kernel.
    pub name: &'static str,
}

impl KernelParams {
    /// Number of elements processed by one cube.
    pub fn tile_size(&self) -> u32 {
        self.workgroup_size * self.elements_per_workitem
    }

    /// The cube dim of kernels using these parameters.
    pub fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(self.workgroup_size)
    }

    /// Check the parameters against the plane size of the device.
    pub fn validate(&self, plane_dim: u32) -> Result<(), LaunchError> {
        if self.elements_per_workitem == 0 || self.workgroup_size == 0 {
            return Err(LaunchError::InvalidParams {
                reason: format!("{}: tile of size zero {self:?}", self.name),
            });
        }

        if self.workgroup_size % plane_dim != 0 {
            return Err(LaunchError::InvalidParams {
                reason: format!(
                    "{}: the workgroup size {} must be a multiple of the plane size {plane_dim}",
                    self.name, self.workgroup_size
                ),
            });
        }

        if self.workgroup_size.checked_mul(self.elements_per_workitem).is_none() {
            return Err(LaunchError::InvalidParams {
                reason: format!("{}: tile size overflows", self.name),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_size_is_units_times_elements() {
        let params = KernelParams::new(4, 64, "scan");
        assert_eq!(params.tile_size(), 256);
        assert_eq!(params.cube_dim(), CubeDim::new_1d(64));
    }

    #[test]
    fn workgroup_must_be_a_multiple_of_the_plane() {
        assert!(KernelParams::new(4, 64, "scan").validate(32).is_ok());
        assert!(KernelParams::new(4, 48, "scan").validate(32).is_err());
        assert!(KernelParams::new(0, 64, "scan").validate(32).is_err());
    }
}
