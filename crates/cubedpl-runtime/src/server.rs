use crate::{
    BackTrace,
    cube::CubeCount,
    kernel::CubeKernel,
    memory_management::{MemoryUsage, SliceBinding, SliceHandle},
    storage::BytesResource,
};
use std::sync::{Arc, Condvar, Mutex};
use thiserror::Error;

/// A device: owns its memory and the stream executing the submitted work in order.
///
/// Servers are mutated by every call and are only reached through a
/// [ComputeClient](crate::client::ComputeClient), which serializes the accesses.
pub trait ComputeServer: Send + core::fmt::Debug + 'static {
    /// Upload `data` to a new buffer.
    fn create(&mut self, data: &[u8]) -> Result<Handle, IoError>;

    /// Reserve a buffer of `size` bytes.
    ///
    /// The memory content is unspecified: a reused page keeps the bytes of its previous user.
    fn empty(&mut self, size: usize) -> Result<Handle, IoError>;

    /// Enqueue the read of the given bindings after all the work already submitted.
    fn read(&mut self, bindings: Vec<Binding>) -> Result<PendingRead, IoError>;

    /// Enqueue the write of `data` at the start of the binding.
    fn write(&mut self, binding: Binding, data: &[u8]) -> Result<(), IoError>;

    /// Enqueue the copy of `src` into `dst`, up to the size of the smallest of the two.
    fn copy(&mut self, src: Binding, dst: Binding) -> Result<(), IoError>;

    /// Enqueue a kernel launch.
    ///
    /// # Safety
    ///
    /// When executing with [ExecutionMode::Unchecked], out-of-bound accesses of the kernel are
    /// undefined behavior.
    unsafe fn launch(
        &mut self,
        kernel: Box<dyn CubeKernel>,
        count: CubeCount,
        bindings: Bindings,
        mode: ExecutionMode,
    ) -> Result<(), LaunchError>;

    /// Enqueue a host callback, executed once all the work already submitted completed.
    fn callback(&mut self, callback: Box<dyn FnOnce() + Send>);

    /// Enqueue an event completed once all the work already submitted completed.
    fn event(&mut self) -> Event;

    /// Memory reserved by the device.
    fn memory_usage(&self) -> MemoryUsage;

    /// Free the pages no handle references anymore.
    fn memory_cleanup(&mut self);

    /// The properties of the device.
    fn properties(&self) -> &DeviceProperties;
}

/// Properties of an emulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Lanes per plane.
    pub plane_size: u32,
    /// Maximum number of units in a cube.
    pub max_units_per_cube: u32,
    /// Maximum shared memory per cube in bytes.
    pub max_shared_memory: usize,
    /// Number of workers executing cubes concurrently.
    pub num_workers: usize,
    /// Maximum memory the device can reserve.
    pub max_memory: Option<u64>,
}

/// Execution mode for kernel launches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Checked kernels are safe: every buffer access is bounds checked.
    #[default]
    Checked,
    /// Accesses aren't checked, the kernel must stay in bounds.
    Unchecked,
}

/// Server handle containing the [memory handle](SliceHandle).
#[derive(new, Debug, Clone)]
pub struct Handle {
    /// Memory handle.
    pub memory: SliceHandle,
    /// Length of the underlying buffer in bytes.
    size: u64,
}

impl Handle {
    /// Returns the size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of elements of type `T` fitting in the buffer.
    pub fn len<T>(&self) -> usize {
        match core::mem::size_of::<T>() {
            0 => 0,
            elem_size => self.size as usize / elem_size,
        }
    }

    /// If the buffer can be mutated in place by the owner of this handle.
    pub fn can_mut(&self) -> bool {
        self.memory.can_mut()
    }

    /// Convert the [handle](Handle) into a [binding](Binding).
    pub fn binding(self) -> Binding {
        Binding {
            memory: self.memory.binding(),
            size: self.size,
        }
    }
}

/// Binding of a [handle](Handle) to a launch, keeps the memory reserved while alive.
#[derive(new, Debug, Clone)]
pub struct Binding {
    /// Memory binding.
    pub memory: SliceBinding,
    /// Length of the underlying buffer in bytes.
    pub size: u64,
}

/// Buffers bound to a kernel launch.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    /// Buffer bindings, in binding order.
    pub buffers: Vec<Binding>,
}

impl Bindings {
    /// Create a new, empty bindings set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a buffer binding.
    pub fn with_buffer(mut self, binding: Binding) -> Self {
        self.buffers.push(binding);
        self
    }

    /// Extend the buffer bindings.
    pub fn with_buffers(mut self, bindings: Vec<Binding>) -> Self {
        self.buffers.extend(bindings);
        self
    }
}

/// Failure of a memory operation: allocation, transfer or handle lookup.
#[derive(Error, Clone)]
pub enum IoError {
    /// A single buffer larger than the device allows.
    #[error("buffer of {size} bytes exceeds the device limit\n{backtrace}")]
    BufferTooBig {
        /// Requested bytes.
        size: u64,
        /// Where the allocation was requested.
        backtrace: BackTrace,
    },

    /// The device can't reserve more memory.
    #[error("out of device memory: requested {requested} bytes, limit {max:?}\n{backtrace}")]
    OutOfMemory {
        /// Requested bytes.
        requested: u64,
        /// Memory limit of the device.
        max: Option<u64>,
        /// Where the allocation was requested.
        backtrace: BackTrace,
    },

    /// The handle doesn't belong to this device.
    #[error("unknown handle for this device\n{backtrace}")]
    InvalidHandle {
        /// Where the handle was used.
        backtrace: BackTrace,
    },

    /// The data doesn't fit in the buffer.
    #[error("can't write {actual} bytes in a buffer of {expected} bytes\n{backtrace}")]
    SizeMismatch {
        /// Bytes of the buffer.
        expected: u64,
        /// Bytes of the data.
        actual: u64,
        /// Where the write was requested.
        backtrace: BackTrace,
    },

    /// The work the operation waited on failed.
    #[error("device execution failed: {0}")]
    Execution(#[from] Box<ServerError>),
}

/// Failure to enqueue a kernel.
#[derive(Error, Clone)]
pub enum LaunchError {
    /// The launch parameters are invalid.
    #[error("invalid launch parameters: {reason}")]
    InvalidParams {
        /// What is wrong with the parameters.
        reason: String,
    },

    /// The kernel needs more than a cube can provide.
    #[error("launch exceeds the cube limits: {0}")]
    TooManyResources(#[from] ResourceLimitError),

    /// The stream of the device can't accept work anymore.
    #[error("launch rejected: {reason}\n{backtrace}")]
    Unknown {
        /// Why the launch was rejected.
        reason: String,
        /// Where the launch was requested.
        backtrace: BackTrace,
    },

    /// A bound buffer couldn't be resolved.
    #[error("launch failed on a bound buffer: {0}")]
    IoError(#[from] IoError),
}

/// Limits of a single cube.
#[derive(Error, Clone)]
pub enum ResourceLimitError {
    /// Shared memory above the per-cube maximum.
    #[error("{requested} bytes of shared memory requested, at most {max} per cube\n{backtrace}")]
    SharedMemory {
        /// Requested bytes.
        requested: usize,
        /// Bytes available per cube.
        max: usize,
        /// Where the launch was requested.
        backtrace: BackTrace,
    },
    /// Units above the per-cube maximum.
    #[error("{requested} units per cube requested, at most {max}\n{backtrace}")]
    Units {
        /// Requested units.
        requested: u32,
        /// Units available per cube.
        max: u32,
        /// Where the launch was requested.
        backtrace: BackTrace,
    },
}

macro_rules! debug_as_display {
    ($($ty:ty),*) => {$(
        impl core::fmt::Debug for $ty {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(self, f)
            }
        }
    )*};
}

debug_as_display!(IoError, LaunchError, ResourceLimitError);

/// Failure raised while the stream executes submitted work, reported by the next wait.
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    /// Any other failure of the device.
    #[error("device error: {reason}\n{backtrace}")]
    Generic {
        /// What failed.
        reason: String,
        /// Where the failure was detected.
        backtrace: BackTrace,
    },

    /// A cube panicked while executing a kernel.
    #[error("kernel `{kernel}` panicked in cube {cube}: {reason}")]
    KernelPanic {
        /// Name of the kernel.
        kernel: &'static str,
        /// Position of the cube.
        cube: u32,
        /// The panic message.
        reason: String,
    },

    /// Submitted work couldn't be launched.
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// A memory operation failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// The stream of the device stopped.
    #[error("device stream stopped: {reason}\n{backtrace}")]
    ServerUnhealthy {
        /// Why the stream stopped.
        reason: String,
        /// Where the failure was detected.
        backtrace: BackTrace,
    },
}

/// Completion marker of the work submitted to a stream.
///
/// The event is completed by the stream once all the work submitted before it was executed,
/// carrying the first error raised by that work, if any.
#[derive(Clone, Debug, Default)]
pub struct Event {
    state: Arc<EventState>,
}

#[derive(Debug, Default)]
struct EventState {
    result: Mutex<Option<Result<(), ServerError>>>,
    ready: Condvar,
}

impl Event {
    /// Create an event that is not completed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an already completed event.
    pub fn completed(result: Result<(), ServerError>) -> Self {
        let event = Self::new();
        event.complete(result);
        event
    }

    /// Complete the event, waking every waiter. Only the first completion is kept.
    pub fn complete(&self, result: Result<(), ServerError>) {
        let mut state = self
            .state
            .result
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if state.is_none() {
            *state = Some(result);
        }
        self.state.ready.notify_all();
    }

    /// Whether the event is completed.
    pub fn is_completed(&self) -> bool {
        self.state
            .result
            .lock()
            .map(|state| state.is_some())
            .unwrap_or(true)
    }

    /// Block until the event is completed.
    pub fn wait(&self) -> Result<(), ServerError> {
        let mut state = self
            .state
            .result
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            if let Some(result) = state.as_ref() {
                return result.clone();
            }
            state = self
                .state
                .ready
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

/// Read enqueued on a stream, resolved once the stream reached it.
#[derive(new, Debug)]
pub struct PendingRead {
    event: Event,
    resources: Vec<(BytesResource, Binding)>,
}

impl PendingRead {
    /// Wait for the stream and copy the buffers to the host.
    pub fn wait(self) -> Result<Vec<Vec<u8>>, ServerError> {
        self.event.wait()?;

        Ok(self
            .resources
            .iter()
            // SAFETY: The stream executed all the work submitted before the read.
            .map(|(resource, _binding)| unsafe { resource.read() })
            .collect())
    }
}
