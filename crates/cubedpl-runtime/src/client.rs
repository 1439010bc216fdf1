use crate::{
    channel::LockedChannel,
    cube::CubeCount,
    element::CubeElement,
    kernel::CubeKernel,
    memory_management::MemoryUsage,
    server::{
        Bindings, ComputeServer, DeviceProperties, Event, ExecutionMode, Handle, IoError,
        LaunchError, ServerError,
    },
};
use std::sync::Arc;

/// The ComputeClient is the entry point to require tasks from the ComputeServer.
/// It should be obtained for a specific device via the [Runtime](crate::runtime::Runtime).
#[derive(Debug)]
pub struct ComputeClient<Server> {
    channel: LockedChannel<Server>,
    properties: Arc<DeviceProperties>,
}

impl<S> Clone for ComputeClient<S> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            properties: self.properties.clone(),
        }
    }
}

impl<Server> ComputeClient<Server>
where
    Server: ComputeServer,
{
    /// Create a new client with a new server.
    pub fn new(server: Server) -> Self {
        let properties = Arc::new(server.properties().clone());

        Self {
            channel: LockedChannel::new(server),
            properties,
        }
    }

    /// Properties of the device.
    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    /// Given bytes, stores them and returns the handle.
    pub fn create(&self, data: &[u8]) -> Result<Handle, IoError> {
        self.channel.create(data)
    }

    /// Store a slice of elements and return the handle.
    pub fn create_from_slice<T: CubeElement>(&self, data: &[T]) -> Result<Handle, IoError> {
        self.create(T::as_bytes(data))
    }

    /// Reserves `size` bytes in the storage, and returns a handle over them.
    pub fn empty(&self, size: usize) -> Result<Handle, IoError> {
        self.channel.empty(size)
    }

    /// Reserves a buffer for `len` elements of type `T`.
    pub fn empty_array<T: CubeElement>(&self, len: usize) -> Result<Handle, IoError> {
        let size = len
            .checked_mul(core::mem::size_of::<T>())
            .ok_or_else(|| IoError::BufferTooBig {
                size: u64::MAX,
                backtrace: crate::BackTrace::capture(),
            })?;
        self.empty(size)
    }

    /// Given handles, returns owned resources as bytes, once all the work submitted before
    /// completed.
    pub fn read(&self, handles: Vec<Handle>) -> Result<Vec<Vec<u8>>, ServerError> {
        self.channel
            .read(handles.into_iter().map(|h| h.binding()).collect())
    }

    /// Given a handle, returns owned resource as bytes.
    pub fn read_one(&self, handle: Handle) -> Result<Vec<u8>, ServerError> {
        let mut data = self.read(vec![handle])?;
        Ok(data.remove(0))
    }

    /// Given a handle, returns the buffer decoded as elements of type `T`.
    pub fn read_array<T: CubeElement>(&self, handle: Handle) -> Result<Vec<T>, ServerError> {
        let bytes = self.read_one(handle)?;
        Ok(T::from_bytes(&bytes))
    }

    /// Write `data` at the start of the buffer, after all the work already submitted.
    pub fn write(&self, handle: &Handle, data: &[u8]) -> Result<(), IoError> {
        self.channel.write(handle.clone().binding(), data)
    }

    /// Copy `src` into `dst`, after all the work already submitted.
    pub fn copy(&self, src: &Handle, dst: &Handle) -> Result<(), IoError> {
        self.channel
            .copy(src.clone().binding(), dst.clone().binding())
    }

    /// Launch a kernel with bounds checked buffer accesses.
    pub fn launch<K: CubeKernel>(
        &self,
        kernel: K,
        count: CubeCount,
        bindings: Bindings,
    ) -> Result<(), LaunchError> {
        // SAFETY: Checked mode never performs out-of-bounds accesses.
        unsafe {
            self.channel
                .launch(Box::new(kernel), count, bindings, ExecutionMode::Checked)
        }
    }

    /// Launch a kernel without bounds checks.
    ///
    /// # Safety
    ///
    /// The kernel must never access a buffer out of its bounds.
    pub unsafe fn launch_unchecked<K: CubeKernel>(
        &self,
        kernel: K,
        count: CubeCount,
        bindings: Bindings,
    ) -> Result<(), LaunchError> {
        // SAFETY: Forwarded from the caller.
        unsafe {
            self.channel
                .launch(Box::new(kernel), count, bindings, ExecutionMode::Unchecked)
        }
    }

    /// Register a callback executed on the device stream once all the work already submitted
    /// completed.
    pub fn on_complete<F: FnOnce() + Send + 'static>(&self, callback: F) {
        self.channel.callback(Box::new(callback))
    }

    /// An event completed once all the work already submitted completed.
    pub fn event(&self) -> Event {
        self.channel.event()
    }

    /// Wait for the completion of every task submitted so far, returning the first error raised
    /// since the last synchronization.
    pub fn sync(&self) -> Result<(), ServerError> {
        self.event().wait()
    }

    /// Get the current memory usage of this client.
    pub fn memory_usage(&self) -> MemoryUsage {
        self.channel.memory_usage()
    }

    /// Ask the client to release memory that it can release.
    pub fn memory_cleanup(&self) {
        self.channel.memory_cleanup()
    }
}
