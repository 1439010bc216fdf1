use crate::{
    cube::CubeCount,
    kernel::CubeKernel,
    memory_management::MemoryUsage,
    server::{
        Binding, Bindings, ComputeServer, DeviceProperties, Event, ExecutionMode, Handle, IoError,
        LaunchError, ServerError,
    },
};
use spin::Mutex;
use std::sync::Arc;

/// Shared access to a server, every call holding its lock for the time of the enqueue.
///
/// Waits happen after the lock is released.
#[derive(Debug)]
pub struct LockedChannel<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for LockedChannel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ComputeServer> LockedChannel<S> {
    /// Share `server`.
    pub fn new(server: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(server)),
        }
    }

    /// Read the bindings once all the work submitted before completed.
    pub fn read(&self, bindings: Vec<Binding>) -> Result<Vec<Vec<u8>>, ServerError> {
        // The guard has to be dropped before waiting, host callbacks executed by the stream may
        // need the server.
        let pending = {
            let mut device = self.inner.lock();
            device.read(bindings)?
        };
        pending.wait()
    }

    /// Store the data and return its handle.
    pub fn create(&self, data: &[u8]) -> Result<Handle, IoError> {
        self.inner.lock().create(data)
    }

    /// Reserve a buffer of `size` bytes.
    pub fn empty(&self, size: usize) -> Result<Handle, IoError> {
        self.inner.lock().empty(size)
    }

    /// Enqueue a write.
    pub fn write(&self, binding: Binding, data: &[u8]) -> Result<(), IoError> {
        self.inner.lock().write(binding, data)
    }

    /// Enqueue a copy.
    pub fn copy(&self, src: Binding, dst: Binding) -> Result<(), IoError> {
        self.inner.lock().copy(src, dst)
    }

    /// Enqueue a launch.
    ///
    /// # Safety
    ///
    /// See [ComputeServer::launch].
    pub unsafe fn launch(
        &self,
        kernel: Box<dyn CubeKernel>,
        count: CubeCount,
        bindings: Bindings,
        mode: ExecutionMode,
    ) -> Result<(), LaunchError> {
        // SAFETY: Forwarded from the caller.
        unsafe { self.inner.lock().launch(kernel, count, bindings, mode) }
    }

    /// Enqueue a host callback.
    pub fn callback(&self, callback: Box<dyn FnOnce() + Send>) {
        self.inner.lock().callback(callback)
    }

    /// Enqueue an event.
    pub fn event(&self) -> Event {
        self.inner.lock().event()
    }

    /// Memory reserved by the device.
    pub fn memory_usage(&self) -> MemoryUsage {
        self.inner.lock().memory_usage()
    }

    /// Release unused memory.
    pub fn memory_cleanup(&self) {
        self.inner.lock().memory_cleanup()
    }

    /// Properties of the device.
    pub fn properties(&self) -> DeviceProperties {
        self.inner.lock().properties().clone()
    }
}
