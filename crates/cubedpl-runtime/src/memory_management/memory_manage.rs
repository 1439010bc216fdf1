use super::{ExclusiveMemoryPool, MemoryUsage, SliceBinding, SliceHandle};
use crate::{
    BackTrace,
    config::memory::MemoryConfig,
    server::IoError,
    storage::{BytesResource, BytesStorage},
};

/// Reserves and keeps track of the memory of one device.
pub struct MemoryManagement {
    pool: ExclusiveMemoryPool,
    storage: BytesStorage,
    max_bytes: Option<u64>,
    alloc_reserve_count: u64,
}

impl core::fmt::Debug for MemoryManagement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryManagement")
            .field("pool", &self.pool)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl MemoryManagement {
    /// Creates the memory management from the configuration.
    pub fn from_configuration(storage: BytesStorage, config: &MemoryConfig) -> Self {
        Self {
            pool: ExclusiveMemoryPool::new(config.min_page_size, config.dealloc_period),
            storage,
            max_bytes: config.max_bytes,
            alloc_reserve_count: 0,
        }
    }

    /// Finds a spot in memory for a resource with the given size in bytes.
    ///
    /// Freed pages are reused first. When the device has a memory limit and a new page would
    /// exceed it, every free page is released before giving up with
    /// [IoError::OutOfMemory].
    pub fn reserve(&mut self, size: u64) -> Result<SliceHandle, IoError> {
        self.alloc_reserve_count += 1;
        self.pool
            .cleanup(&mut self.storage, self.alloc_reserve_count, false);

        if let Some(handle) = self.pool.try_reserve(size) {
            return Ok(handle);
        }

        if let Some(max) = self.max_bytes {
            let page_size = self.pool.page_size(size);

            if self.pool.bytes_reserved() + page_size > max {
                let released = self.pool.release_free(&mut self.storage);
                log::debug!("Released {released} bytes of free pages to reserve {size} bytes");
            }

            if self.pool.bytes_reserved() + page_size > max {
                return Err(IoError::OutOfMemory {
                    requested: size,
                    max: Some(max),
                    backtrace: BackTrace::capture(),
                });
            }
        }

        self.pool.alloc(&mut self.storage, size)
    }

    /// Returns the resource bound to the given binding.
    pub fn get_resource(&self, binding: &SliceBinding) -> Result<BytesResource, IoError> {
        self.pool
            .get(binding)
            .and_then(|handle| self.storage.get(handle))
            .ok_or_else(|| IoError::InvalidHandle {
                backtrace: BackTrace::capture(),
            })
    }

    /// Memory usage of the device.
    pub fn memory_usage(&self) -> MemoryUsage {
        self.pool.get_memory_usage()
    }

    /// Release memory not used anymore, right away when `explicit` is set.
    pub fn cleanup(&mut self, explicit: bool) {
        self.pool
            .cleanup(&mut self.storage, self.alloc_reserve_count, explicit);
    }
}
