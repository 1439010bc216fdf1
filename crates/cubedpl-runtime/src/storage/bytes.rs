use super::{StorageHandle, StorageId, StorageUtilization};
use crate::{BackTrace, server::IoError};
use hashbrown::HashMap;
use std::{
    alloc::{Layout, alloc_zeroed, dealloc},
    ptr::NonNull,
    sync::Arc,
};

/// Alignment of every allocation made by [BytesStorage].
pub const STORAGE_ALIGNMENT: u64 = 32;

/// A heap allocation owned by the storage.
///
/// Resources keep the allocation alive through an [Arc], so a buffer deallocated by the memory
/// pool is only released once the last queued task referencing it completes.
struct AllocatedBytes {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: The allocation is plain bytes, concurrent accesses are coordinated by the kernels.
unsafe impl Send for AllocatedBytes {}
// SAFETY: See above.
unsafe impl Sync for AllocatedBytes {}

impl Drop for AllocatedBytes {
    fn drop(&mut self) {
        // SAFETY: The pointer was returned by `alloc_zeroed` with the same layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// The memory resource that can be accessed by kernels and by the host.
#[derive(Clone)]
pub struct BytesResource {
    block: Arc<AllocatedBytes>,
    offset: usize,
    size: usize,
}

impl core::fmt::Debug for BytesResource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BytesResource")
            .field("ptr", &self.ptr())
            .field("size", &self.size)
            .finish()
    }
}

impl BytesResource {
    /// Pointer to the first byte of the resource.
    pub fn ptr(&self) -> *mut u8 {
        // SAFETY: The offset is within the allocation, checked when the resource was created.
        unsafe { self.block.ptr.as_ptr().add(self.offset) }
    }

    /// The size of the resource in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Copy `data` at the start of the resource.
    ///
    /// # Safety
    ///
    /// No kernel may access the resource concurrently.
    pub(crate) unsafe fn write(&self, data: &[u8]) {
        let len = data.len().min(self.size);
        // SAFETY: `len` fits in the resource and the caller guarantees exclusive access.
        unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr(), len) }
    }

    /// Copy the content of the resource into a new vector.
    ///
    /// # Safety
    ///
    /// No kernel may write to the resource concurrently.
    pub(crate) unsafe fn read(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size];
        // SAFETY: `bytes` has exactly `size` bytes and the caller guarantees no concurrent writes.
        unsafe { core::ptr::copy_nonoverlapping(self.ptr(), bytes.as_mut_ptr(), self.size) };
        bytes
    }
}

/// Heap backed storage of the emulated device.
#[derive(Default)]
pub struct BytesStorage {
    memory: HashMap<StorageId, Arc<AllocatedBytes>>,
}

impl core::fmt::Debug for BytesStorage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BytesStorage")
            .field("allocations", &self.memory.len())
            .finish()
    }
}

impl BytesStorage {
    /// Allocate a new zeroed memory chunk of `size` bytes.
    pub fn alloc(&mut self, size: u64) -> Result<StorageHandle, IoError> {
        let too_big = || IoError::BufferTooBig {
            size,
            backtrace: BackTrace::capture(),
        };
        let bytes = usize::try_from(size.max(STORAGE_ALIGNMENT)).map_err(|_| too_big())?;
        let layout =
            Layout::from_size_align(bytes, STORAGE_ALIGNMENT as usize).map_err(|_| too_big())?;

        // SAFETY: The layout has a non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| IoError::OutOfMemory {
            requested: size,
            max: None,
            backtrace: BackTrace::capture(),
        })?;

        let id = StorageId::new();
        self.memory
            .insert(id, Arc::new(AllocatedBytes { ptr, layout }));

        Ok(StorageHandle::new(
            id,
            StorageUtilization { offset: 0, size },
        ))
    }

    /// Returns the resource pointed by the handle.
    pub fn get(&self, handle: &StorageHandle) -> Option<BytesResource> {
        let block = self.memory.get(&handle.id)?;
        let offset = handle.offset() as usize;
        let size = handle.size() as usize;

        if offset + size > block.layout.size() {
            return None;
        }

        Some(BytesResource {
            block: block.clone(),
            offset,
            size,
        })
    }

    /// Release the memory chunk. Resources still alive keep it allocated until they are dropped.
    pub fn dealloc(&mut self, id: StorageId) {
        self.memory.remove(&id);
    }
}
