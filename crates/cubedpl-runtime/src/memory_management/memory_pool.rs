use super::{MemoryUsage, calculate_padding};
use crate::{
    id::{Pinned, Tracked},
    server::IoError,
    storage::{BytesStorage, STORAGE_ALIGNMENT, StorageHandle, StorageId, StorageUtilization},
};
use hashbrown::{HashMap, HashSet};

crate::counter_id!(
    /// Identifies a slice of memory handed out by the pool.
    pub SliceId
);

/// Handle to a slice of device memory.
#[derive(Clone, Debug)]
pub struct SliceHandle {
    value: Tracked<SliceId>,
}

/// Binding to a slice of device memory, keeps the slice reserved while alive.
#[derive(Clone, Debug)]
pub struct SliceBinding {
    value: Pinned<SliceId>,
}

impl SliceHandle {
    fn new() -> Self {
        Self {
            value: Tracked::new(SliceId::new()),
        }
    }

    /// The id of the slice.
    pub fn id(&self) -> &SliceId {
        self.value.id()
    }

    /// Whether the handle is the only user-side reference to the slice.
    pub fn can_mut(&self) -> bool {
        self.value.is_exclusive()
    }

    /// Whether no handle nor binding references the slice anymore.
    pub fn is_free(&self) -> bool {
        self.value.is_released()
    }

    /// Convert the handle into a binding.
    pub fn binding(self) -> SliceBinding {
        SliceBinding {
            value: self.value.pin(),
        }
    }
}

impl SliceBinding {
    /// The id of the slice.
    pub fn id(&self) -> &SliceId {
        self.value.id()
    }
}

struct MemoryPage {
    handle: SliceHandle,
    storage: StorageHandle,
    page_size: u64,
    padding: u64,
}

/// A memory pool where every allocation is a separate page.
///
/// Page sizes are rounded to the next power of two so freed pages can serve later requests of a
/// similar size. Pages left unused for a whole deallocation period are returned to the storage.
pub struct ExclusiveMemoryPool {
    pages: HashMap<SliceId, MemoryPage>,
    dealloc_marked: HashSet<StorageId>,
    min_page_size: u64,
    dealloc_period: u64,
    last_dealloc: u64,
}

impl ExclusiveMemoryPool {
    /// Create a new pool.
    pub fn new(min_page_size: u64, dealloc_period: u64) -> Self {
        Self {
            pages: HashMap::new(),
            dealloc_marked: HashSet::new(),
            min_page_size: min_page_size.max(STORAGE_ALIGNMENT),
            dealloc_period,
            last_dealloc: 0,
        }
    }

    /// Size of the page used to serve a request of `size` bytes.
    pub fn page_size(&self, size: u64) -> u64 {
        size.max(self.min_page_size).next_power_of_two()
    }

    /// Returns the storage of the slice bound.
    pub fn get(&self, binding: &SliceBinding) -> Option<&StorageHandle> {
        self.pages.get(binding.id()).map(|page| &page.storage)
    }

    /// Reuse a free page of the right size if one exists.
    pub fn try_reserve(&mut self, size: u64) -> Option<SliceHandle> {
        let page_size = self.page_size(size);
        let page = self
            .pages
            .values_mut()
            .find(|page| page.page_size == page_size && page.handle.is_free())?;

        page.storage.utilization = StorageUtilization { offset: 0, size };
        page.padding = calculate_padding(size, STORAGE_ALIGNMENT);
        self.dealloc_marked.remove(&page.storage.id);

        Some(page.handle.clone())
    }

    /// Allocate a new page for a request of `size` bytes.
    pub fn alloc(&mut self, storage: &mut BytesStorage, size: u64) -> Result<SliceHandle, IoError> {
        let page_size = self.page_size(size);
        let mut storage_handle = storage.alloc(page_size)?;
        storage_handle.utilization = StorageUtilization { offset: 0, size };

        let handle = SliceHandle::new();
        self.pages.insert(
            *handle.id(),
            MemoryPage {
                handle: handle.clone(),
                storage: storage_handle,
                page_size,
                padding: calculate_padding(size, STORAGE_ALIGNMENT),
            },
        );

        Ok(handle)
    }

    /// Total bytes reserved from the storage.
    pub fn bytes_reserved(&self) -> u64 {
        self.pages.values().map(|page| page.page_size).sum()
    }

    /// Memory usage of the pool.
    pub fn get_memory_usage(&self) -> MemoryUsage {
        let mut usage = MemoryUsage {
            bytes_reserved: self.bytes_reserved(),
            ..Default::default()
        };

        for page in self.pages.values().filter(|page| !page.handle.is_free()) {
            usage.number_allocs += 1;
            usage.bytes_in_use += page.storage.size();
            usage.bytes_padding += page.padding;
        }

        usage
    }

    /// Deallocate every free page right away, returning the number of bytes released.
    pub fn release_free(&mut self, storage: &mut BytesStorage) -> u64 {
        let mut released = 0;

        self.pages.retain(|_, page| {
            if page.handle.is_free() {
                storage.dealloc(page.storage.id);
                released += page.page_size;
                return false;
            }
            true
        });
        self.dealloc_marked.clear();

        released
    }

    /// Periodic cleanup: a free page is marked on the first pass and deallocated if it is still
    /// free on the next one.
    pub fn cleanup(&mut self, storage: &mut BytesStorage, alloc_nr: u64, explicit: bool) {
        if explicit {
            self.release_free(storage);
            return;
        }

        if alloc_nr - self.last_dealloc < self.dealloc_period {
            return;
        }

        self.last_dealloc = alloc_nr;

        let marked = &mut self.dealloc_marked;
        self.pages.retain(|_, page| {
            if page.handle.is_free() && !marked.insert(page.storage.id) {
                storage.dealloc(page.storage.id);
                marked.remove(&page.storage.id);
                return false;
            }
            true
        });
    }
}

impl core::fmt::Debug for ExclusiveMemoryPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExclusiveMemoryPool")
            .field("pages", &self.pages.len())
            .field("bytes_reserved", &self.bytes_reserved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_page_is_reused() {
        let mut storage = BytesStorage::default();
        let mut pool = ExclusiveMemoryPool::new(256, 1000);

        let first = pool.alloc(&mut storage, 100).unwrap();
        let first_id = *first.id();
        assert!(pool.try_reserve(100).is_none());

        core::mem::drop(first);
        let reused = pool.try_reserve(200).unwrap();
        assert_eq!(*reused.id(), first_id);
    }

    #[test]
    fn pages_of_other_sizes_are_not_reused() {
        let mut storage = BytesStorage::default();
        let mut pool = ExclusiveMemoryPool::new(256, 1000);

        core::mem::drop(pool.alloc(&mut storage, 100).unwrap());
        assert!(pool.try_reserve(4096).is_none());
        assert_eq!(pool.page_size(4096), 4096);
        assert_eq!(pool.page_size(4097), 8192);
    }

    #[test]
    fn usage_counts_live_allocations() {
        let mut storage = BytesStorage::default();
        let mut pool = ExclusiveMemoryPool::new(256, 1000);

        let _a = pool.alloc(&mut storage, 100).unwrap();
        let b = pool.alloc(&mut storage, 1000).unwrap();
        core::mem::drop(b);

        let usage = pool.get_memory_usage();
        assert_eq!(usage.number_allocs, 1);
        assert_eq!(usage.bytes_in_use, 100);
        assert_eq!(usage.bytes_padding, 28);
        assert_eq!(usage.bytes_reserved, 256 + 1024);
    }

    #[test]
    fn cleanup_deallocates_after_two_periods() {
        let mut storage = BytesStorage::default();
        let mut pool = ExclusiveMemoryPool::new(256, 10);

        core::mem::drop(pool.alloc(&mut storage, 100).unwrap());
        pool.cleanup(&mut storage, 10, false);
        assert_eq!(pool.bytes_reserved(), 256);
        pool.cleanup(&mut storage, 20, false);
        assert_eq!(pool.bytes_reserved(), 0);
    }
}
