use super::BytesResource;
use crate::element::CubeElement;
use core::{
    marker::PhantomData,
    ops::Range,
    sync::atomic::{AtomicU32, Ordering},
};

/// Typed view over a device buffer, as seen from inside a kernel.
///
/// Every cube of a launch holds its own view over the same memory. Kernels are responsible for
/// not writing the same element from two cubes without synchronization, see
/// [CubeKernel](crate::kernel::CubeKernel).
pub struct Array<'a, T> {
    ptr: *mut T,
    len: usize,
    checked: bool,
    _resource: PhantomData<&'a BytesResource>,
}

impl<'a, T: CubeElement> Array<'a, T> {
    pub(crate) fn new(resource: &'a BytesResource, checked: bool) -> Self {
        let elem_size = core::mem::size_of::<T>();
        let len = match elem_size {
            0 => 0,
            size => resource.size() / size,
        };

        Self {
            ptr: resource.ptr() as *mut T,
            len,
            checked,
            _resource: PhantomData,
        }
    }

    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    fn check(&self, index: usize) {
        if self.checked {
            assert!(
                index < self.len,
                "Index out of bounds: the len is {} but the index is {index}",
                self.len
            );
        } else {
            debug_assert!(index < self.len);
        }
    }

    /// Read the element at the given index.
    #[inline]
    pub fn read(&self, index: usize) -> T {
        self.check(index);
        // SAFETY: In bounds, checked above in checked mode or guaranteed by the unchecked
        // launch contract otherwise.
        unsafe { self.ptr.add(index).read() }
    }

    /// Write the element at the given index.
    #[inline]
    pub fn write(&self, index: usize, value: T) {
        self.check(index);
        // SAFETY: See `read`.
        unsafe { self.ptr.add(index).write(value) }
    }

    /// Copy a range of the view into a local vector (shared memory).
    pub fn load(&self, range: Range<usize>) -> Vec<T> {
        if range.is_empty() {
            return Vec::new();
        }
        self.check(range.end - 1);
        let mut values = Vec::with_capacity(range.len());
        for index in range {
            // SAFETY: The whole range is in bounds.
            values.push(unsafe { self.ptr.add(index).read() });
        }
        values
    }

    /// Copy `values` into the view starting at `offset`.
    pub fn store(&self, offset: usize, values: &[T]) {
        if values.is_empty() {
            return;
        }
        self.check(offset + values.len() - 1);
        for (i, value) in values.iter().enumerate() {
            // SAFETY: The whole range is in bounds.
            unsafe { self.ptr.add(offset + i).write(*value) };
        }
    }
}

/// Atomic view over a device buffer of 32-bit words.
pub struct AtomicArray<'a> {
    ptr: *const AtomicU32,
    len: usize,
    checked: bool,
    _resource: PhantomData<&'a BytesResource>,
}

impl<'a> AtomicArray<'a> {
    pub(crate) fn new(resource: &'a BytesResource, checked: bool) -> Self {
        Self {
            ptr: resource.ptr() as *const AtomicU32,
            len: resource.size() / core::mem::size_of::<u32>(),
            checked,
            _resource: PhantomData,
        }
    }

    /// Number of atomic words in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    fn get(&self, index: usize) -> &AtomicU32 {
        if self.checked {
            assert!(
                index < self.len,
                "Atomic index out of bounds: the len is {} but the index is {index}",
                self.len
            );
        } else {
            debug_assert!(index < self.len);
        }
        // SAFETY: In bounds, storage is aligned to 32 bytes and atomics have the layout of u32.
        unsafe { &*self.ptr.add(index) }
    }

    /// Atomic load.
    #[inline]
    pub fn load(&self, index: usize, order: Ordering) -> u32 {
        self.get(index).load(order)
    }

    /// Atomic store.
    #[inline]
    pub fn store(&self, index: usize, value: u32, order: Ordering) {
        self.get(index).store(value, order)
    }

    /// Atomic add, returning the previous value.
    #[inline]
    pub fn fetch_add(&self, index: usize, value: u32, order: Ordering) -> u32 {
        self.get(index).fetch_add(value, order)
    }
}
