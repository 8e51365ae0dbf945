use core::{
    alloc::Layout,
    fmt,
    mem::{self, MaybeUninit},
    ptr::NonNull,
};
use std::alloc;

use bytesize::ByteSize;
use log::{error, trace};

/// An error with allocating memory for a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The requested capacity, in bytes, exceeds `isize::MAX`.
    CapacityOverflow,
    /// The global allocator could not satisfy the request.
    OutOfMemory {
        /// The layout that was requested.
        layout: Layout,
    },
}

impl AllocError {
    /// Diverges the way the standard collections do when an infallible allocation fails.
    pub(crate) fn handle(self) -> ! {
        match self {
            Self::CapacityOverflow => panic!("capacity overflow"),
            Self::OutOfMemory { layout } => alloc::handle_alloc_error(layout),
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow => write!(f, "capacity overflow"),
            Self::OutOfMemory { layout } => write!(
                f,
                "out of memory: failed to allocate {} (align {})",
                ByteSize::b(layout.size() as u64).to_string_as(true),
                layout.align()
            ),
        }
    }
}

impl std::error::Error for AllocError {}

/// An owned block of uninitialized memory with room for `capacity` values of `T`.
///
/// `RawBuffer` owns bytes, not values. It never reads, writes, or drops a `T`; whoever
/// owns the buffer decides which slots are live and must drop them before the buffer
/// is released.
///
/// A buffer with capacity 0 owns no allocation. Its base address is dangling (but
/// well-aligned) so that empty slices over it are valid. Zero-sized types never
/// allocate either, but the requested capacity is still recorded.
pub struct RawBuffer<T> {
    ptr: NonNull<T>,
    cap: usize,
}

// SAFETY: `RawBuffer` is a uniquely owned allocation, like `Box<[MaybeUninit<T>]>`.
unsafe impl<T: Send> Send for RawBuffer<T> {}
unsafe impl<T: Sync> Sync for RawBuffer<T> {}

impl<T> RawBuffer<T> {
    /// Constructs an empty buffer without allocating.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
        }
    }

    /// Allocates a buffer for `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if the size of the block in bytes exceeds `isize::MAX`.
    /// Aborts through [`handle_alloc_error`](std::alloc::handle_alloc_error) if the
    /// allocator fails.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).unwrap_or_else(|err| err.handle())
    }

    /// Allocates a buffer for `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the size of the block overflows or the allocator fails.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let layout = Self::layout(capacity)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                cap: capacity,
            });
        }

        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc::alloc(layout) };
        match NonNull::new(ptr.cast::<T>()) {
            Some(ptr) => {
                trace!(
                    "allocated {} for {} elements at {:p}",
                    ByteSize::b(layout.size() as u64).to_string_as(true),
                    capacity,
                    ptr
                );
                Ok(Self { ptr, cap: capacity })
            }
            None => {
                error!(
                    "allocator refused request for {} ({} elements)",
                    ByteSize::b(layout.size() as u64).to_string_as(true),
                    capacity
                );
                Err(AllocError::OutOfMemory { layout })
            }
        }
    }

    fn layout(capacity: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(capacity).map_err(|_| {
            error!(
                "requested capacity of {} elements of {} B overflows isize::MAX bytes",
                capacity,
                mem::size_of::<T>()
            );
            AllocError::CapacityOverflow
        })
    }

    /// Moves the block out of `self`, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Exchanges the blocks owned by `self` and `other`.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns the number of values the block has room for.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Returns the base address of the block.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns the base address of the block.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the address `offset` slots past the base address.
    ///
    /// # Safety
    ///
    /// `offset` must be at most `capacity`. The address one past the end may be formed
    /// but never dereferenced.
    #[inline]
    pub unsafe fn ptr_at(&self, offset: usize) -> *const T {
        debug_assert!(offset <= self.cap, "offset {offset} > capacity {}", self.cap);
        self.ptr.as_ptr().add(offset)
    }

    /// Returns the address `offset` slots past the base address.
    ///
    /// # Safety
    ///
    /// `offset` must be at most `capacity`.
    #[inline]
    pub unsafe fn ptr_at_mut(&mut self, offset: usize) -> *mut T {
        debug_assert!(offset <= self.cap, "offset {offset} > capacity {}", self.cap);
        self.ptr.as_ptr().add(offset)
    }

    /// Returns the slot at `index`.
    ///
    /// # Safety
    ///
    /// `index` must be less than `capacity`.
    #[inline]
    pub unsafe fn slot(&self, index: usize) -> &MaybeUninit<T> {
        debug_assert!(index < self.cap, "index {index} >= capacity {}", self.cap);
        &*self.ptr.as_ptr().add(index).cast::<MaybeUninit<T>>()
    }

    /// Returns the slot at `index`.
    ///
    /// # Safety
    ///
    /// `index` must be less than `capacity`.
    #[inline]
    pub unsafe fn slot_mut(&mut self, index: usize) -> &mut MaybeUninit<T> {
        debug_assert!(index < self.cap, "index {index} >= capacity {}", self.cap);
        &mut *self.ptr.as_ptr().add(index).cast::<MaybeUninit<T>>()
    }
}

impl<T> Default for RawBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("ptr", &self.ptr)
            .field("cap", &self.cap)
            .finish()
    }
}

impl<T> Drop for RawBuffer<T> {
    // Releases the block only. Any live values must already have been dropped.
    fn drop(&mut self) {
        let size = mem::size_of::<T>() * self.cap;
        if size == 0 {
            return;
        }

        trace!(
            "releasing {} at {:p}",
            ByteSize::b(size as u64).to_string_as(true),
            self.ptr
        );
        // SAFETY: the same layout was validated and allocated in `try_with_capacity`
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, mem::align_of::<T>());
            alloc::dealloc(self.ptr.as_ptr().cast(), layout);
        }
    }
}
