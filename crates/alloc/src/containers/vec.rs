use core::{
    fmt,
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
    ptr, slice,
};

use log::debug;

use super::{into_iter::IntoIter, uninit};
use crate::raw::{AllocError, RawBuffer};

/// A contiguous growable array type, written as `Vector<T>`.
///
/// A `Vector` owns one [`RawBuffer`] and counts how many of its leading slots hold live
/// values. Slots `[0, len)` are initialized, slots `[len, capacity)` are not. The buffer
/// only ever provides memory; constructing, moving, and dropping values is done here.
///
/// When a push or insert finds the buffer full, capacity grows to
/// `max(1, 2 * capacity)`.
///
/// # Panics and unwinding
///
/// Operations that run user code (`Default`, `Clone`, or a constructor closure) document
/// what state the vector is left in if that code panics. Either the vector is unchanged
/// ("strong"), or it is valid and `len` counts exactly the live values, but some values
/// may already have been overwritten ("basic"). No value or allocation is ever leaked.
pub struct Vector<T> {
    buf: RawBuffer<T>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> Vector<T> {
    /// Constructs a new, empty `Vector` without allocating.
    pub const fn new() -> Self {
        Self {
            buf: RawBuffer::new(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Constructs a new, empty `Vector` with room for exactly `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).unwrap_or_else(|err| err.handle())
    }

    /// Constructs a new, empty `Vector` with room for exactly `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the allocation fails.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            buf: RawBuffer::try_with_capacity(capacity)?,
            len: 0,
            _marker: PhantomData,
        })
    }

    /// Constructs a `Vector` of `len` values, calling `f` with each index in order.
    ///
    /// Capacity is exactly `len`. If `f` panics, the values built so far are dropped and
    /// the buffer is released.
    pub fn from_fn<F>(len: usize, f: F) -> Self
    where
        F: FnMut(usize) -> T,
    {
        let mut buf = RawBuffer::with_capacity(len);
        // SAFETY: the buffer has room for `len` values and none are live
        unsafe { uninit::init_with(buf.as_mut_ptr(), len, f) };
        Self {
            buf,
            len,
            _marker: PhantomData,
        }
    }

    /// Constructs a `Vector` of `len` default values. Capacity is exactly `len`.
    ///
    /// If a `default()` call panics, nothing is leaked.
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        Self::from_fn(len, |_| T::default())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are live
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first `len` slots are live
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), self.len) }
    }

    /// Exchanges the contents of two vectors without moving any values.
    #[inline]
    pub fn swap_with(&mut self, other: &mut Self) {
        self.buf.swap(&mut other.buf);
        core::mem::swap(&mut self.len, &mut other.len);
    }

    /// Grows the capacity to exactly `new_capacity`, moving the values into a new buffer.
    ///
    /// Does nothing if `new_capacity <= capacity()`; existing values stay where they are.
    pub fn reserve(&mut self, new_capacity: usize) {
        self.try_reserve(new_capacity)
            .unwrap_or_else(|err| err.handle());
    }

    /// Grows the capacity to exactly `new_capacity`, moving the values into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the allocation fails, in which case the vector is unchanged.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }

        let mut new_buf: RawBuffer<T> = RawBuffer::try_with_capacity(new_capacity)?;
        // SAFETY: the new buffer is larger than `len` and distinct from the old one
        unsafe { uninit::relocate(self.buf.as_ptr(), new_buf.as_mut_ptr(), self.len) };
        debug!(
            "reallocated {} elements: capacity {} -> {}",
            self.len,
            self.capacity(),
            new_capacity
        );
        // the old block now holds no live values
        self.buf.swap(&mut new_buf);
        Ok(())
    }

    /// Capacity after the next growth step.
    fn grown_capacity(&self) -> usize {
        match self.capacity() {
            0 => 1,
            cap => cap
                .checked_mul(2)
                .unwrap_or_else(|| AllocError::CapacityOverflow.handle()),
        }
    }

    /// Makes room for `additional` more values, growing geometrically.
    fn reserve_for_push(&mut self, additional: usize) {
        let required = self
            .len
            .checked_add(additional)
            .unwrap_or_else(|| AllocError::CapacityOverflow.handle());
        if required > self.capacity() {
            self.reserve(required.max(self.grown_capacity()));
        }
    }

    /// Resizes the vector to `new_len`, filling new slots with values returned by `f`.
    ///
    /// Shrinking drops the trailing values. Growing reserves exactly `new_len` first.
    /// If `f` panics, the values built by this call are dropped and `len` is unchanged;
    /// the reserved capacity is kept.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }

        self.reserve(new_len);
        let additional = new_len - self.len;
        // SAFETY: capacity is at least `new_len` and slots past `len` are not live
        unsafe { uninit::init_with(self.buf.ptr_at_mut(self.len), additional, |_| f()) };
        self.len = new_len;
    }

    /// Resizes the vector to `new_len`, filling new slots with default values.
    pub fn resize(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    /// Drops the values past `new_len`. Does nothing if `new_len >= len()`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }

        // SAFETY: `new_len < len <= capacity`
        let tail = unsafe {
            ptr::slice_from_raw_parts_mut(self.buf.ptr_at_mut(new_len), self.len - new_len)
        };
        // shrink first so a panicking drop cannot cause a double drop
        self.len = new_len;
        unsafe { ptr::drop_in_place(tail) };
    }

    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Appends `value`.
    pub fn push(&mut self, value: T) {
        self.emplace(self.len, || value);
    }

    /// Appends the value returned by `f` and returns a reference to it.
    ///
    /// If `f` panics, the vector is unchanged.
    pub fn emplace_back<F>(&mut self, f: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.emplace(self.len, f)
    }

    /// Removes the last value and returns it, or `None` if the vector is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        // SAFETY: the slot was live and is no longer counted
        Some(unsafe { ptr::read(self.buf.ptr_at(self.len)) })
    }

    /// Inserts `value` at `index`, shifting everything after it to the right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        self.emplace(index, || value)
    }

    /// Inserts the value returned by `f` at `index`, shifting everything after it to the
    /// right, and returns a reference to it.
    ///
    /// `f` runs before any value is moved. If the buffer is full, the new value is built
    /// directly in a fresh buffer of twice the capacity (at least 1) and the old values
    /// are moved around it. Either way, if `f` panics the vector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn emplace<F>(&mut self, index: usize, f: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );

        if len < self.capacity() {
            let value = f();
            // SAFETY: `len < capacity`, so shifting the tail by one stays in bounds
            unsafe {
                let slot = self.buf.ptr_at_mut(index);
                if index < len {
                    ptr::copy(slot, slot.add(1), len - index);
                }
                slot.write(value);
            }
        } else {
            let new_capacity = self.grown_capacity();
            let mut new_buf: RawBuffer<T> = RawBuffer::with_capacity(new_capacity);
            // SAFETY: the new buffer has room for `len + 1` values
            unsafe {
                new_buf.ptr_at_mut(index).write(f());
                let src = self.buf.as_ptr();
                let dst = new_buf.as_mut_ptr();
                uninit::relocate(src, dst, index);
                uninit::relocate(src.add(index), dst.add(index + 1), len - index);
            }
            debug!(
                "reallocated {} elements: capacity {} -> {}",
                len,
                self.capacity(),
                new_capacity
            );
            self.buf.swap(&mut new_buf);
        }

        self.len = len + 1;
        // SAFETY: `index < len`
        unsafe { &mut *self.buf.ptr_at_mut(index) }
    }

    /// Removes and returns the value at `index`, shifting everything after it to the left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(
            index < len,
            "removal index (is {index}) should be < len (is {len})"
        );

        // SAFETY: `index < len`
        unsafe {
            let slot = self.buf.ptr_at_mut(index);
            let value = ptr::read(slot);
            ptr::copy(slot.add(1), slot, len - index - 1);
            self.len = len - 1;
            value
        }
    }

    /// Drops the value at `index`, shifting everything after it to the left, and returns
    /// the index of the value that followed it.
    ///
    /// The vector is consistent before the value is dropped, so a panicking `Drop` leaves
    /// it with `len() - 1` values.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn erase(&mut self, index: usize) -> usize {
        drop(self.remove(index));
        index
    }

    /// Removes and returns the value at `index`, replacing it with the last value.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(
            index < len,
            "swap_remove index (is {index}) should be < len (is {len})"
        );

        // SAFETY: both `index` and `len - 1` are live slots
        unsafe {
            let value = ptr::read(self.buf.ptr_at(index));
            let last = self.buf.ptr_at(len - 1);
            ptr::copy(last, self.buf.ptr_at_mut(index), 1);
            self.len = len - 1;
            value
        }
    }

    /// Clones and appends every value in `other`.
    ///
    /// If a clone panics, the values appended so far are kept.
    pub fn extend_from_slice(&mut self, other: &[T])
    where
        T: Clone,
    {
        self.reserve_for_push(other.len());
        for value in other {
            // SAFETY: capacity was reserved above
            unsafe { self.buf.ptr_at_mut(self.len).write(value.clone()) };
            self.len += 1;
        }
    }

    /// Consumes the vector, returning its buffer and the number of live leading slots.
    pub(crate) fn into_buffer(self) -> (RawBuffer<T>, usize) {
        let mut this = ManuallyDrop::new(self);
        (this.buf.take(), this.len)
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Vector<T> {
    fn drop(&mut self) {
        // the buffer releases its block afterwards
        unsafe { ptr::drop_in_place(self.as_mut_slice()) }
    }
}

impl<T: Clone> Clone for Vector<T> {
    /// Clones every value into a new buffer whose capacity is exactly `len()`.
    fn clone(&self) -> Self {
        let src = self.as_slice();
        Self::from_fn(src.len(), |i| src[i].clone())
    }

    /// Overwrites `self` with a copy of `source`.
    ///
    /// If `source` does not fit in the current capacity, a full copy is built first and
    /// swapped in, so a panicking clone leaves `self` unchanged.
    ///
    /// Otherwise the storage is reused: shared positions are overwritten with
    /// `clone_from`, excess values are dropped, and missing values are cloned onto the end.
    /// A panic here leaves the positions processed so far updated and the rest untouched,
    /// with `len` counting exactly the live values.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut copy = source.clone();
            self.swap_with(&mut copy);
            return;
        }

        let shared = self.len.min(source.len);
        self.as_mut_slice()[..shared].clone_from_slice(&source[..shared]);
        if source.len < self.len {
            self.truncate(source.len);
        } else {
            for value in &source[shared..] {
                // SAFETY: `source.len <= capacity`
                unsafe { self.buf.ptr_at_mut(self.len).write(value.clone()) };
                self.len += 1;
            }
        }
    }
}

impl<T> Deref for Vector<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Vector<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T, U> PartialEq<Vector<U>> for Vector<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vector<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for Vector<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Vector<T> {}

impl<T> Extend<T> for Vector<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve_for_push(iter.size_hint().0);
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::new();
        vec.extend(iter);
        vec
    }
}

impl<T, const N: usize> From<[T; N]> for Vector<T> {
    fn from(values: [T; N]) -> Self {
        let mut vec = Self::with_capacity(N);
        vec.extend(values);
        vec
    }
}

impl<T: Clone> From<&[T]> for Vector<T> {
    fn from(values: &[T]) -> Self {
        Self::from_fn(values.len(), |i| values[i].clone())
    }
}

impl<T> IntoIterator for Vector<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a Vector<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Vector<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.iter_mut()
    }
}
