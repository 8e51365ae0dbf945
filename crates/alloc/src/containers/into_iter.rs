use core::{fmt, iter::FusedIterator, ptr, slice};

use super::vec::Vector;
use crate::raw::RawBuffer;

/// An iterator that moves values out of a [`Vector`].
///
/// Takes over the vector's buffer. Values that are not consumed are dropped along with
/// the iterator, then the buffer is released.
pub struct IntoIter<T> {
    buf: RawBuffer<T>,
    // live slots are [start, end)
    start: usize,
    end: usize,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(vec: Vector<T>) -> Self {
        let (buf, len) = vec.into_buffer();
        Self {
            buf,
            start: 0,
            end: len,
        }
    }

    /// Returns the values that have not been yielded yet.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [start, end) are live
        unsafe { slice::from_raw_parts(self.buf.ptr_at(self.start), self.end - self.start) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.end - self.start;
        // SAFETY: [start, end) are live
        unsafe { slice::from_raw_parts_mut(self.buf.ptr_at_mut(self.start), len) }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }

        // SAFETY: the slot is live and drops out of [start, end)
        let value = unsafe { ptr::read(self.buf.ptr_at(self.start)) };
        self.start += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }

        self.end -= 1;
        // SAFETY: the slot was live and is now outside [start, end)
        Some(unsafe { ptr::read(self.buf.ptr_at(self.end)) })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(self.as_mut_slice()) }
    }
}
