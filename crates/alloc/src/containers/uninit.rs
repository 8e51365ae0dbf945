//! Helpers for constructing and relocating values in uninitialized slots.

use core::{mem, ptr};

/// Drops the first `len` values of a run of slots when it goes out of scope.
///
/// Construction loops bump `len` after each value is written, so if a constructor
/// panics the values built so far are dropped during unwinding and nothing leaks.
pub(crate) struct InitGuard<T> {
    start: *mut T,
    len: usize,
}

impl<T> InitGuard<T> {
    pub(crate) fn new(start: *mut T) -> Self {
        Self { start, len: 0 }
    }

    /// Hands the constructed values over to the caller.
    pub(crate) fn finish(self) -> usize {
        let len = self.len;
        mem::forget(self);
        len
    }
}

impl<T> Drop for InitGuard<T> {
    fn drop(&mut self) {
        // SAFETY: the first `len` slots were written and not handed over
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.len));
        }
    }
}

/// Writes `count` values produced by `f` into the slots starting at `start`.
///
/// If `f` panics, every value written so far is dropped and the panic resumes.
///
/// # Safety
///
/// `start` must be valid for `count` writes and the slots must not hold live values.
pub(crate) unsafe fn init_with<T, F>(start: *mut T, count: usize, mut f: F)
where
    F: FnMut(usize) -> T,
{
    let mut guard = InitGuard::new(start);
    while guard.len < count {
        start.add(guard.len).write(f(guard.len));
        guard.len += 1;
    }
    guard.finish();
}

/// Moves `count` values from `src` into the uninitialized slots at `dst`.
///
/// Moves are bitwise and cannot fail, so the transfer is all-or-nothing. Afterwards the
/// source slots are logically uninitialized and must not be dropped.
///
/// # Safety
///
/// Both ranges must be valid for `count` values and must not overlap.
#[inline]
pub(crate) unsafe fn relocate<T>(src: *const T, dst: *mut T, count: usize) {
    ptr::copy_nonoverlapping(src, dst, count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::MaybeUninit;
    use std::{
        panic::{self, AssertUnwindSafe},
        rc::Rc,
    };

    #[test]
    fn init_with_fills_every_slot() {
        let mut slots = [const { MaybeUninit::<String>::uninit() }; 3];
        let start = slots.as_mut_ptr().cast::<String>();
        unsafe {
            init_with(start, 3, |i| i.to_string());
            assert_eq!(*start.add(2), "2");
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, 3));
        }
    }

    #[test]
    fn init_with_drops_partial_run_on_panic() {
        let marker = Rc::new(());
        let mut slots = [const { MaybeUninit::<Rc<()>>::uninit() }; 4];
        let start = slots.as_mut_ptr().cast::<Rc<()>>();

        let result = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            init_with(start, 4, |i| {
                if i == 2 {
                    panic!("boom");
                }
                Rc::clone(&marker)
            });
        }));

        assert!(result.is_err());
        assert_eq!(Rc::strong_count(&marker), 1);
    }
}
