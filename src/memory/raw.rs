//! Single-owner handle over a libc allocation.

use std::marker::PhantomData;
use std::mem;
use std::ptr;
use std::time::Duration;

use libc::{c_void, calloc, free, realloc};

use crate::error::{Error, Result};
use crate::memory::Pod;
use crate::utils::alignment;
use crate::utils::metrics::{record_operation, Operation};

/// Alignment the C allocator guarantees for every returned block.
const MALLOC_ALIGN: usize = 2 * mem::size_of::<usize>();

/// An owned, uninitialized-past-`len` allocation of `capacity` elements.
///
/// The handle only tracks the allocation; the logical length lives in the
/// owner. A zero capacity is represented by a null pointer and owns nothing.
pub struct RawBuffer<T: Pod> {
    ptr: *mut T,
    capacity: usize,
    _marker: PhantomData<T>,
}

// Exclusive ownership of the allocation, same reasoning as `Box<[T]>`.
unsafe impl<T: Pod + Send> Send for RawBuffer<T> {}
unsafe impl<T: Pod + Sync> Sync for RawBuffer<T> {}

impl<T: Pod> RawBuffer<T> {
    /// Create a buffer that owns nothing.
    #[inline]
    pub const fn new() -> Self {
        RawBuffer {
            ptr: ptr::null_mut(),
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Allocate `capacity` zeroed elements.
    pub fn try_zeroed(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Ok(Self::new());
        }

        let bytes = byte_size::<T>(capacity)?;
        let ptr = unsafe { calloc(capacity, mem::size_of::<T>()) } as *mut T;
        if ptr.is_null() {
            return Err(refused(bytes));
        }
        debug_assert!(alignment::is_aligned(ptr as usize, mem::align_of::<T>()));

        record_operation(Operation::Allocate, bytes, Duration::ZERO);
        Ok(RawBuffer {
            ptr,
            capacity,
            _marker: PhantomData,
        })
    }

    /// Adopt an allocation made by the C allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must be null with `capacity == 0`, or point to a block returned
    /// by `malloc`/`calloc`/`realloc` that holds at least `capacity` elements
    /// and is not owned by anything else. The block is released with `free`.
    #[inline]
    pub unsafe fn from_raw_parts(ptr: *mut T, capacity: usize) -> Self {
        debug_assert!(!ptr.is_null() || capacity == 0);
        RawBuffer {
            ptr,
            capacity: if ptr.is_null() { 0 } else { capacity },
            _marker: PhantomData,
        }
    }

    /// Give the allocation up without freeing it.
    #[inline]
    pub fn into_raw_parts(self) -> (*mut T, usize) {
        let parts = (self.ptr, self.capacity);
        mem::forget(self);
        parts
    }

    /// Number of elements the allocation can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check whether the buffer owns an allocation.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.ptr.is_null()
    }

    /// Pointer to the first element, null when nothing is allocated.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Mutable pointer to the first element, null when nothing is allocated.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Resize the allocation to exactly `new_capacity` elements.
    ///
    /// The first `min(old, new)` elements are preserved; the rest is
    /// unspecified memory. On failure the existing allocation is untouched.
    pub fn try_resize(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity == self.capacity {
            return Ok(());
        }
        if new_capacity == 0 {
            self.release();
            return Ok(());
        }

        let bytes = byte_size::<T>(new_capacity)?;
        let grown = unsafe { realloc(self.ptr as *mut c_void, bytes) } as *mut T;
        if grown.is_null() {
            return Err(refused(bytes));
        }
        debug_assert!(alignment::is_aligned(grown as usize, mem::align_of::<T>()));

        let op = if self.ptr.is_null() {
            Operation::Allocate
        } else {
            Operation::Reallocate
        };
        record_operation(op, bytes, Duration::ZERO);

        self.ptr = grown;
        self.capacity = new_capacity;
        Ok(())
    }

    fn release(&mut self) {
        if !self.ptr.is_null() {
            unsafe { free(self.ptr as *mut c_void) };
            record_operation(
                Operation::Free,
                self.capacity * mem::size_of::<T>(),
                Duration::ZERO,
            );
        }
        self.ptr = ptr::null_mut();
        self.capacity = 0;
    }
}

impl<T: Pod> Default for RawBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Pod> std::fmt::Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBuffer")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn byte_size<T>(capacity: usize) -> Result<usize> {
    assert!(mem::size_of::<T>() != 0, "zero-sized column elements");
    assert!(mem::align_of::<T>() <= MALLOC_ALIGN, "over-aligned column elements");

    match capacity.checked_mul(mem::size_of::<T>()) {
        Some(bytes) if bytes <= isize::MAX as usize => Ok(bytes),
        _ => Err(Error::CapacityOverflow),
    }
}

#[cold]
fn refused(bytes: usize) -> Error {
    record_operation(Operation::AllocationFailure, bytes, Duration::ZERO);
    tracing::warn!(bytes, "column allocation refused");
    Error::AllocationFailed { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_allocation_is_zero() {
        let buf = RawBuffer::<u64>::try_zeroed(16).unwrap();
        assert_eq!(buf.capacity(), 16);
        let values = unsafe { std::slice::from_raw_parts(buf.as_ptr(), 16) };
        assert!(values.iter().all(|&v| v == 0));
    }

    #[test]
    fn empty_buffer_owns_nothing() {
        let buf = RawBuffer::<i32>::try_zeroed(0).unwrap();
        assert!(!buf.is_allocated());
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn resize_preserves_prefix() {
        let mut buf = RawBuffer::<i32>::try_zeroed(4).unwrap();
        unsafe {
            for i in 0..4 {
                *buf.as_mut_ptr().add(i) = i as i32 + 1;
            }
        }
        buf.try_resize(64).unwrap();
        assert_eq!(buf.capacity(), 64);
        let values = unsafe { std::slice::from_raw_parts(buf.as_ptr(), 4) };
        assert_eq!(values, &[1, 2, 3, 4]);

        buf.try_resize(0).unwrap();
        assert!(!buf.is_allocated());
    }

    #[test]
    fn oversized_request_is_an_overflow() {
        let err = RawBuffer::<u64>::try_zeroed(usize::MAX / 2).unwrap_err();
        assert_eq!(err, Error::CapacityOverflow);
    }

    #[test]
    fn raw_parts_round_trip() {
        let buf = RawBuffer::<u8>::try_zeroed(8).unwrap();
        let (ptr, cap) = buf.into_raw_parts();
        let adopted = unsafe { RawBuffer::from_raw_parts(ptr, cap) };
        assert_eq!(adopted.capacity(), 8);
    }
}
