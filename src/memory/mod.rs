//! Raw memory management for column storage.
//!
//! Column buffers come straight from the C allocator (`calloc`, `realloc`,
//! `free`). A refused request yields a null pointer rather than unwinding, and
//! is turned into [`Error::AllocationFailed`](crate::Error::AllocationFailed)
//! without touching the buffer that was already in place.

mod raw;

pub use raw::RawBuffer;

use std::alloc::{handle_alloc_error, Layout};

use crate::error::Error;

/// Element types that can live in a raw column buffer.
///
/// # Safety
///
/// Implementors must be `Copy` without drop glue, and the all-zero bit pattern
/// must be a valid value of the type. Column buffers are zero-initialized by
/// the allocator and grown with `realloc`, which moves elements bytewise.
pub unsafe trait Pod: Copy + 'static {}

macro_rules! impl_pod {
    ($($t:ty),* $(,)?) => {
        $(unsafe impl Pod for $t {})*
    };
}

impl_pod!(bool, u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, usize, isize);

/// Report an allocation error on a path that has no way to return it.
///
/// Mirrors what `Vec` does when growth fails: the global allocation error
/// handler runs for a refused request, and an impossible size panics.
#[cold]
pub(crate) fn allocation_failure<T>(err: Error) -> ! {
    match err {
        Error::AllocationFailed { bytes } => {
            let layout = Layout::from_size_align(bytes, std::mem::align_of::<T>())
                .unwrap_or_else(|_| Layout::new::<T>());
            handle_alloc_error(layout)
        }
        other => panic!("{}", other),
    }
}
