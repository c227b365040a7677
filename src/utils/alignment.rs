//! Memory alignment utilities.
//!
//! Used to round arena reservations to cache-line multiples and to verify
//! that allocator results satisfy element alignment.

/// Round up to the next multiple of `align`.
///
/// # Arguments
///
/// * `value` - The value to round up.
/// * `align` - The alignment, which must be a power of two.
///
/// # Returns
///
/// The smallest multiple of `align` that is greater than or equal to `value`,
/// or `None` if that multiple overflows `usize`.
#[inline]
pub fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

/// Check if a value is aligned to a given alignment.
///
/// # Arguments
///
/// * `value` - The value to check.
/// * `align` - The alignment, which must be a power of two.
///
/// # Returns
///
/// `true` if `value` is a multiple of `align`, `false` otherwise.
#[inline]
pub fn is_aligned(value: usize, align: usize) -> bool {
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    (value & (align - 1)) == 0
}

/// Get the cache line size.
#[inline]
pub fn cache_line_size() -> usize {
    #[cfg(target_arch = "aarch64")]
    {
        // Apple silicon and most Neoverse parts prefetch in 128-byte pairs.
        128
    }

    #[cfg(not(target_arch = "aarch64"))]
    {
        64
    }
}
