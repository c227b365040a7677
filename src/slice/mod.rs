//! Non-owning byte views and their comparison primitives.
//!
//! [`Slice`] is a plain `{pointer, length}` view. [`SliceInline`] keeps short
//! payloads inline and a 4-byte prefix for long ones, so most mismatches are
//! rejected without touching out-of-line memory.

pub mod compare;
mod inline;

pub use compare::{memcompare, memequal};
pub use inline::{SliceInline, INLINE_LEN, PREFIX_LEN};

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A borrowed view of a contiguous byte range.
///
/// Ordering is lexicographic over raw bytes with length as the tiebreaker;
/// equality is byte-exact.
#[derive(Clone, Copy, Default)]
pub struct Slice<'a> {
    data: &'a [u8],
}

impl<'a> Slice<'a> {
    /// Create a view over `data`.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Slice { data }
    }

    /// Create a view from a raw pointer and length.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` bytes for the whole lifetime
    /// `'a`, and the bytes must not be mutated during that time. A null `ptr`
    /// is only allowed with `len == 0`.
    #[inline]
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        if len == 0 {
            return Slice { data: &[] };
        }
        Slice {
            data: std::slice::from_raw_parts(ptr, len),
        }
    }

    /// Number of bytes in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The viewed bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Pointer to the first viewed byte.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Exact byte equality.
    #[inline]
    pub fn equals(&self, other: &Slice<'_>) -> bool {
        memequal(self.data, other.data)
    }

    /// Three-way comparison returning `-1`, `0` or `1`.
    #[inline]
    pub fn compare(&self, other: &Slice<'_>) -> i32 {
        memcompare(self.data, other.data) as i32
    }
}

impl<'a, 'b> PartialEq<Slice<'b>> for Slice<'a> {
    #[inline]
    fn eq(&self, other: &Slice<'b>) -> bool {
        self.equals(other)
    }
}

impl Eq for Slice<'_> {}

impl<'a, 'b> PartialOrd<Slice<'b>> for Slice<'a> {
    #[inline]
    fn partial_cmp(&self, other: &Slice<'b>) -> Option<Ordering> {
        Some(memcompare(self.data, other.data))
    }
}

impl Ord for Slice<'_> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        memcompare(self.data, other.data)
    }
}

impl Hash for Slice<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl PartialEq<[u8]> for Slice<'_> {
    #[inline]
    fn eq(&self, other: &[u8]) -> bool {
        memequal(self.data, other)
    }
}

impl PartialEq<&[u8]> for Slice<'_> {
    #[inline]
    fn eq(&self, other: &&[u8]) -> bool {
        memequal(self.data, other)
    }
}

impl PartialEq<&str> for Slice<'_> {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        memequal(self.data, other.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Slice<'a> {
    #[inline]
    fn from(data: &'a [u8]) -> Self {
        Slice::new(data)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Slice<'a> {
    #[inline]
    fn from(data: &'a [u8; N]) -> Self {
        Slice::new(data)
    }
}

impl<'a> From<&'a str> for Slice<'a> {
    #[inline]
    fn from(data: &'a str) -> Self {
        Slice::new(data.as_bytes())
    }
}

impl AsRef<[u8]> for Slice<'_> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slice(\"{}\")", self.data.escape_ascii())
    }
}
