//! Small-string-optimized byte view.

use std::cmp::Ordering;
use std::fmt;

use super::{memcompare, memequal, Slice};

/// Longest payload stored inside the view itself.
pub const INLINE_LEN: usize = 12;

/// Number of leading bytes copied into the view for long payloads.
pub const PREFIX_LEN: usize = 4;

#[derive(Clone, Copy)]
enum Repr<'a> {
    /// Zero-padded payload of at most `INLINE_LEN` bytes.
    Inline([u8; INLINE_LEN]),
    /// First `PREFIX_LEN` bytes plus the full payload held elsewhere.
    External {
        prefix: [u8; PREFIX_LEN],
        data: &'a [u8],
    },
}

/// A byte view that embeds payloads of up to 12 bytes.
///
/// Longer payloads keep a copy of their first four bytes next to a borrowed
/// reference to the full data. Equality on inline views is two word
/// comparisons; on external views the prefix is checked before any
/// out-of-line byte is read.
#[derive(Clone, Copy)]
pub struct SliceInline<'a> {
    len: u32,
    repr: Repr<'a>,
}

impl<'a> SliceInline<'a> {
    /// Create a view over `data`, inlining it when it is at most 12 bytes.
    ///
    /// # Panics
    ///
    /// Panics if `data` is longer than `u32::MAX` bytes.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        assert!(data.len() <= u32::MAX as usize, "slice too long for an inline view");
        let len = data.len() as u32;

        if data.len() <= INLINE_LEN {
            let mut bytes = [0u8; INLINE_LEN];
            bytes[..data.len()].copy_from_slice(data);
            SliceInline {
                len,
                repr: Repr::Inline(bytes),
            }
        } else {
            let mut prefix = [0u8; PREFIX_LEN];
            prefix.copy_from_slice(&data[..PREFIX_LEN]);
            SliceInline {
                len,
                repr: Repr::External { prefix, data },
            }
        }
    }

    /// Rebuild an inline view from its stored parts.
    #[inline]
    pub(crate) fn from_inline(len: u32, bytes: [u8; INLINE_LEN]) -> Self {
        debug_assert!(len as usize <= INLINE_LEN);
        SliceInline {
            len,
            repr: Repr::Inline(bytes),
        }
    }

    /// Rebuild an external view from a stored prefix and its payload.
    #[inline]
    pub(crate) fn from_external(prefix: [u8; PREFIX_LEN], data: &'a [u8]) -> Self {
        debug_assert!(data.len() > INLINE_LEN);
        debug_assert_eq!(&data[..PREFIX_LEN], &prefix[..]);
        SliceInline {
            len: data.len() as u32,
            repr: Repr::External { prefix, data },
        }
    }

    /// Number of bytes in the payload.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check whether the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check whether the payload is stored inside the view.
    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self.repr, Repr::Inline(_))
    }

    /// The first four payload bytes, zero-padded for shorter payloads.
    #[inline]
    pub fn prefix(&self) -> [u8; PREFIX_LEN] {
        match &self.repr {
            Repr::Inline(bytes) => [bytes[0], bytes[1], bytes[2], bytes[3]],
            Repr::External { prefix, .. } => *prefix,
        }
    }

    /// The payload bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.repr {
            Repr::Inline(bytes) => &bytes[..self.len as usize],
            Repr::External { data, .. } => data,
        }
    }

    /// Exact byte equality with a plain [`Slice`].
    #[inline]
    pub fn equals_slice(&self, other: &Slice<'_>) -> bool {
        memequal(self.as_bytes(), other.as_bytes())
    }

    /// Three-way comparison returning `-1`, `0` or `1`.
    #[inline]
    pub fn compare(&self, other: &SliceInline<'_>) -> i32 {
        self.ordering(other) as i32
    }

    fn ordering(&self, other: &SliceInline<'_>) -> Ordering {
        // Zero padding sorts below every real byte, so a prefix mismatch
        // already decides the order.
        let lhs = u32::from_be_bytes(self.prefix());
        let rhs = u32::from_be_bytes(other.prefix());
        if lhs != rhs {
            return lhs.cmp(&rhs);
        }
        memcompare(self.as_bytes(), other.as_bytes())
    }
}

impl<'a, 'b> PartialEq<SliceInline<'b>> for SliceInline<'a> {
    #[inline]
    fn eq(&self, other: &SliceInline<'b>) -> bool {
        if self.len != other.len {
            return false;
        }
        match (&self.repr, &other.repr) {
            (Repr::Inline(a), Repr::Inline(b)) => {
                let (a_head, a_tail) = split_words(a);
                let (b_head, b_tail) = split_words(b);
                (a_head == b_head) & (a_tail == b_tail)
            }
            (
                Repr::External { prefix: pa, data: a },
                Repr::External { prefix: pb, data: b },
            ) => {
                u32::from_ne_bytes(*pa) == u32::from_ne_bytes(*pb) && memequal(a, b)
            }
            // Equal lengths always pick the same representation.
            _ => false,
        }
    }
}

impl Eq for SliceInline<'_> {}

impl<'a, 'b> PartialOrd<SliceInline<'b>> for SliceInline<'a> {
    #[inline]
    fn partial_cmp(&self, other: &SliceInline<'b>) -> Option<Ordering> {
        Some(self.ordering(other))
    }
}

impl Ord for SliceInline<'_> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering(other)
    }
}

impl<'a, 'b> PartialEq<Slice<'b>> for SliceInline<'a> {
    #[inline]
    fn eq(&self, other: &Slice<'b>) -> bool {
        self.equals_slice(other)
    }
}

impl<'a> From<Slice<'a>> for SliceInline<'a> {
    #[inline]
    fn from(slice: Slice<'a>) -> Self {
        SliceInline::new(slice.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for SliceInline<'a> {
    #[inline]
    fn from(data: &'a [u8]) -> Self {
        SliceInline::new(data)
    }
}

impl<'a> From<&'a str> for SliceInline<'a> {
    #[inline]
    fn from(data: &'a str) -> Self {
        SliceInline::new(data.as_bytes())
    }
}

impl fmt::Debug for SliceInline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_inline() { "inline" } else { "external" };
        write!(f, "SliceInline({}, \"{}\")", kind, self.as_bytes().escape_ascii())
    }
}

#[inline(always)]
fn split_words(bytes: &[u8; INLINE_LEN]) -> (u32, u64) {
    let head = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let tail = u64::from_ne_bytes([
        bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9], bytes[10], bytes[11],
    ]);
    (head, tail)
}
