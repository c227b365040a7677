//! Variable-length byte string columns.
//!
//! Both layouts copy their payloads into one contiguous arena owned by the
//! column, so the bytes stay valid for as long as the column does no matter
//! what happens to the input.
//!
//! - [`FlatBinaryColumn`] keeps every payload in the arena and locates row
//!   `i` through an `n + 1` entry offset array.
//! - [`InlineBinaryColumn`] keeps payloads of up to 12 bytes inside a 16-byte
//!   row entry and only spills longer ones to the arena. Entries store arena
//!   offsets, never addresses, so growing the arena cannot leave them dangling.

mod flat;
mod inline;

pub use flat::FlatBinaryColumn;
pub use inline::InlineBinaryColumn;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::utils::alignment::{align_up, cache_line_size};

/// Options for building string columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOptions {
    /// Arena reservations are rounded up to a multiple of this many bytes.
    arena_alignment: usize,

    /// Extra row slots reserved on every build, for later pushes.
    spare_rows: usize,

    /// Extra arena bytes reserved on every build, for later pushes.
    spare_bytes: usize,
}

impl Default for BinaryOptions {
    fn default() -> Self {
        BinaryOptions {
            arena_alignment: cache_line_size(),
            spare_rows: 0,
            spare_bytes: 0,
        }
    }
}

impl BinaryOptions {
    /// Create options with the defaults: cache-line rounding, no spare room.
    pub fn new() -> BinaryOptions {
        BinaryOptions::default()
    }

    /// Set the granularity arena reservations are rounded to.
    ///
    /// Must be a power of two; checked when the options are used.
    pub fn arena_alignment(mut self, alignment: usize) -> BinaryOptions {
        self.arena_alignment = alignment;
        self
    }

    /// Reserve room for `rows` more rows after each build.
    pub fn spare_rows(mut self, rows: usize) -> BinaryOptions {
        self.spare_rows = rows;
        self
    }

    /// Reserve `bytes` more arena bytes after each build.
    pub fn spare_bytes(mut self, bytes: usize) -> BinaryOptions {
        self.spare_bytes = bytes;
        self
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.arena_alignment.is_power_of_two() {
            return Err(Error::InvalidArgument(format!(
                "arena alignment must be a power of two, got {}",
                self.arena_alignment
            )));
        }
        Ok(())
    }

    pub(crate) fn row_capacity(&self, rows: usize) -> Result<usize> {
        rows.checked_add(self.spare_rows).ok_or(Error::CapacityOverflow)
    }
}

/// Contiguous byte storage shared by the rows of a string column.
#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    bytes: Column<u8>,
}

impl Arena {
    /// Allocate an empty arena able to hold `payload` bytes plus the spare
    /// room requested by `options`, rounded to the arena alignment.
    pub(crate) fn try_reserved(payload: usize, options: &BinaryOptions) -> Result<Arena> {
        let wanted = payload
            .checked_add(options.spare_bytes)
            .ok_or(Error::CapacityOverflow)?;
        let capacity = align_up(wanted, options.arena_alignment).ok_or(Error::CapacityOverflow)?;
        Ok(Arena {
            bytes: Column::try_with_capacity(capacity)?,
        })
    }

    /// Append `data`, returning the offset it starts at.
    #[inline]
    pub(crate) fn try_append(&mut self, data: &[u8]) -> Result<usize> {
        let start = self.bytes.len();
        self.bytes.try_extend_from_slice(data)?;
        Ok(start)
    }

    #[inline]
    pub(crate) fn get(&self, start: usize, len: usize) -> &[u8] {
        &self.bytes.as_slice()[start..start + len]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, start: usize, len: usize) -> &mut [u8] {
        &mut self.bytes.as_mut_slice()[start..start + len]
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    #[inline]
    pub(crate) fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservations_round_to_alignment() {
        let options = BinaryOptions::new().arena_alignment(16).spare_bytes(3);
        let arena = Arena::try_reserved(27, &options).unwrap();
        assert_eq!(arena.capacity(), 32);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn append_returns_offsets() {
        let mut arena = Arena::try_reserved(8, &BinaryOptions::new()).unwrap();
        assert_eq!(arena.try_append(b"AIR").unwrap(), 0);
        assert_eq!(arena.try_append(b"SHIP").unwrap(), 3);
        assert_eq!(arena.get(3, 4), b"SHIP");
        assert_eq!(arena.as_bytes(), b"AIRSHIP");
    }

    #[test]
    fn alignment_must_be_a_power_of_two() {
        assert!(BinaryOptions::new().validate().is_ok());
        assert!(matches!(
            BinaryOptions::new().arena_alignment(24).validate(),
            Err(Error::InvalidArgument(_))
        ));
    }
}
