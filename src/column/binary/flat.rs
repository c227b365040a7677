//! Offset-indexed string column.

use std::fmt;

use super::{Arena, BinaryOptions};
use crate::column::typed::length_mismatch;
use crate::column::{Column, Columnar, Operator};
use crate::error::{Error, Result};
use crate::memory::allocation_failure;
use crate::slice::{memcompare, memequal, Slice};
use crate::utils::metrics::{measure, Operation};

/// String column storing every payload in a shared arena.
///
/// Row `i` spans `arena[offsets[i]..offsets[i + 1]]`. Offsets are 32-bit, so
/// the arena is limited to `u32::MAX` bytes.
#[derive(Clone)]
pub struct FlatBinaryColumn {
    offsets: Column<u32>,
    arena: Arena,
    options: BinaryOptions,
}

impl FlatBinaryColumn {
    /// Create an empty column with default options.
    pub fn new() -> Self {
        FlatBinaryColumn {
            offsets: Column::from([0u32]),
            arena: Arena::default(),
            options: BinaryOptions::default(),
        }
    }

    /// Create an empty column with custom options.
    pub fn with_options(options: BinaryOptions) -> Result<Self> {
        options.validate()?;
        Ok(FlatBinaryColumn {
            offsets: Column::try_with_len(1)?,
            arena: Arena::default(),
            options,
        })
    }

    /// Build a column from `values` with default options.
    pub fn from_strings<S: AsRef<[u8]>>(values: &[S]) -> Result<Self> {
        let mut column = FlatBinaryColumn::new();
        column.build_strings(values)?;
        Ok(column)
    }

    /// Replace the contents with copies of `values`.
    ///
    /// The arena is sized once from the summed lengths. On error the previous
    /// contents are left untouched.
    pub fn build_strings<S: AsRef<[u8]>>(&mut self, values: &[S]) -> Result<()> {
        let total = values
            .iter()
            .try_fold(0usize, |acc, v| acc.checked_add(v.as_ref().len()))
            .filter(|&total| total <= u32::MAX as usize)
            .ok_or(Error::CapacityOverflow)?;

        measure(Operation::Build, values.len(), || {
            let rows = self.options.row_capacity(values.len())?;
            let mut offsets = Column::try_with_capacity(rows.saturating_add(1))?;
            let mut arena = Arena::try_reserved(total, &self.options)?;

            offsets.try_push(0)?;
            for value in values {
                arena.try_append(value.as_ref())?;
                offsets.try_push(arena.len() as u32)?;
            }

            tracing::trace!(rows = values.len(), bytes = total, "built flat binary column");
            self.offsets = offsets;
            self.arena = arena;
            Ok(())
        })
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Check whether the column has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View of row `index`, borrowing the column's arena.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[track_caller]
    pub fn get_slice(&self, index: usize) -> Slice<'_> {
        let (start, end) = self.bounds(index);
        Slice::new(&self.arena.as_bytes()[start..end])
    }

    #[inline]
    #[track_caller]
    fn bounds(&self, index: usize) -> (usize, usize) {
        let len = self.len();
        assert!(index < len, "index {} out of bounds for column of length {}", index, len);
        let offsets = self.offsets.as_slice();
        (offsets[index] as usize, offsets[index + 1] as usize)
    }

    /// Append a copy of `value`.
    pub fn push<V: AsRef<[u8]>>(&mut self, value: V) {
        if let Err(err) = self.try_push(value) {
            allocation_failure::<u8>(err)
        }
    }

    /// Append a copy of `value`.
    pub fn try_push<V: AsRef<[u8]>>(&mut self, value: V) -> Result<()> {
        let value = value.as_ref();
        let end = self
            .arena
            .len()
            .checked_add(value.len())
            .filter(|&end| end <= u32::MAX as usize)
            .ok_or(Error::CapacityOverflow)?;

        let before = self.arena.len();
        self.arena.try_append(value)?;
        if let Err(err) = self.offsets.try_push(end as u32) {
            self.arena.truncate(before);
            return Err(err);
        }
        Ok(())
    }

    /// Overwrite row `index` with a copy of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[track_caller]
    pub fn set<V: AsRef<[u8]>>(&mut self, index: usize, value: V) {
        match self.try_set(index, value) {
            Ok(()) => {}
            Err(Error::IndexOutOfBounds { index, len }) => {
                panic!("index {} out of bounds for column of length {}", index, len)
            }
            Err(err) => allocation_failure::<u8>(err),
        }
    }

    /// Overwrite row `index` with a copy of `value`.
    ///
    /// A value of the same length is written in place; otherwise the arena
    /// is rebuilt and the offsets of the following rows are shifted.
    pub fn try_set<V: AsRef<[u8]>>(&mut self, index: usize, value: V) -> Result<()> {
        let value = value.as_ref();
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let (start, end) = self.bounds(index);
        let old_len = end - start;

        if value.len() == old_len {
            self.arena.get_mut(start, old_len).copy_from_slice(value);
            return Ok(());
        }

        let total = (self.arena.len() - old_len)
            .checked_add(value.len())
            .filter(|&total| total <= u32::MAX as usize)
            .ok_or(Error::CapacityOverflow)?;

        let old = self.arena.as_bytes();
        let mut arena = Arena::try_reserved(total, &self.options)?;
        arena.try_append(&old[..start])?;
        arena.try_append(value)?;
        arena.try_append(&old[end..])?;

        for offset in &mut self.offsets.as_mut_slice()[index + 1..] {
            *offset = (*offset as usize - old_len + value.len()) as u32;
        }
        self.arena = arena;
        Ok(())
    }

    /// Replace every row with a copy of `value`, keeping the row count.
    pub fn fill<V: AsRef<[u8]>>(&mut self, value: V) {
        if let Err(err) = self.try_fill(value) {
            allocation_failure::<u8>(err)
        }
    }

    /// Replace every row with a copy of `value`, keeping the row count.
    ///
    /// The arena is rebuilt, so bytes orphaned by earlier writes are dropped.
    pub fn try_fill<V: AsRef<[u8]>>(&mut self, value: V) -> Result<()> {
        let rows = vec![value.as_ref(); self.len()];
        self.build_strings(&rows)
    }

    /// Keep the rows whose `selector` entry is `true`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `selector.len() != len()`.
    #[track_caller]
    pub fn filter(&self, selector: &Column<bool>) -> Self {
        match self.try_filter(selector) {
            Ok(selected) => selected,
            Err(Error::LengthMismatch { expected, actual }) => length_mismatch(expected, actual),
            Err(err) => allocation_failure::<u8>(err),
        }
    }

    /// Keep the rows whose `selector` entry is `true`, in order.
    pub fn try_filter(&self, selector: &Column<bool>) -> Result<Self> {
        if selector.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: selector.len(),
            });
        }

        measure(Operation::Filter, self.len(), || {
            let keep = selector.as_slice();
            let selected = || (0..self.len()).filter(move |&i| keep[i]);
            let total: usize = selected().map(|i| self.get_slice(i).len()).sum();

            let mut offsets = Column::try_with_capacity(selector.count_true() + 1)?;
            let mut arena = Arena::try_reserved(total, &self.options)?;
            offsets.try_push(0)?;
            for index in selected() {
                arena.try_append(self.get_slice(index).as_bytes())?;
                offsets.try_push(arena.len() as u32)?;
            }

            Ok(FlatBinaryColumn {
                offsets,
                arena,
                options: self.options.clone(),
            })
        })
    }

    /// Length of every row.
    pub fn strlen(&self) -> Column<u32> {
        self.offsets
            .as_slice()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    /// Compare every row against `needle`.
    pub fn compare_scalar(&self, op: Operator, needle: Slice<'_>) -> Column<bool> {
        let needle = needle.as_bytes();
        match op {
            Operator::Eq => self.transform(|row| memequal(row.as_bytes(), needle)),
            Operator::Ne => self.transform(|row| !memequal(row.as_bytes(), needle)),
            _ => self.transform(|row| op.matches(memcompare(row.as_bytes(), needle))),
        }
    }

    /// Iterate over the rows in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Slice<'_>> + ExactSizeIterator + '_ {
        (0..self.len()).map(move |i| self.get_slice(i))
    }

    /// Row boundaries, `len() + 1` entries starting at zero.
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        self.offsets.as_slice()
    }

    /// Concatenated payload bytes.
    #[inline]
    pub fn arena(&self) -> &[u8] {
        self.arena.as_bytes()
    }

    /// Total payload bytes held in the arena.
    #[inline]
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// The options this column builds with.
    #[inline]
    pub fn options(&self) -> &BinaryOptions {
        &self.options
    }

    /// Remove every row, keeping the allocations.
    pub fn clear(&mut self) {
        self.offsets.truncate(1);
        self.arena.clear();
    }
}

impl Columnar for FlatBinaryColumn {
    type Value<'a> = Slice<'a>;
    type Input<'a> = Slice<'a>;

    #[inline]
    fn len(&self) -> usize {
        FlatBinaryColumn::len(self)
    }

    #[inline]
    fn value(&self, index: usize) -> Slice<'_> {
        self.get_slice(index)
    }

    fn set(&mut self, index: usize, value: Slice<'_>) {
        FlatBinaryColumn::set(self, index, value)
    }

    fn filter(&self, selector: &Column<bool>) -> Self {
        FlatBinaryColumn::filter(self, selector)
    }
}

impl Default for FlatBinaryColumn {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FlatBinaryColumn {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for FlatBinaryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
