//! String column with inlined short payloads.

use std::fmt;

use super::{Arena, BinaryOptions};
use crate::column::typed::length_mismatch;
use crate::column::{Column, Columnar, Operator};
use crate::error::{Error, Result};
use crate::memory::{allocation_failure, Pod};
use crate::slice::{Slice, SliceInline, INLINE_LEN, PREFIX_LEN};
use crate::utils::metrics::{measure, Operation};

/// Stored form of one row: 16 bytes, length first.
///
/// Payloads of at most `INLINE_LEN` bytes sit zero-padded in `payload`.
/// Longer ones keep their prefix in `payload[..4]` and their arena offset,
/// little-endian, in `payload[4..]`.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
struct Entry {
    len: u32,
    payload: [u8; INLINE_LEN],
}

// Plain bytes; all-zero is the empty inline row.
unsafe impl Pod for Entry {}

impl Entry {
    /// Encode `data`, spilling it to `arena` when it does not fit inline.
    fn store(data: &[u8], arena: &mut Arena) -> Result<Entry> {
        if data.len() > u32::MAX as usize {
            return Err(Error::CapacityOverflow);
        }
        let mut payload = [0u8; INLINE_LEN];
        if data.len() <= INLINE_LEN {
            payload[..data.len()].copy_from_slice(data);
        } else {
            let offset = arena.try_append(data)? as u64;
            payload[..PREFIX_LEN].copy_from_slice(&data[..PREFIX_LEN]);
            payload[PREFIX_LEN..].copy_from_slice(&offset.to_le_bytes());
        }
        Ok(Entry {
            len: data.len() as u32,
            payload,
        })
    }

    #[inline]
    fn is_inline(&self) -> bool {
        self.len as usize <= INLINE_LEN
    }

    #[inline]
    fn view<'a>(&self, arena: &'a Arena) -> SliceInline<'a> {
        if self.is_inline() {
            return SliceInline::from_inline(self.len, self.payload);
        }
        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&self.payload[..PREFIX_LEN]);
        let mut offset = [0u8; 8];
        offset.copy_from_slice(&self.payload[PREFIX_LEN..]);
        let data = arena.get(u64::from_le_bytes(offset) as usize, self.len as usize);
        SliceInline::from_external(prefix, data)
    }
}

/// String column keeping payloads of up to 12 bytes inline.
///
/// Each row is a 16-byte entry; only payloads longer than 12 bytes are
/// copied to the arena. Overwriting a long row appends the new payload and
/// leaves the old bytes unreferenced until the next build or filter.
#[derive(Clone, Default)]
pub struct InlineBinaryColumn {
    entries: Column<Entry>,
    arena: Arena,
    options: BinaryOptions,
}

impl InlineBinaryColumn {
    /// Create an empty column with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty column with custom options.
    pub fn with_options(options: BinaryOptions) -> Result<Self> {
        options.validate()?;
        Ok(InlineBinaryColumn {
            entries: Column::new(),
            arena: Arena::default(),
            options,
        })
    }

    /// Build a column from `values` with default options.
    pub fn from_strings<S: AsRef<[u8]>>(values: &[S]) -> Result<Self> {
        let mut column = InlineBinaryColumn::new();
        column.build_strings(values)?;
        Ok(column)
    }

    /// Replace the contents with copies of `values`.
    ///
    /// The arena is sized once from the summed length of the payloads that
    /// do not fit inline. On error the previous contents are left untouched.
    pub fn build_strings<S: AsRef<[u8]>>(&mut self, values: &[S]) -> Result<()> {
        let spilled = values
            .iter()
            .map(|v| v.as_ref().len())
            .filter(|&len| len > INLINE_LEN)
            .try_fold(0usize, |acc, len| acc.checked_add(len))
            .ok_or(Error::CapacityOverflow)?;

        measure(Operation::Build, values.len(), || {
            let rows = self.options.row_capacity(values.len())?;
            let mut entries = Column::try_with_capacity(rows)?;
            let mut arena = Arena::try_reserved(spilled, &self.options)?;

            for value in values {
                entries.try_push(Entry::store(value.as_ref(), &mut arena)?)?;
            }

            tracing::trace!(
                rows = values.len(),
                arena_bytes = spilled,
                "built inline binary column"
            );
            self.entries = entries;
            self.arena = arena;
            Ok(())
        })
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the column has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// View of row `index`.
    ///
    /// Short rows are copied into the view; long rows borrow the arena.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[track_caller]
    pub fn get_slice(&self, index: usize) -> SliceInline<'_> {
        self.entries[index].view(&self.arena)
    }

    /// Check whether row `index` is stored inline.
    #[inline]
    #[track_caller]
    pub fn is_inline(&self, index: usize) -> bool {
        self.entries[index].is_inline()
    }

    /// Append a copy of `value`.
    pub fn push<V: AsRef<[u8]>>(&mut self, value: V) {
        if let Err(err) = self.try_push(value) {
            allocation_failure::<u8>(err)
        }
    }

    /// Append a copy of `value`.
    pub fn try_push<V: AsRef<[u8]>>(&mut self, value: V) -> Result<()> {
        let before = self.arena.len();
        let entry = Entry::store(value.as_ref(), &mut self.arena)?;
        if let Err(err) = self.entries.try_push(entry) {
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
    pub fn try_set<V: AsRef<[u8]>>(&mut self, index: usize, value: V) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let entry = Entry::store(value.as_ref(), &mut self.arena)?;
        self.entries[index] = entry;
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
    ///
    /// Inline entries are copied as they are; spilled payloads are copied
    /// into a fresh, compacted arena.
    pub fn try_filter(&self, selector: &Column<bool>) -> Result<Self> {
        if selector.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: selector.len(),
            });
        }

        measure(Operation::Filter, self.len(), || {
            let keep = selector.as_slice();
            let selected = || {
                self.entries
                    .iter()
                    .zip(keep)
                    .filter_map(|(entry, &keep)| keep.then_some(entry))
            };
            let spilled: usize = selected()
                .filter(|entry| !entry.is_inline())
                .map(|entry| entry.len as usize)
                .sum();

            let mut entries = Column::try_with_capacity(selector.count_true())?;
            let mut arena = Arena::try_reserved(spilled, &self.options)?;
            for entry in selected() {
                let copied = if entry.is_inline() {
                    *entry
                } else {
                    Entry::store(entry.view(&self.arena).as_bytes(), &mut arena)?
                };
                entries.try_push(copied)?;
            }

            Ok(InlineBinaryColumn {
                entries,
                arena,
                options: self.options.clone(),
            })
        })
    }

    /// Length of every row.
    pub fn strlen(&self) -> Column<u32> {
        self.entries.transform(|entry| entry.len)
    }

    /// Compare every row against `needle`.
    ///
    /// Equality checks reject on length and prefix before reading the arena.
    pub fn compare_scalar(&self, op: Operator, needle: Slice<'_>) -> Column<bool> {
        let needle = SliceInline::new(needle.as_bytes());
        match op {
            Operator::Eq => self.transform(|row| row == needle),
            Operator::Ne => self.transform(|row| row != needle),
            _ => self.transform(|row| op.matches(row.cmp(&needle))),
        }
    }

    /// Iterate over the rows in order.
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = SliceInline<'_>> + ExactSizeIterator + '_ {
        self.entries.iter().map(move |entry| entry.view(&self.arena))
    }

    /// Bytes held in the arena, including payloads no row refers to any more.
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
        self.entries.clear();
        self.arena.clear();
    }
}

impl Columnar for InlineBinaryColumn {
    type Value<'a> = SliceInline<'a>;
    type Input<'a> = Slice<'a>;

    #[inline]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn value(&self, index: usize) -> SliceInline<'_> {
        self.get_slice(index)
    }

    fn set(&mut self, index: usize, value: Slice<'_>) {
        InlineBinaryColumn::set(self, index, value)
    }

    fn filter(&self, selector: &Column<bool>) -> Self {
        InlineBinaryColumn::filter(self, selector)
    }
}

impl PartialEq for InlineBinaryColumn {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for InlineBinaryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<Entry>(), 16);
    }

    #[test]
    fn only_long_rows_reach_the_arena() {
        let values = ["TRUCK", "REG AIR", "TWELVE_BYTES", "THIRTEEN_BYTE", "SHIPMENT-0001-A"];
        let column = InlineBinaryColumn::from_strings(&values).unwrap();

        assert_eq!(column.arena_len(), 13 + 15);
        for (i, v) in values.iter().enumerate() {
            assert_eq!(column.get_slice(i), Slice::from(*v));
            assert_eq!(column.is_inline(i), v.len() <= INLINE_LEN);
        }
    }

    #[test]
    fn ship_modes_stay_inline() {
        let modes = ["TRUCK", "AIR", "RAIL", "MAIL", "REG AIR", "SHIP", "FOB"];
        let column = InlineBinaryColumn::from_strings(&modes).unwrap();
        assert_eq!(column.arena_len(), 0);
        assert_eq!(column.get_slice(0), Slice::from("TRUCK"));
        assert_eq!(column.get_slice(6), Slice::from("FOB"));
    }

    #[test]
    fn long_rows_survive_arena_growth() {
        let mut column = InlineBinaryColumn::new();
        let rows: Vec<String> = (0..200).map(|i| format!("long-payload-row-{:04}", i)).collect();
        for row in &rows {
            column.push(row);
        }
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(column.get_slice(i).as_bytes(), row.as_bytes());
        }
    }

    #[test]
    fn set_switches_representation() {
        let mut column = InlineBinaryColumn::from_strings(&["AIR", "FOB"]).unwrap();
        column.set(0, "SHIPMENT-0001-A");
        assert!(!column.is_inline(0));
        assert_eq!(column.get_slice(0), Slice::from("SHIPMENT-0001-A"));
        column.set(0, "RAIL");
        assert!(column.is_inline(0));
        assert_eq!(column.get_slice(0), Slice::from("RAIL"));
        assert_eq!(column.strlen().as_slice(), &[4, 3]);
    }

    #[test]
    fn filter_compacts_the_arena() {
        let mut column =
            InlineBinaryColumn::from_strings(&["SHIPMENT-0001-A", "AIR", "SHIPMENT-0002-B"]).unwrap();
        column.set(2, "SHIPMENT-0003-C");
        assert_eq!(column.arena_len(), 45);

        let mask = column.compare_scalar(Operator::Ne, Slice::from("AIR"));
        let selected = column.filter(&mask);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.arena_len(), 30);
        assert_eq!(selected.get_slice(1), Slice::from("SHIPMENT-0003-C"));
    }

    #[test]
    fn fill_rewrites_every_row() {
        let mut column = InlineBinaryColumn::from_strings(&["AIR", "FOB", "RAIL"]).unwrap();
        column.set(1, "SHIPMENT-0001-A");

        column.fill("SHIPMENT-0002-B");
        assert_eq!(column.len(), 3);
        assert_eq!(column.arena_len(), 3 * 15);
        assert!(column.iter().all(|row| row == Slice::from("SHIPMENT-0002-B")));

        column.fill("MAIL");
        assert_eq!(column.arena_len(), 0);
        assert!((0..3).all(|i| column.is_inline(i)));
    }

    #[test]
    fn ordering_mask() {
        let column = InlineBinaryColumn::from_strings(&["MAIL", "AIR", "SHIPMENT-0001-A", "RAIL"]).unwrap();
        let mask = column.compare_scalar(Operator::Ge, Slice::from("RAIL"));
        assert_eq!(mask.as_slice(), &[false, false, true, true]);
    }

    #[test]
    fn matches_flat_layout() {
        let long = "x".repeat(1000);
        let values = ["", "A", "TWELVE_BYTES", "THIRTEEN_BYTE", long.as_str()];
        let inline = InlineBinaryColumn::from_strings(&values).unwrap();
        let flat = super::super::FlatBinaryColumn::from_strings(&values).unwrap();
        for i in 0..values.len() {
            assert_eq!(inline.get_slice(i), flat.get_slice(i));
        }
    }
}
