//! Fixed-width string column.

use std::fmt;

use super::typed::length_mismatch;
use super::{Column, Columnar};
use crate::error::{Error, Result};
use crate::memory::allocation_failure;
use crate::slice::Slice;

/// Compile-time in-place operation on one fixed-width cell.
pub trait CellOp {
    /// Rewrite `cell`, which is exactly one column width long.
    fn apply(cell: &mut [u8]);
}

/// Compile-time operation writing one fixed-width cell from another.
pub trait CellMap {
    /// Fill `dst` from `src`. Both are exactly one column width long and
    /// `dst` starts zeroed.
    fn apply(src: &[u8], dst: &mut [u8]);
}

/// Column of byte strings that all occupy `width` bytes.
///
/// Values shorter than the width are zero-padded, and reading a row yields
/// the bytes up to the first zero. A value with embedded zeros therefore
/// reads back truncated.
#[derive(Clone, PartialEq)]
pub struct FixedStringColumn {
    width: usize,
    rows: usize,
    cells: Column<u8>,
}

impl FixedStringColumn {
    /// Create an empty column of `width`-byte cells.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    #[track_caller]
    pub fn new(width: usize) -> Self {
        assert!(width > 0, "fixed string width must be positive");
        FixedStringColumn {
            width,
            rows: 0,
            cells: Column::new(),
        }
    }

    /// Create a column of `rows` empty cells.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    #[track_caller]
    pub fn with_len(width: usize, rows: usize) -> Self {
        match Self::try_with_len(width, rows) {
            Ok(column) => column,
            Err(err @ Error::InvalidArgument(_)) => panic!("{}", err),
            Err(err) => allocation_failure::<u8>(err),
        }
    }

    /// Create a column of `rows` empty cells.
    pub fn try_with_len(width: usize, rows: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidArgument(
                "fixed string width must be positive".to_string(),
            ));
        }
        let bytes = rows.checked_mul(width).ok_or(Error::CapacityOverflow)?;
        Ok(FixedStringColumn {
            width,
            rows,
            cells: Column::try_with_len(bytes)?,
        })
    }

    /// Bytes per cell.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Check whether the column has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of rows the allocation can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cells.capacity() / self.width
    }

    /// Grow the allocation to hold at least `rows` rows.
    pub fn reserve(&mut self, rows: usize) {
        if let Err(err) = self.try_reserve(rows) {
            allocation_failure::<u8>(err)
        }
    }

    /// Grow the allocation to hold at least `rows` rows.
    pub fn try_reserve(&mut self, rows: usize) -> Result<()> {
        let bytes = rows.checked_mul(self.width).ok_or(Error::CapacityOverflow)?;
        self.cells.try_reserve(bytes)
    }

    /// The full `width` bytes of row `index`, padding included.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[track_caller]
    pub fn cell(&self, index: usize) -> &[u8] {
        let start = self.cell_start(index);
        &self.cells[start..start + self.width]
    }

    /// The full `width` bytes of row `index`, mutably.
    #[inline]
    #[track_caller]
    pub fn cell_mut(&mut self, index: usize) -> &mut [u8] {
        let start = self.cell_start(index);
        let width = self.width;
        &mut self.cells[start..start + width]
    }

    #[inline]
    #[track_caller]
    fn cell_start(&self, index: usize) -> usize {
        assert!(
            index < self.rows,
            "index {} out of bounds for column of length {}",
            index,
            self.rows
        );
        index * self.width
    }

    /// Row `index` up to its first zero byte.
    #[inline]
    #[track_caller]
    pub fn get_slice(&self, index: usize) -> Slice<'_> {
        let cell = self.cell(index);
        Slice::new(&cell[..strnlen(cell)])
    }

    /// Overwrite row `index`, zero-padding to the cell width.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()` or `value` is wider than a cell.
    #[track_caller]
    pub fn set<V: AsRef<[u8]>>(&mut self, index: usize, value: V) {
        if let Err(err) = self.try_set(index, value) {
            panic!("{}", err)
        }
    }

    /// Overwrite row `index`, zero-padding to the cell width.
    pub fn try_set<V: AsRef<[u8]>>(&mut self, index: usize, value: V) -> Result<()> {
        let value = value.as_ref();
        if index >= self.rows {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.rows,
            });
        }
        self.check_width(value)?;
        write_padded(self.cell_mut(index), value);
        Ok(())
    }

    fn check_width(&self, value: &[u8]) -> Result<()> {
        if value.len() > self.width {
            return Err(Error::ValueTooWide {
                width: self.width,
                len: value.len(),
            });
        }
        Ok(())
    }

    /// Append `value`, zero-padded to the cell width.
    ///
    /// # Panics
    ///
    /// Panics if `value` is wider than a cell.
    #[track_caller]
    pub fn push<V: AsRef<[u8]>>(&mut self, value: V) {
        match self.try_push(value) {
            Ok(()) => {}
            Err(err @ Error::ValueTooWide { .. }) => panic!("{}", err),
            Err(err) => allocation_failure::<u8>(err),
        }
    }

    /// Append `value`, zero-padded to the cell width.
    pub fn try_push<V: AsRef<[u8]>>(&mut self, value: V) -> Result<()> {
        let value = value.as_ref();
        self.check_width(value)?;
        let start = self.cells.len();
        self.cells.try_extend_from_slice(value)?;
        if let Err(err) = self.pad_to(start + self.width) {
            self.cells.truncate(start);
            return Err(err);
        }
        self.rows += 1;
        Ok(())
    }

    fn pad_to(&mut self, len: usize) -> Result<()> {
        while self.cells.len() < len {
            self.cells.try_push(0)?;
        }
        Ok(())
    }

    /// Write `value` into every row.
    ///
    /// # Panics
    ///
    /// Panics if `value` is wider than a cell.
    #[track_caller]
    pub fn fill<V: AsRef<[u8]>>(&mut self, value: V) {
        let value = value.as_ref();
        if let Err(err) = self.check_width(value) {
            panic!("{}", err)
        }
        for cell in self.cells.chunks_exact_mut(self.width) {
            write_padded(cell, value);
        }
    }

    /// Remove every row, keeping the allocation.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.rows = 0;
    }

    /// Length of every row up to its first zero byte.
    pub fn strlen(&self) -> Column<u32> {
        self.cells
            .chunks_exact(self.width)
            .map(|cell| strnlen(cell) as u32)
            .collect()
    }

    /// Rewrite every cell in place.
    pub fn apply<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut [u8]),
    {
        for cell in self.cells.chunks_exact_mut(self.width) {
            f(cell);
        }
    }

    /// Rewrite every cell in place with a statically dispatched operation.
    pub fn apply_op<Op: CellOp>(&mut self) {
        for cell in self.cells.chunks_exact_mut(self.width) {
            Op::apply(cell);
        }
    }

    /// Build a new column of the same width by mapping every cell through `Op`.
    pub fn vec_transform<Op: CellMap>(&self) -> Self {
        let mut out = Self::with_len(self.width, self.rows);
        for (src, dst) in self
            .cells
            .chunks_exact(self.width)
            .zip(out.cells.chunks_exact_mut(self.width))
        {
            Op::apply(src, dst);
        }
        out
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
        if selector.len() != self.rows {
            return Err(Error::LengthMismatch {
                expected: self.rows,
                actual: selector.len(),
            });
        }
        let rows = selector.count_true();
        let mut cells = Column::try_with_capacity(rows * self.width)?;
        for (cell, _) in self
            .cells
            .chunks_exact(self.width)
            .zip(selector.iter())
            .filter(|(_, &keep)| keep)
        {
            cells.try_extend_from_slice(cell)?;
        }
        Ok(FixedStringColumn {
            width: self.width,
            rows,
            cells,
        })
    }

    /// Iterate over the rows in order, each up to its first zero byte.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Slice<'_>> + ExactSizeIterator + '_ {
        self.cells
            .chunks_exact(self.width)
            .map(|cell| Slice::new(&cell[..strnlen(cell)]))
    }
}

impl Columnar for FixedStringColumn {
    type Value<'a> = Slice<'a>;
    type Input<'a> = Slice<'a>;

    #[inline]
    fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    fn value(&self, index: usize) -> Slice<'_> {
        self.get_slice(index)
    }

    fn set(&mut self, index: usize, value: Slice<'_>) {
        FixedStringColumn::set(self, index, value)
    }

    fn filter(&self, selector: &Column<bool>) -> Self {
        FixedStringColumn::filter(self, selector)
    }
}

impl fmt::Debug for FixedStringColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedStringColumn")
            .field("width", &self.width)
            .field("rows", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

#[inline]
fn strnlen(cell: &[u8]) -> usize {
    cell.iter().position(|&b| b == 0).unwrap_or(cell.len())
}

#[inline]
fn write_padded(cell: &mut [u8], value: &[u8]) {
    let (head, tail) = cell.split_at_mut(value.len());
    head.copy_from_slice(value);
    tail.fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl CellOp for Upper {
        fn apply(cell: &mut [u8]) {
            cell.make_ascii_uppercase();
        }
    }

    struct Initial;

    impl CellMap for Initial {
        fn apply(src: &[u8], dst: &mut [u8]) {
            dst[0] = src[0];
        }
    }

    #[test]
    fn vec_transform_builds_a_new_column() {
        let mut column = FixedStringColumn::new(7);
        for mode in ["TRUCK", "REG AIR", "FOB"] {
            column.push(mode);
        }
        let initials = column.vec_transform::<Initial>();
        assert_eq!(initials.width(), 7);
        assert_eq!(initials.iter().collect::<Vec<_>>(), vec!["T", "R", "F"]);
        assert_eq!(initials.cell(1), b"R\0\0\0\0\0\0");
        assert_eq!(column.get_slice(1), "REG AIR");

        let empty = FixedStringColumn::new(3).vec_transform::<Initial>();
        assert!(empty.is_empty());
    }

    #[test]
    fn set_pads_with_zeros() {
        let mut column = FixedStringColumn::with_len(8, 2);
        column.set(0, "REG AIR");
        column.set(1, "AIR");
        assert_eq!(column.cell(1), b"AIR\0\0\0\0\0");
        assert_eq!(column.get_slice(0), "REG AIR");
        assert_eq!(column.get_slice(1), "AIR");

        column.set(0, "SHIP");
        assert_eq!(column.cell(0), b"SHIP\0\0\0\0");
    }

    #[test]
    fn full_width_values_have_no_terminator() {
        let mut column = FixedStringColumn::new(4);
        column.push("RAIL");
        assert_eq!(column.get_slice(0), "RAIL");
        assert_eq!(column.strlen().as_slice(), &[4]);
    }

    #[test]
    fn too_wide_values_are_rejected() {
        let mut column = FixedStringColumn::with_len(4, 1);
        assert_eq!(
            column.try_set(0, "TRUCK").unwrap_err(),
            Error::ValueTooWide { width: 4, len: 5 }
        );
        assert_eq!(
            column.try_push("TRUCK").unwrap_err(),
            Error::ValueTooWide { width: 4, len: 5 }
        );
        assert_eq!(column.len(), 1);
        assert_eq!(column.cell(0), &[0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn set_panics_when_too_wide() {
        let mut column = FixedStringColumn::with_len(2, 1);
        column.set(0, "AIR");
    }

    #[test]
    fn embedded_zero_truncates_the_read() {
        let mut column = FixedStringColumn::new(6);
        column.push(b"AB\0CD");
        assert_eq!(column.get_slice(0), "AB");
        assert_eq!(column.cell(0), b"AB\0CD\0");
    }

    #[test]
    fn fill_reserve_and_strlen() {
        let mut column = FixedStringColumn::with_len(5, 3);
        column.reserve(10);
        assert!(column.capacity() >= 10);
        column.fill("FOB");
        column.set(2, "TRUCK");
        assert_eq!(column.strlen().as_slice(), &[3, 3, 5]);
    }

    #[test]
    fn apply_and_apply_op() {
        let mut column = FixedStringColumn::new(5);
        column.push("mail");
        column.push("ship");
        column.apply_op::<Upper>();
        assert_eq!(column.iter().collect::<Vec<_>>(), vec!["MAIL", "SHIP"]);
        column.apply(|cell| cell.reverse());
        // Reversal moves the padding to the front.
        assert_eq!(column.get_slice(0), "");
        assert_eq!(column.cell(0), b"\0LIAM");
    }

    #[test]
    fn filter_and_transform() {
        let mut column = FixedStringColumn::new(7);
        for mode in ["TRUCK", "AIR", "RAIL", "REG AIR"] {
            column.push(mode);
        }
        let lengths = column.transform(|s| s.len() as u8);
        assert_eq!(lengths.as_slice(), &[5, 3, 4, 7]);

        let short = lengths.compare_scalar(crate::column::Operator::Lt, 5);
        let selected = column.filter(&short);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.get_slice(0), "AIR");
        assert_eq!(selected.get_slice(1), "RAIL");
    }

    #[test]
    fn zero_width_is_invalid() {
        assert!(matches!(
            FixedStringColumn::try_with_len(0, 3),
            Err(Error::InvalidArgument(_))
        ));
    }
}
