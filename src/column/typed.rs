//! Fixed-width typed column.

use std::fmt;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::slice::{self, SliceIndex};

use crate::column::iter::ColumnIter;
use crate::error::{Error, Result};
use crate::memory::{allocation_failure, Pod, RawBuffer};
use crate::types::{Primitive, PrimitiveType, TypeDescriptor, TypeRegistry};
use crate::utils::metrics::{measure, Operation};

/// Compile-time elementwise operation for [`Column::apply_op`] and
/// [`Column::vec_transform`].
///
/// Dispatch is static, so the hot loop carries no indirect call.
pub trait UnaryOp<T> {
    /// Map one element.
    fn apply(value: T) -> T;
}

/// A resizable, exclusively owned array of fixed-width elements.
///
/// Elements `[0, len)` are initialized; the rest of the allocation is
/// unspecified. The buffer comes from the C allocator and is freed exactly
/// once when the column is dropped.
///
/// Indexing past `len`, and elementwise operations between columns of
/// different lengths, panic. Use the `try_*` methods to get an [`Error`]
/// instead.
pub struct Column<T: Pod> {
    buf: RawBuffer<T>,
    len: usize,
}

impl<T: Pod> Column<T> {
    /// Create an empty column with no backing allocation.
    #[inline]
    pub const fn new() -> Self {
        Column {
            buf: RawBuffer::new(),
            len: 0,
        }
    }

    /// Create a column of `len` zeroed elements, with `capacity == len`.
    ///
    /// If the allocator refuses the request the column comes back empty and
    /// unallocated; check [`is_allocated`](Self::is_allocated) or use
    /// [`try_with_len`](Self::try_with_len) when that matters.
    pub fn with_len(len: usize) -> Self {
        match Self::try_with_len(len) {
            Ok(column) => column,
            Err(err) => {
                tracing::warn!(len, error = %err, "returning an unallocated column");
                Self::new()
            }
        }
    }

    /// Create a column of `len` zeroed elements.
    pub fn try_with_len(len: usize) -> Result<Self> {
        Ok(Column {
            buf: RawBuffer::try_zeroed(len)?,
            len,
        })
    }

    /// Create an empty column able to hold `capacity` elements without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).unwrap_or_else(|err| allocation_failure::<T>(err))
    }

    /// Create an empty column able to hold `capacity` elements without growing.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        Ok(Column {
            buf: RawBuffer::try_zeroed(capacity)?,
            len: 0,
        })
    }

    /// Adopt a buffer allocated by the C allocator without copying it.
    ///
    /// # Safety
    ///
    /// `ptr` must satisfy the contract of [`RawBuffer::from_raw_parts`] for
    /// `capacity` elements, `len <= capacity`, and the first `len` elements
    /// must be initialized.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize, capacity: usize) -> Self {
        debug_assert!(len <= capacity);
        let buf = RawBuffer::from_raw_parts(ptr, capacity);
        let len = len.min(buf.capacity());
        Column { buf, len }
    }

    /// Give up ownership of the buffer as `(ptr, len, capacity)`.
    ///
    /// The caller becomes responsible for releasing it with `free`.
    pub fn into_raw_parts(self) -> (*mut T, usize, usize) {
        let len = self.len;
        let (ptr, capacity) = self.buf.into_raw_parts();
        (ptr, len, capacity)
    }

    /// Copy a slice into a new column.
    pub fn from_slice(values: &[T]) -> Self {
        let mut column = Self::alloc_len(values.len());
        column.as_mut_slice().copy_from_slice(values);
        column
    }

    /// Allocate `len` zeroed elements, reporting failure to the allocation
    /// error handler.
    pub(crate) fn alloc_len(len: usize) -> Self {
        Self::try_with_len(len).unwrap_or_else(|err| allocation_failure::<T>(err))
    }

    /// Number of initialized elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the column holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the allocation can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Check whether the column owns a backing allocation.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.buf.is_allocated()
    }

    /// The initialized elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    /// The initialized elements, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.len == 0 {
            return &mut [];
        }
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), self.len) }
    }

    /// Pointer to the first element, null for an unallocated column.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    /// Grow the allocation to hold at least `capacity` elements.
    ///
    /// Never shrinks. Existing elements are preserved.
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            allocation_failure::<T>(err)
        }
    }

    /// Grow the allocation to hold at least `capacity` elements.
    ///
    /// On failure the column is left exactly as it was.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        if self.buf.capacity() >= capacity {
            return Ok(());
        }
        self.buf.try_resize(capacity)
    }

    /// Append one element, growing to `2 * capacity + 1` when full.
    #[inline]
    pub fn push(&mut self, value: T) {
        if let Err(err) = self.try_push(value) {
            allocation_failure::<T>(err)
        }
    }

    /// Append one element.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<()> {
        if self.len == self.buf.capacity() {
            self.grow_for(1)?;
        }
        unsafe { self.buf.as_mut_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Append every element of `values`.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        if let Err(err) = self.try_extend_from_slice(values) {
            allocation_failure::<T>(err)
        }
    }

    /// Append every element of `values`.
    pub fn try_extend_from_slice(&mut self, values: &[T]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        if self.buf.capacity() - self.len < values.len() {
            self.grow_for(values.len())?;
        }
        unsafe {
            self.buf
                .as_mut_ptr()
                .add(self.len)
                .copy_from_nonoverlapping(values.as_ptr(), values.len());
        }
        self.len += values.len();
        Ok(())
    }

    fn grow_for(&mut self, additional: usize) -> Result<()> {
        let required = self.len.checked_add(additional).ok_or(Error::CapacityOverflow)?;
        let doubled = self
            .buf
            .capacity()
            .checked_mul(2)
            .and_then(|c| c.checked_add(1))
            .unwrap_or(usize::MAX);
        self.buf.try_resize(required.max(doubled))
    }

    /// Get a copy of the element at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    /// Overwrite the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    /// Overwrite the element at `index`.
    pub fn try_set(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.len;
        match self.as_mut_slice().get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { index, len }),
        }
    }

    /// Overwrite every element with `value`.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    /// Drop every element, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shorten the column to `len` elements. No-op if already shorter.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Keep the elements whose `selector` entry is `true`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `selector.len() != self.len()`.
    #[track_caller]
    pub fn filter(&self, selector: &Column<bool>) -> Column<T> {
        match self.try_filter(selector) {
            Ok(selected) => selected,
            Err(Error::LengthMismatch { expected, actual }) => length_mismatch(expected, actual),
            Err(err) => allocation_failure::<T>(err),
        }
    }

    /// Keep the elements whose `selector` entry is `true`, in order.
    ///
    /// The result is allocated at `self.len()` capacity and compacted without
    /// branching on the selector.
    pub fn try_filter(&self, selector: &Column<bool>) -> Result<Column<T>> {
        if selector.len() != self.len {
            return Err(Error::LengthMismatch {
                expected: self.len,
                actual: selector.len(),
            });
        }

        measure(Operation::Filter, self.len, || {
            let mut selected = Column::try_with_len(self.len)?;
            let dst = selected.as_mut_slice();
            let mut count = 0;
            for (&value, &keep) in self.as_slice().iter().zip(selector.as_slice()) {
                // `count` never exceeds the current source index.
                unsafe { *dst.get_unchecked_mut(count) = value };
                count += keep as usize;
            }
            selected.len = count;
            Ok(selected)
        })
    }

    /// Map every element into a new column, possibly of another type.
    pub fn transform<U, F>(&self, mut f: F) -> Column<U>
    where
        U: Pod,
        F: FnMut(T) -> U,
    {
        let mut out = Column::<U>::alloc_len(self.len);
        for (dst, &src) in out.as_mut_slice().iter_mut().zip(self.as_slice()) {
            *dst = f(src);
        }
        out
    }

    /// Map every element in place.
    pub fn apply<F>(&mut self, mut f: F)
    where
        F: FnMut(T) -> T,
    {
        for value in self.as_mut_slice() {
            *value = f(*value);
        }
    }

    /// Map every element in place with a statically dispatched operation.
    pub fn apply_op<Op: UnaryOp<T>>(&mut self) {
        for value in self.as_mut_slice() {
            *value = Op::apply(*value);
        }
    }

    /// Map every element into a new column with a statically dispatched
    /// operation.
    pub fn vec_transform<Op: UnaryOp<T>>(&self) -> Column<T> {
        let mut out = Column::alloc_len(self.len);
        for (dst, &src) in out.as_mut_slice().iter_mut().zip(self.as_slice()) {
            *dst = Op::apply(src);
        }
        out
    }

    /// Random-access iterator over the elements.
    #[inline]
    pub fn iter(&self) -> ColumnIter<'_, T> {
        ColumnIter::new(self.as_slice())
    }

    /// Mutable iterator over the elements.
    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }
}

impl<T: Primitive> Column<T> {
    /// Sort ascending in place. Floats use their IEEE total order.
    pub fn sort(&mut self) {
        self.as_mut_slice().sort_unstable_by(|a, b| a.total_cmp(b));
    }

    /// Runtime tag of the element type, if it has one.
    #[inline]
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        T::TYPE
    }

    /// Look the element type up in `registry`.
    pub fn descriptor<'r>(&self, registry: &'r TypeRegistry) -> Option<&'r TypeDescriptor> {
        registry.descriptor_of::<T>()
    }
}

impl Column<bool> {
    /// Number of `true` entries.
    pub fn count_true(&self) -> usize {
        self.as_slice().iter().map(|&b| b as usize).sum()
    }
}

#[cold]
#[track_caller]
pub(crate) fn length_mismatch(expected: usize, actual: usize) -> ! {
    panic!("column length mismatch: expected {}, got {}", expected, actual)
}

impl<T: Pod> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl<T: Pod + PartialEq> PartialEq for Column<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: Pod> Deref for Column<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Pod> DerefMut for Column<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Pod, I: SliceIndex<[T]>> Index<I> for Column<T> {
    type Output = I::Output;

    #[inline]
    #[track_caller]
    fn index(&self, index: I) -> &I::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T: Pod, I: SliceIndex<[T]>> IndexMut<I> for Column<T> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: I) -> &mut I::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T: Pod> From<&[T]> for Column<T> {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T: Pod, const N: usize> From<[T; N]> for Column<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_slice(&values)
    }
}

impl<T: Pod> FromIterator<T> for Column<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut column = Column::with_capacity(iter.size_hint().0);
        for value in iter {
            column.push(value);
        }
        column
    }
}

impl<T: Pod> Extend<T> for Column<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T: Pod> IntoIterator for &'a Column<T> {
    type Item = &'a T;
    type IntoIter = ColumnIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;

    impl UnaryOp<i32> for Double {
        fn apply(value: i32) -> i32 {
            value * 2
        }
    }

    #[test]
    fn with_len_is_zeroed() {
        let column = Column::<i64>::with_len(5);
        assert_eq!(column.len(), 5);
        assert_eq!(column.capacity(), 5);
        assert!(column.iter().all(|&v| v == 0));
    }

    #[test]
    fn new_column_is_unallocated() {
        let column = Column::<f32>::new();
        assert!(column.is_empty());
        assert!(!column.is_allocated());
        assert!(column.as_ptr().is_null());
        assert_eq!(column.as_slice(), &[] as &[f32]);
    }

    #[test]
    fn push_grows_by_doubling_plus_one() {
        let mut column = Column::<i32>::new();
        let mut seen = Vec::new();
        for i in 0..20 {
            column.push(i);
            if seen.last() != Some(&column.capacity()) {
                seen.push(column.capacity());
            }
        }
        assert_eq!(seen, vec![1, 3, 7, 15, 31]);
        assert_eq!(column.as_slice(), (0..20).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn reserve_never_shrinks() {
        let mut column = Column::from([1u16, 2, 3]);
        column.reserve(100);
        assert_eq!(column.capacity(), 100);
        column.reserve(10);
        assert_eq!(column.capacity(), 100);
        assert_eq!(column.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn clone_copies_contents() {
        let mut original = Column::from([1.5f64, 2.5]);
        let copy = original.clone();
        original.set(0, 9.0);
        assert_eq!(copy.as_slice(), &[1.5, 2.5]);
        assert_ne!(copy.as_ptr(), original.as_ptr());
    }

    #[test]
    fn take_leaves_an_empty_column() {
        let mut source = Column::from([7i8, 8, 9]);
        let moved = std::mem::take(&mut source);
        assert_eq!(moved.len(), 3);
        assert!(source.is_empty());
        assert!(!source.is_allocated());
    }

    #[test]
    fn raw_parts_transfer_ownership() {
        let column = Column::from([10u32, 20, 30]);
        let (ptr, len, capacity) = column.into_raw_parts();
        let adopted = unsafe { Column::from_raw_parts(ptr, len, capacity) };
        assert_eq!(adopted.as_slice(), &[10, 20, 30]);
    }

    #[test]
    fn filter_keeps_selected_in_order() {
        let column = Column::from([10, 11, 12, 13, 14, 15]);
        let selector = Column::from([true, false, false, true, true, false]);
        let selected = column.filter(&selector);
        assert_eq!(selected.as_slice(), &[10, 13, 14]);
        assert_eq!(selected.len(), selector.count_true());
    }

    #[test]
    fn filter_rejects_short_selectors() {
        let column = Column::from([1, 2, 3]);
        let selector = Column::from([true]);
        assert_eq!(
            column.try_filter(&selector).unwrap_err(),
            Error::LengthMismatch { expected: 3, actual: 1 }
        );
    }

    #[test]
    #[should_panic(expected = "column length mismatch")]
    fn filter_panics_on_mismatch() {
        let column = Column::from([1, 2, 3]);
        column.filter(&Column::from([true, false]));
    }

    #[test]
    fn transform_changes_type() {
        let column = Column::from([1i32, -2, 3]);
        let widened: Column<f64> = column.transform(|v| v as f64 * 0.5);
        assert_eq!(widened.as_slice(), &[0.5, -1.0, 1.5]);
        assert_eq!(column.as_slice(), &[1, -2, 3]);
    }

    #[test]
    fn apply_variants_agree() {
        let mut by_closure = Column::from([1, 2, 3]);
        by_closure.apply(|v| v * 2);

        let mut by_op = Column::from([1, 2, 3]);
        by_op.apply_op::<Double>();

        let by_transform = Column::from([1, 2, 3]).vec_transform::<Double>();

        assert_eq!(by_closure, by_op);
        assert_eq!(by_op, by_transform);
    }

    #[test]
    fn sort_orders_floats_totally() {
        let mut column = Column::from([3.0f64, f64::NAN, -1.0, 2.0]);
        column.sort();
        assert_eq!(&column.as_slice()[..3], &[-1.0, 2.0, 3.0]);
        assert!(column[3].is_nan());
    }

    #[test]
    fn set_and_get() {
        let mut column = Column::<u8>::with_len(3);
        column.set(1, 42);
        assert_eq!(column.get(1), Some(42));
        assert_eq!(column.get(3), None);
        assert_eq!(
            column.try_set(3, 1).unwrap_err(),
            Error::IndexOutOfBounds { index: 3, len: 3 }
        );
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds_panics() {
        let column = Column::<i32>::with_len(2);
        let _ = column[2];
    }

    #[test]
    fn fill_and_clear() {
        let mut column = Column::<i16>::with_len(4);
        column.fill(-3);
        assert_eq!(column.as_slice(), &[-3, -3, -3, -3]);
        column.clear();
        assert!(column.is_empty());
        assert_eq!(column.capacity(), 4);
    }

    #[test]
    fn extend_from_slice_appends() {
        let mut column = Column::from([1u8]);
        column.extend_from_slice(b"abc");
        assert_eq!(column.as_slice(), &[1, b'a', b'b', b'c']);
    }

    #[test]
    fn collect_and_slice_algorithms() {
        let column: Column<i32> = (0..10).rev().collect();
        assert_eq!(column.iter().filter(|&&v| v % 3 == 0).count(), 4);
        assert_eq!(column.iter().max(), Some(&9));
        assert!(column.contains(&5));
    }

    #[test]
    fn registry_lookup_is_injected() {
        let registry = TypeRegistry::with_primitives();
        let column = Column::<i64>::with_len(1);
        assert_eq!(column.primitive_type(), Some(PrimitiveType::BigInt));
        assert_eq!(column.descriptor(&registry).unwrap().width, Some(8));
    }
}
