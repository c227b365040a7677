//! Random-access iteration over typed columns.

use std::iter::FusedIterator;

/// Iterator over the elements of a [`Column`](super::Column).
///
/// Besides the usual double-ended iteration it exposes its position, so two
/// iterators over the same column can be subtracted and advanced by an
/// arbitrary distance in constant time.
#[derive(Debug, Clone)]
pub struct ColumnIter<'a, T> {
    data: &'a [T],
    front: usize,
    back: usize,
}

impl<'a, T> ColumnIter<'a, T> {
    pub(crate) fn new(data: &'a [T]) -> Self {
        ColumnIter {
            data,
            front: 0,
            back: data.len(),
        }
    }

    /// Index of the next element `next` would yield.
    #[inline]
    pub fn position(&self) -> usize {
        self.front
    }

    /// Signed distance from `other` to `self`.
    #[inline]
    pub fn distance_from(&self, other: &Self) -> isize {
        self.front as isize - other.front as isize
    }

    /// Skip `n` elements in constant time, stopping at the end.
    #[inline]
    pub fn advance_by(&mut self, n: usize) {
        self.front = self.front.saturating_add(n).min(self.back);
    }

    /// The elements not yet yielded from either end.
    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        &self.data[self.front..self.back]
    }
}

impl<'a, T> Iterator for ColumnIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let item = &self.data[self.front];
        self.front += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.advance_by(n);
        self.next()
    }

    #[inline]
    fn count(self) -> usize {
        self.back - self.front
    }

    #[inline]
    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }
}

impl<'a, T> DoubleEndedIterator for ColumnIter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(&self.data[self.back])
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<&'a T> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
    }
}

impl<T> ExactSizeIterator for ColumnIter<'_, T> {}

impl<T> FusedIterator for ColumnIter<'_, T> {}

#[cfg(test)]
mod tests {
    use crate::column::Column;

    #[test]
    fn walks_both_ends() {
        let column = Column::from([1, 2, 3, 4]);
        let mut iter = column.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.as_slice(), &[2, 3]);
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn random_access_in_constant_steps() {
        let column: Column<u32> = (0..100).collect();
        let start = column.iter();
        let mut iter = column.iter();
        assert_eq!(iter.nth(10), Some(&10));
        iter.advance_by(20);
        assert_eq!(iter.position(), 31);
        assert_eq!(iter.distance_from(&start), 31);
        assert_eq!(start.distance_from(&iter), -31);
        assert_eq!(iter.nth_back(8), Some(&91));
        iter.advance_by(1000);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn empty_column_yields_nothing() {
        let column = Column::<f64>::new();
        assert_eq!(column.iter().count(), 0);
        assert_eq!(column.iter().last(), None);
    }
}
