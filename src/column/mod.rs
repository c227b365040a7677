//! Column containers.
//!
//! - [`Column`] holds fixed-width elements in one contiguous buffer.
//! - [`FixedStringColumn`] holds zero-padded byte strings of a common width.
//! - [`FlatBinaryColumn`] and [`InlineBinaryColumn`] hold variable-length
//!   byte strings in a shared arena.
//!
//! All of them implement [`Columnar`], so selection and projection code can
//! be written once against the trait.

mod binary;
mod fixed;
mod iter;
mod ops;
mod typed;

pub use binary::{BinaryOptions, FlatBinaryColumn, InlineBinaryColumn};
pub use fixed::{CellMap, CellOp, FixedStringColumn};
pub use iter::ColumnIter;
pub use typed::{Column, UnaryOp};

use std::cmp::Ordering;

use crate::memory::Pod;

/// Comparison operators for predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal to
    Eq,

    /// Not equal to
    Ne,

    /// Less than
    Lt,

    /// Less than or equal to
    Le,

    /// Greater than
    Gt,

    /// Greater than or equal to
    Ge,
}

impl Operator {
    /// Check whether an ordering between two values satisfies the operator.
    #[inline]
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
        }
    }

    /// The operator with its operands swapped.
    #[inline]
    pub fn flip(self) -> Operator {
        match self {
            Operator::Lt => Operator::Gt,
            Operator::Le => Operator::Ge,
            Operator::Gt => Operator::Lt,
            Operator::Ge => Operator::Le,
            other => other,
        }
    }
}

/// Operations shared by every column kind.
pub trait Columnar {
    /// What reading a row yields.
    type Value<'a>: Copy
    where
        Self: 'a;

    /// What writing a row accepts.
    type Input<'a>;

    /// Number of rows.
    fn len(&self) -> usize;

    /// Check whether the column has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn value(&self, index: usize) -> Self::Value<'_>;

    /// Read row `index`, or `None` past the end.
    fn get(&self, index: usize) -> Option<Self::Value<'_>> {
        if index < self.len() {
            Some(self.value(index))
        } else {
            None
        }
    }

    /// Overwrite row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()` or the value cannot be stored.
    fn set(&mut self, index: usize, value: Self::Input<'_>);

    /// Keep the rows whose `selector` entry is `true`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `selector.len() != len()`.
    fn filter(&self, selector: &Column<bool>) -> Self
    where
        Self: Sized;

    /// Map every row into a new typed column.
    fn transform<'a, U, F>(&'a self, mut f: F) -> Column<U>
    where
        U: Pod,
        F: FnMut(Self::Value<'a>) -> U,
    {
        let mut out = Column::<U>::alloc_len(self.len());
        for (index, slot) in out.as_mut_slice().iter_mut().enumerate() {
            *slot = f(self.value(index));
        }
        out
    }
}

impl<T: Pod> Columnar for Column<T> {
    type Value<'a> = T where Self: 'a;
    type Input<'a> = T;

    #[inline]
    fn len(&self) -> usize {
        Column::len(self)
    }

    #[inline]
    fn value(&self, index: usize) -> T {
        self[index]
    }

    #[inline]
    fn get(&self, index: usize) -> Option<T> {
        Column::get(self, index)
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        Column::set(self, index, value)
    }

    fn filter(&self, selector: &Column<bool>) -> Self {
        Column::filter(self, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::Slice;

    #[test]
    fn operator_matches_orderings() {
        assert!(Operator::Le.matches(Ordering::Equal));
        assert!(Operator::Le.matches(Ordering::Less));
        assert!(!Operator::Lt.matches(Ordering::Equal));
        assert!(Operator::Ne.matches(Ordering::Greater));
        assert_eq!(Operator::Lt.flip(), Operator::Gt);
        assert_eq!(Operator::Eq.flip(), Operator::Eq);
    }

    #[test]
    fn every_string_column_filters_the_same_way() {
        let values = ["AIR", "MAIL", "REG AIR", "SHIP"];
        let selector = Column::from([false, true, true, false]);

        let mut flat = FlatBinaryColumn::new();
        flat.build_strings(&values).unwrap();
        let mut inline = InlineBinaryColumn::new();
        inline.build_strings(&values).unwrap();
        let mut fixed = FixedStringColumn::new(8);
        for v in values {
            fixed.push(Slice::from(v));
        }

        let expected = [4usize, 7];
        let flat_lens = Columnar::filter(&flat, &selector).transform(|v| v.len());
        let inline_lens = Columnar::filter(&inline, &selector).transform(|v| v.len());
        let fixed_lens = Columnar::filter(&fixed, &selector).transform(|v| v.len());
        assert_eq!(flat_lens.as_slice(), &expected);
        assert_eq!(inline_lens.as_slice(), &expected);
        assert_eq!(fixed_lens.as_slice(), &expected);
    }

    #[test]
    fn typed_column_through_the_trait() {
        fn first<C: Columnar>(column: &C) -> Option<C::Value<'_>> {
            column.get(0)
        }

        let mut column = Column::from([3u16, 4]);
        Columnar::set(&mut column, 1, 9);
        assert_eq!(first(&column), Some(3));
        assert_eq!(Columnar::value(&column, 1), 9);
        assert!(first(&Column::<u16>::new()).is_none());

        let doubled = Columnar::transform(&column, |v| u32::from(v) * 2);
        assert_eq!(doubled.as_slice(), &[6, 18]);
    }
}
