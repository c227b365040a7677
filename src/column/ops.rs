//! Elementwise arithmetic and comparison on typed columns.
//!
//! Binary operators on two columns require equal lengths and panic
//! otherwise; the `checked_*` and `try_compare` forms return
//! [`Error::LengthMismatch`] instead. Every result is a fresh column.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::typed::length_mismatch;
use super::{Column, Operator};
use crate::error::{Error, Result};
use crate::memory::{allocation_failure, Pod};
use crate::types::{Numeric, Primitive};

impl<T: Pod> Column<T> {
    /// Combine two equal-length columns element by element.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    #[track_caller]
    pub fn zip_with<U, F>(&self, rhs: &Column<T>, f: F) -> Column<U>
    where
        U: Pod,
        F: FnMut(T, T) -> U,
    {
        match self.try_zip_with(rhs, f) {
            Ok(out) => out,
            Err(Error::LengthMismatch { expected, actual }) => length_mismatch(expected, actual),
            Err(err) => allocation_failure::<U>(err),
        }
    }

    /// Combine two equal-length columns element by element.
    pub fn try_zip_with<U, F>(&self, rhs: &Column<T>, mut f: F) -> Result<Column<U>>
    where
        U: Pod,
        F: FnMut(T, T) -> U,
    {
        if self.len() != rhs.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: rhs.len(),
            });
        }
        let mut out = Column::try_with_len(self.len())?;
        for ((dst, &a), &b) in out
            .as_mut_slice()
            .iter_mut()
            .zip(self.as_slice())
            .zip(rhs.as_slice())
        {
            *dst = f(a, b);
        }
        Ok(out)
    }

    #[track_caller]
    fn zip_assign<F>(&mut self, rhs: &Column<T>, mut f: F)
    where
        F: FnMut(T, T) -> T,
    {
        if self.len() != rhs.len() {
            length_mismatch(self.len(), rhs.len());
        }
        for (dst, &b) in self.as_mut_slice().iter_mut().zip(rhs.as_slice()) {
            *dst = f(*dst, b);
        }
    }
}

impl<T: Numeric> Column<T> {
    /// Elementwise `self + rhs`, or an error if the lengths differ.
    pub fn checked_add(&self, rhs: &Column<T>) -> Result<Column<T>> {
        self.try_zip_with(rhs, <T as Numeric>::add)
    }

    /// Elementwise `self - rhs`, or an error if the lengths differ.
    pub fn checked_sub(&self, rhs: &Column<T>) -> Result<Column<T>> {
        self.try_zip_with(rhs, <T as Numeric>::sub)
    }

    /// Elementwise `self * rhs`, or an error if the lengths differ.
    pub fn checked_mul(&self, rhs: &Column<T>) -> Result<Column<T>> {
        self.try_zip_with(rhs, <T as Numeric>::mul)
    }

    /// Elementwise `self / rhs`, or an error if the lengths differ.
    pub fn checked_div(&self, rhs: &Column<T>) -> Result<Column<T>> {
        self.try_zip_with(rhs, <T as Numeric>::div)
    }
}

macro_rules! arithmetic {
    ($Op:ident, $op:ident, $OpAssign:ident, $op_assign:ident) => {
        impl<'a, 'b, T: Numeric> $Op<&'b Column<T>> for &'a Column<T> {
            type Output = Column<T>;

            #[track_caller]
            fn $op(self, rhs: &'b Column<T>) -> Column<T> {
                self.zip_with(rhs, <T as Numeric>::$op)
            }
        }

        impl<T: Numeric> $Op<&Column<T>> for Column<T> {
            type Output = Column<T>;

            #[track_caller]
            fn $op(mut self, rhs: &Column<T>) -> Column<T> {
                self.zip_assign(rhs, <T as Numeric>::$op);
                self
            }
        }

        impl<T: Numeric> $Op<Column<T>> for Column<T> {
            type Output = Column<T>;

            #[track_caller]
            fn $op(mut self, rhs: Column<T>) -> Column<T> {
                self.zip_assign(&rhs, <T as Numeric>::$op);
                self
            }
        }

        impl<T: Numeric> $Op<T> for &Column<T> {
            type Output = Column<T>;

            fn $op(self, rhs: T) -> Column<T> {
                self.transform(|a| <T as Numeric>::$op(a, rhs))
            }
        }

        impl<T: Numeric> $Op<T> for Column<T> {
            type Output = Column<T>;

            fn $op(mut self, rhs: T) -> Column<T> {
                self.apply(|a| <T as Numeric>::$op(a, rhs));
                self
            }
        }

        impl<T: Numeric> $OpAssign<&Column<T>> for Column<T> {
            #[track_caller]
            fn $op_assign(&mut self, rhs: &Column<T>) {
                self.zip_assign(rhs, <T as Numeric>::$op);
            }
        }

        impl<T: Numeric> $OpAssign<T> for Column<T> {
            fn $op_assign(&mut self, rhs: T) {
                self.apply(|a| <T as Numeric>::$op(a, rhs));
            }
        }
    };
}

arithmetic!(Add, add, AddAssign, add_assign);
arithmetic!(Sub, sub, SubAssign, sub_assign);
arithmetic!(Mul, mul, MulAssign, mul_assign);
arithmetic!(Div, div, DivAssign, div_assign);

impl<T: Numeric> Neg for &Column<T> {
    type Output = Column<T>;

    fn neg(self) -> Column<T> {
        self.transform(<T as Numeric>::neg)
    }
}

impl<T: Numeric> Neg for Column<T> {
    type Output = Column<T>;

    fn neg(mut self) -> Column<T> {
        self.apply(<T as Numeric>::neg);
        self
    }
}

impl<T: Primitive> Column<T> {
    /// Compare two equal-length columns element by element.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    #[track_caller]
    pub fn compare(&self, op: Operator, rhs: &Column<T>) -> Column<bool> {
        match self.try_compare(op, rhs) {
            Ok(mask) => mask,
            Err(Error::LengthMismatch { expected, actual }) => length_mismatch(expected, actual),
            Err(err) => allocation_failure::<bool>(err),
        }
    }

    /// Compare two equal-length columns element by element.
    pub fn try_compare(&self, op: Operator, rhs: &Column<T>) -> Result<Column<bool>> {
        // One monomorphized loop per operator keeps the branch out of the body.
        match op {
            Operator::Eq => self.try_zip_with(rhs, |a, b| a == b),
            Operator::Ne => self.try_zip_with(rhs, |a, b| a != b),
            Operator::Lt => self.try_zip_with(rhs, |a, b| a < b),
            Operator::Le => self.try_zip_with(rhs, |a, b| a <= b),
            Operator::Gt => self.try_zip_with(rhs, |a, b| a > b),
            Operator::Ge => self.try_zip_with(rhs, |a, b| a >= b),
        }
    }

    /// Compare every element against one value.
    pub fn compare_scalar(&self, op: Operator, value: T) -> Column<bool> {
        match op {
            Operator::Eq => self.transform(|a| a == value),
            Operator::Ne => self.transform(|a| a != value),
            Operator::Lt => self.transform(|a| a < value),
            Operator::Le => self.transform(|a| a <= value),
            Operator::Gt => self.transform(|a| a > value),
            Operator::Ge => self.transform(|a| a >= value),
        }
    }

    /// Compare one value against every element, `value op self[i]`.
    pub fn scalar_compare(&self, value: T, op: Operator) -> Column<bool> {
        self.compare_scalar(op.flip(), value)
    }

    /// Elementwise `self == rhs`.
    #[track_caller]
    pub fn eq_mask(&self, rhs: &Column<T>) -> Column<bool> {
        self.compare(Operator::Eq, rhs)
    }

    /// Elementwise `self != rhs`.
    #[track_caller]
    pub fn ne_mask(&self, rhs: &Column<T>) -> Column<bool> {
        self.compare(Operator::Ne, rhs)
    }

    /// Elementwise `self < rhs`.
    #[track_caller]
    pub fn lt_mask(&self, rhs: &Column<T>) -> Column<bool> {
        self.compare(Operator::Lt, rhs)
    }

    /// Elementwise `self <= rhs`.
    #[track_caller]
    pub fn le_mask(&self, rhs: &Column<T>) -> Column<bool> {
        self.compare(Operator::Le, rhs)
    }

    /// Elementwise `self > rhs`.
    #[track_caller]
    pub fn gt_mask(&self, rhs: &Column<T>) -> Column<bool> {
        self.compare(Operator::Gt, rhs)
    }

    /// Elementwise `self >= rhs`.
    #[track_caller]
    pub fn ge_mask(&self, rhs: &Column<T>) -> Column<bool> {
        self.compare(Operator::Ge, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_on_columns() {
        let a = Column::from([1, 2, 3]);
        let b = Column::from([10, 20, 30]);
        assert_eq!((&a + &b).as_slice(), &[11, 22, 33]);
        assert_eq!((&b - &a).as_slice(), &[9, 18, 27]);
        assert_eq!((&a * &b).as_slice(), &[10, 40, 90]);
        assert_eq!((&b / &a).as_slice(), &[10, 10, 10]);
        assert_eq!((-&a).as_slice(), &[-1, -2, -3]);
        // Operands are untouched.
        assert_eq!(a.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn scalar_broadcast() {
        let a = Column::from([1.0f64, 2.0, 4.0]);
        assert_eq!((&a * 0.5).as_slice(), &[0.5, 1.0, 2.0]);
        assert_eq!((a.clone() + 1.0).as_slice(), &[2.0, 3.0, 5.0]);

        let mut b = a;
        b -= 1.0;
        b /= 2.0;
        assert_eq!(b.as_slice(), &[0.0, 0.5, 1.5]);
    }

    #[test]
    fn compound_assignment() {
        let mut a = Column::from([5i64, 6, 7]);
        let b = Column::from([1i64, 1, 1]);
        a += &b;
        a *= &b;
        assert_eq!(a.as_slice(), &[6, 7, 8]);
    }

    #[test]
    fn scalar_on_the_left() {
        let a = Column::from([1i32, 5, 9]);
        assert_eq!(a.scalar_compare(5, Operator::Lt).as_slice(), &[false, false, true]);
        assert_eq!(a.scalar_compare(5, Operator::Ge).as_slice(), &[true, true, false]);
        assert_eq!(a.scalar_compare(5, Operator::Ne), a.compare_scalar(Operator::Ne, 5));
    }

    #[test]
    fn integer_overflow_wraps() {
        let a = Column::from([i32::MAX, i32::MIN]);
        let b = Column::from([1, -1]);
        assert_eq!((&a + &b).as_slice(), &[i32::MIN, i32::MAX]);
        assert_eq!((-a).as_slice(), &[-i32::MAX, i32::MIN]);
    }

    #[test]
    fn float_division_follows_ieee() {
        let a = Column::from([1.0f32, -1.0, 0.0]);
        let zero = Column::from([0.0f32, 0.0, 0.0]);
        let q = &a / &zero;
        assert_eq!(q[0], f32::INFINITY);
        assert_eq!(q[1], f32::NEG_INFINITY);
        assert!(q[2].is_nan());
    }

    #[test]
    fn checked_forms_report_mismatch() {
        let a = Column::from([1u32, 2]);
        let b = Column::from([1u32]);
        assert_eq!(
            a.checked_add(&b).unwrap_err(),
            Error::LengthMismatch { expected: 2, actual: 1 }
        );
        assert_eq!(a.checked_mul(&a).unwrap().as_slice(), &[1, 4]);
    }

    #[test]
    #[should_panic(expected = "column length mismatch")]
    fn operators_panic_on_mismatch() {
        let a = Column::from([1u32, 2]);
        let b = Column::from([1u32]);
        let _ = &a + &b;
    }

    #[test]
    fn comparisons_produce_masks() {
        let a = Column::from([1, 5, 3, 7]);
        let b = Column::from([2, 5, 1, 9]);
        assert_eq!(a.lt_mask(&b).as_slice(), &[true, false, false, true]);
        assert_eq!(a.le_mask(&b).as_slice(), &[true, true, false, true]);
        assert_eq!(a.gt_mask(&b).as_slice(), &[false, false, true, false]);
        assert_eq!(a.ge_mask(&b).as_slice(), &[false, true, true, false]);
        assert_eq!(a.eq_mask(&b).as_slice(), &[false, true, false, false]);
        assert_eq!(a.ne_mask(&b).as_slice(), &[true, false, true, true]);
    }

    #[test]
    fn scalar_comparison_feeds_filter() {
        let prices = Column::from([9.5f64, 20.0, 3.25, 40.0]);
        let mask = prices.compare_scalar(Operator::Ge, 10.0);
        assert_eq!(prices.filter(&mask).as_slice(), &[20.0, 40.0]);
    }

    #[test]
    fn nan_compares_false() {
        let a = Column::from([f64::NAN]);
        assert_eq!(a.eq_mask(&a).as_slice(), &[false]);
        assert_eq!(a.ne_mask(&a).as_slice(), &[true]);
    }
}
