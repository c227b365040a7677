//! # VecBase
//!
//! `vecbase` provides the value containers of a vectorized query engine:
//! typed columns that map one-to-one onto contiguous buffers, and string
//! columns built for fast equality and ordering on byte strings.
//!
//! ## Features
//!
//! - [`Column<T>`] over primitive types, with elementwise arithmetic,
//!   comparison masks, branchless selection and sorting
//! - [`Slice`] and [`SliceInline`] byte views with `memcmp` ordering;
//!   `SliceInline` keeps payloads of up to 12 bytes inline and a 4-byte prefix
//!   for longer ones
//! - [`FlatBinaryColumn`] and [`InlineBinaryColumn`] string columns whose
//!   payloads are copied into a column-owned arena
//! - [`FixedStringColumn`] for zero-padded fixed-width strings
//! - Allocation failure reported as [`Error::AllocationFailed`] instead of
//!   unwinding, through the `try_*` constructors and methods
//! - Optional SSE2 equality kernel behind the `simd` feature
//!
//! ## Example
//!
//! ```
//! use vecbase::{Column, FlatBinaryColumn, Operator, Slice};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let modes = FlatBinaryColumn::from_strings(&["TRUCK", "AIR", "RAIL", "AIR"])?;
//! let prices = Column::from([120.0f64, 480.0, 95.5, 512.0]);
//!
//! // Select the prices of every row shipped by air.
//! let by_air = modes.compare_scalar(Operator::Eq, Slice::from("AIR"));
//! let selected = prices.filter(&by_air);
//!
//! assert_eq!(selected.as_slice(), &[480.0, 512.0]);
//! # Ok(())
//! # }
//! ```

pub mod column;
pub mod error;
pub mod memory;
pub mod slice;
pub mod types;
pub mod utils;

pub use column::{
    BinaryOptions, CellMap, CellOp, Column, ColumnIter, Columnar, FixedStringColumn,
    FlatBinaryColumn, InlineBinaryColumn, Operator, UnaryOp,
};
pub use error::{Error, Result};
pub use memory::{Pod, RawBuffer};
pub use slice::{memcompare, memequal, Slice, SliceInline};
pub use types::{Numeric, Primitive, PrimitiveType, TypeDescriptor, TypeRegistry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if the SIMD equality kernel is compiled in.
#[inline]
pub fn has_simd_support() -> bool {
    cfg!(all(feature = "simd", target_arch = "x86_64"))
}
