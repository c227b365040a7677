//! Error handling for column operations.
//!
//! Most precondition violations (out-of-bounds indexing, mismatched operand
//! lengths) panic, the same way slice indexing does. The `try_*` and
//! `checked_*` methods report the same conditions through [`Error`] instead.

use std::fmt;
use std::result;

/// A specialized `Result` type for column operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while building or operating on columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocator returned null for a request of `bytes` bytes.
    AllocationFailed {
        /// Size of the failed request.
        bytes: usize,
    },

    /// The requested capacity does not fit in the address space, or an arena
    /// grew past what its offsets can address.
    CapacityOverflow,

    /// Two operands of an elementwise operation differ in length.
    LengthMismatch {
        /// Length of the left-hand operand.
        expected: usize,
        /// Length of the right-hand operand.
        actual: usize,
    },

    /// An index is past the end of the column.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the column.
        len: usize,
    },

    /// A value does not fit in a fixed-width cell.
    ValueTooWide {
        /// Cell width of the column.
        width: usize,
        /// Length of the rejected value.
        len: usize,
    },

    /// Invalid argument provided.
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AllocationFailed { bytes } => write!(f, "Failed to allocate {} bytes", bytes),
            Error::CapacityOverflow => write!(f, "Requested capacity overflows the addressable range"),
            Error::LengthMismatch { expected, actual } => {
                write!(f, "Column length mismatch: expected {}, got {}", expected, actual)
            }
            Error::IndexOutOfBounds { index, len } => {
                write!(f, "Index {} out of bounds for column of length {}", index, len)
            }
            Error::ValueTooWide { width, len } => {
                write!(f, "Value of {} bytes does not fit in a {}-byte cell", len, width)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
