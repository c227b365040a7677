//! Utility functions shared by the column implementations.

pub mod alignment;
pub mod metrics;

pub use alignment::{align_up, is_aligned, cache_line_size};
pub use metrics::{MemoryStats, Operation, record_operation, get_stats, reset_stats};
