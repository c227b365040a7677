//! Allocation and build metrics for columns.
//!
//! Counters are process-wide and updated with relaxed atomics, so they are
//! approximate under concurrent use but never block the data path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Operation types for metrics tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Allocate a fresh backing buffer.
    Allocate,

    /// Grow an existing backing buffer.
    Reallocate,

    /// Release a backing buffer.
    Free,

    /// Bulk-load a string column.
    Build,

    /// Compact a column through a selection mask.
    Filter,

    /// An allocation request the allocator refused.
    AllocationFailure,
}

/// Column memory statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    /// Total number of fresh allocations.
    pub alloc_count: u64,

    /// Total number of reallocations.
    pub realloc_count: u64,

    /// Total number of released buffers.
    pub free_count: u64,

    /// Total number of refused allocation requests.
    pub failed_alloc_count: u64,

    /// Total bytes requested from the allocator (including growth).
    pub bytes_allocated: u64,

    /// Total bytes handed back to the allocator.
    pub bytes_freed: u64,

    /// Total number of string column builds.
    pub build_count: u64,

    /// Total number of selection operations.
    pub filter_count: u64,

    /// Total rows loaded by string column builds.
    pub rows_built: u64,

    /// Total rows scanned by selections.
    pub rows_filtered: u64,

    /// Average string column build time in microseconds.
    pub avg_build_time_us: u64,

    /// Average selection time in microseconds.
    pub avg_filter_time_us: u64,
}

static ALLOC_COUNT: AtomicU64 = AtomicU64::new(0);
static REALLOC_COUNT: AtomicU64 = AtomicU64::new(0);
static FREE_COUNT: AtomicU64 = AtomicU64::new(0);
static FAILED_ALLOC_COUNT: AtomicU64 = AtomicU64::new(0);
static BYTES_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static BYTES_FREED: AtomicU64 = AtomicU64::new(0);
static BUILD_COUNT: AtomicU64 = AtomicU64::new(0);
static FILTER_COUNT: AtomicU64 = AtomicU64::new(0);
static ROWS_BUILT: AtomicU64 = AtomicU64::new(0);
static ROWS_FILTERED: AtomicU64 = AtomicU64::new(0);
static TOTAL_BUILD_TIME_US: AtomicU64 = AtomicU64::new(0);
static TOTAL_FILTER_TIME_US: AtomicU64 = AtomicU64::new(0);

/// Record a column operation for metrics tracking.
///
/// # Arguments
///
/// * `op` - The operation type.
/// * `size` - The number of bytes (allocations) or rows (builds, filters) involved.
/// * `duration` - The duration of the operation.
#[inline]
pub fn record_operation(op: Operation, size: usize, duration: Duration) {
    let duration_us = duration.as_micros() as u64;

    match op {
        Operation::Allocate => {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
            BYTES_ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
        }
        Operation::Reallocate => {
            REALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
            BYTES_ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
        }
        Operation::Free => {
            FREE_COUNT.fetch_add(1, Ordering::Relaxed);
            BYTES_FREED.fetch_add(size as u64, Ordering::Relaxed);
        }
        Operation::AllocationFailure => {
            FAILED_ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        Operation::Build => {
            BUILD_COUNT.fetch_add(1, Ordering::Relaxed);
            ROWS_BUILT.fetch_add(size as u64, Ordering::Relaxed);
            TOTAL_BUILD_TIME_US.fetch_add(duration_us, Ordering::Relaxed);
        }
        Operation::Filter => {
            FILTER_COUNT.fetch_add(1, Ordering::Relaxed);
            ROWS_FILTERED.fetch_add(size as u64, Ordering::Relaxed);
            TOTAL_FILTER_TIME_US.fetch_add(duration_us, Ordering::Relaxed);
        }
    }
}

/// Get the current column memory statistics.
#[inline]
pub fn get_stats() -> MemoryStats {
    let build_count = BUILD_COUNT.load(Ordering::Relaxed);
    let filter_count = FILTER_COUNT.load(Ordering::Relaxed);

    let avg_build_time_us = if build_count > 0 {
        TOTAL_BUILD_TIME_US.load(Ordering::Relaxed) / build_count
    } else {
        0
    };

    let avg_filter_time_us = if filter_count > 0 {
        TOTAL_FILTER_TIME_US.load(Ordering::Relaxed) / filter_count
    } else {
        0
    };

    MemoryStats {
        alloc_count: ALLOC_COUNT.load(Ordering::Relaxed),
        realloc_count: REALLOC_COUNT.load(Ordering::Relaxed),
        free_count: FREE_COUNT.load(Ordering::Relaxed),
        failed_alloc_count: FAILED_ALLOC_COUNT.load(Ordering::Relaxed),
        bytes_allocated: BYTES_ALLOCATED.load(Ordering::Relaxed),
        bytes_freed: BYTES_FREED.load(Ordering::Relaxed),
        build_count,
        filter_count,
        rows_built: ROWS_BUILT.load(Ordering::Relaxed),
        rows_filtered: ROWS_FILTERED.load(Ordering::Relaxed),
        avg_build_time_us,
        avg_filter_time_us,
    }
}

/// Reset all column statistics.
#[inline]
pub fn reset_stats() {
    ALLOC_COUNT.store(0, Ordering::Relaxed);
    REALLOC_COUNT.store(0, Ordering::Relaxed);
    FREE_COUNT.store(0, Ordering::Relaxed);
    FAILED_ALLOC_COUNT.store(0, Ordering::Relaxed);
    BYTES_ALLOCATED.store(0, Ordering::Relaxed);
    BYTES_FREED.store(0, Ordering::Relaxed);
    BUILD_COUNT.store(0, Ordering::Relaxed);
    FILTER_COUNT.store(0, Ordering::Relaxed);
    ROWS_BUILT.store(0, Ordering::Relaxed);
    ROWS_FILTERED.store(0, Ordering::Relaxed);
    TOTAL_BUILD_TIME_US.store(0, Ordering::Relaxed);
    TOTAL_FILTER_TIME_US.store(0, Ordering::Relaxed);
}

/// Measure the duration of an operation and record it.
///
/// # Arguments
///
/// * `op` - The operation type.
/// * `size` - The number of bytes (allocations) or rows (builds, filters) involved.
/// * `f` - The function to measure.
///
/// # Returns
///
/// The result of the function.
#[inline]
pub fn measure<F, T>(op: Operation, size: usize, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();

    record_operation(op, size, duration);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are global and other tests allocate concurrently, so only
    // monotonic growth is asserted here.
    #[test]
    fn measure_records_builds() {
        let before = get_stats();
        let value = measure(Operation::Build, 7, || 42);
        let after = get_stats();

        assert_eq!(value, 42);
        assert!(after.build_count >= before.build_count + 1);
        assert!(after.rows_built >= before.rows_built + 7);
    }

    #[test]
    fn allocations_accumulate_bytes() {
        let before = get_stats();
        record_operation(Operation::Allocate, 128, Duration::ZERO);
        let after = get_stats();

        assert!(after.alloc_count > before.alloc_count);
        assert!(after.bytes_allocated >= before.bytes_allocated + 128);
    }
}
