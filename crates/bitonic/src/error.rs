//! Errors reported by [`crate::try_sort`].

use std::fmt;

/// Input rejected before any lane is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortError {
    /// More elements than `MAX_REGISTERS` registers can hold.
    CapacityExceeded { len: usize, capacity: usize },

    /// The element at `index` does not survive a left shift by `bits` index
    /// bits. Sort with [`crate::Tagging::Disabled`] instead.
    TagWidthExceeded { index: usize, bits: u32 },
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::CapacityExceeded { len, capacity } => {
                write!(f, "{} elements exceed the capacity of {}", len, capacity)
            }
            SortError::TagWidthExceeded { index, bits } => {
                write!(
                    f,
                    "element {} is outside the value range left by {} tag bits",
                    index, bits
                )
            }
        }
    }
}

impl std::error::Error for SortError {}
