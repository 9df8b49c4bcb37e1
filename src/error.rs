use std::alloc::Layout;
use std::error;
use std::fmt;

/// Errors reported by the maps in this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A key appeared twice in the entries of a [`FixedMap`](crate::FixedMap).
    DuplicateKey,
    /// The key is not present in the map.
    KeyNotFound,
    /// The requested capacity does not fit the table's index type or the
    /// address space.
    CapacityOverflow,
    /// The allocator refused to provide memory for the table.
    AllocError {
        /// The layout of the refused allocation.
        layout: Layout,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::DuplicateKey => f.write_str("duplicate keys are not allowed"),
            Error::KeyNotFound => f.write_str("key not found"),
            Error::CapacityOverflow => f.write_str("capacity overflow"),
            Error::AllocError { layout } => write!(
                f,
                "memory allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl error::Error for Error {}
