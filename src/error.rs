//! Error types for the order index.
//!
//! The index performs no input validation of its own: searching an empty tree
//! returns `None`, not an error, and record contents are never inspected. The
//! only failure modes are a misconfigured capacity at construction time and,
//! when uniqueness is enforced, inserting an id that already exists.

use thiserror::Error;

/// Result type alias using IndexError.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur in order index operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// `max_orders` was configured as zero. The insert-then-evict algorithm
    /// assumes at least one record can exist before eviction triggers.
    #[error("max_orders must be at least 1")]
    InvalidCapacity,

    /// An insert supplied an order id that is already present while the index
    /// is configured to enforce unique ids.
    #[error("duplicate order id: {0}")]
    DuplicateOrderId(u64),
}
