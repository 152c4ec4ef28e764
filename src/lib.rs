//! # Order Index
//!
//! Bounded AVL order index with capacity-based eviction.
//!
//! ## Architecture
//!
//! The crate consists of:
//! - **Types**: Core data structures (OrderRecord)
//! - **Index**: Height-balanced order tree with slab-based node storage
//! - **Error**: Configuration and uniqueness errors
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical insertion sequences produce identical trees
//!    and identical state digests
//! 2. **Synchronous Execution**: No async, no I/O, no logging in the hot path
//! 3. **Pre-allocated Memory**: Slab allocation for node storage
//! 4. **Bounded Footprint**: Optional record cap enforced by evicting the
//!    minimum-id record after each overflowing insert
//!
//! ## Guarantees
//!
//! After every completed insertion:
//! - Left-subtree ids are strictly less than a node's id, right-subtree ids
//!   greater or equal (ties go right)
//! - Every node's left/right height difference is in {-1, 0, 1}
//! - With a bound of N, at most N records are held

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: OrderRecord
pub mod types;

/// Order index: bounded AVL tree with slab-based storage
pub mod index;

/// Error types: capacity and uniqueness failures
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use error::{IndexError, Result};
pub use index::{AvlNode, IndexConfig, OrderIndex};
pub use types::OrderRecord;
