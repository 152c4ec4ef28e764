//! Tree node for slab-based storage.
//!
//! ## Design
//!
//! `AvlNode` wraps an `OrderRecord` with child links and a cached subtree
//! height. The links are slab keys (`usize`), not direct references: all
//! nodes live in one `Slab` owned by the index, and the link graph is
//! strictly tree-shaped: every key is referenced by exactly one parent slot
//! or by the index's root slot.
//!
//! ## Slab Integration
//!
//! Per official slab docs (https://docs.rs/slab/0.4.11):
//! - Keys are `usize` values returned by `slab.insert()`
//! - Keys may be reused after `slab.remove()`
//! - O(1) insert, remove, and lookup
//!
//! ## Height Caching
//!
//! `height` is a derived field written eagerly: every mutating operation that
//! touches a node recomputes it from the children before returning, so at
//! rest `height == 1 + max(height(left), height(right))` holds everywhere
//! (an absent child counts as height 0).

use crate::types::OrderRecord;

/// Tree node stored in the slab.
///
/// Contains the order record plus the left/right subtree links and the
/// cached height used by the balancing logic.
#[derive(Debug, Clone)]
pub struct AvlNode {
    /// The order record this node holds
    pub record: OrderRecord,

    /// Left subtree (slab key); keys there are strictly less than `record.id`
    pub left: Option<usize>,

    /// Right subtree (slab key); keys there are greater than or equal to
    /// `record.id` (ties are routed right)
    pub right: Option<usize>,

    /// Cached subtree height; 1 for a leaf
    pub height: u32,
}

impl AvlNode {
    /// Create a new leaf node (not yet linked)
    ///
    /// # Example
    ///
    /// ```
    /// use order_index::{AvlNode, OrderRecord};
    ///
    /// let node = AvlNode::new(OrderRecord::new(1, "Avery Quinn"));
    ///
    /// assert!(node.left.is_none());
    /// assert!(node.right.is_none());
    /// assert_eq!(node.height, 1);
    /// ```
    #[inline]
    pub fn new(record: OrderRecord) -> Self {
        Self {
            record,
            left: None,
            right: None,
            height: 1,
        }
    }

    /// Get the order id (the comparison key)
    #[inline]
    pub fn id(&self) -> u64 {
        self.record.id
    }

    /// Check if this node has no children
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_new() {
        let record = OrderRecord::new(42, "Mina Park");
        let node = AvlNode::new(record.clone());

        assert_eq!(node.record, record);
        assert!(node.left.is_none());
        assert!(node.right.is_none());
        assert_eq!(node.height, 1);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_node_id() {
        let node = AvlNode::new(OrderRecord::new(7, "Noor Haddad"));

        assert_eq!(node.id(), 7);
    }

    #[test]
    fn test_node_linking() {
        let mut node = AvlNode::new(OrderRecord::new(10, "Kai"));
        assert!(node.is_leaf());

        node.left = Some(3);
        assert!(!node.is_leaf());

        node.right = Some(8);
        node.left = None;
        assert!(!node.is_leaf());
    }
}
