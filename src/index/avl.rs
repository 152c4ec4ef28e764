//! Bounded AVL order index implementation.
//!
//! ## Architecture
//!
//! The index keeps order records in a height-balanced binary search tree:
//!
//! - **Slab**: Pre-allocated node storage, linked by slab key
//! - **AVL balancing**: Four-case rotation on the insert unwind
//! - **Capacity eviction**: When a configured bound is exceeded, the
//!   minimum-id record is spliced out and the leftmost spine is rebalanced
//!
//! ## Key Ordering
//!
//! Left-subtree ids are strictly less than a node's id; right-subtree ids
//! are greater than or equal (equal ids accumulate on the right side).
//!
//! ## Memory Model
//!
//! Per slab docs (https://docs.rs/slab/0.4.11):
//! - `Slab::with_capacity(n)` pre-allocates n slots
//! - Keys are reused after removal
//! - O(1) insert, remove, and lookup
//!
//! ## Example
//!
//! ```
//! use order_index::{OrderIndex, OrderRecord};
//!
//! let mut index = OrderIndex::bounded(3).unwrap();
//!
//! for id in [10, 20, 30] {
//!     index.insert(OrderRecord::new(id, "Avery Quinn")).unwrap();
//! }
//! let evicted = index.insert(OrderRecord::new(40, "Mina Park")).unwrap();
//!
//! // The oldest (minimum-id) record made room for the new one.
//! assert_eq!(evicted.unwrap().id, 10);
//! assert_eq!(index.len(), 3);
//! assert!(index.search(10).is_none());
//! ```

use std::cmp::Ordering;

use sha2::{Digest, Sha256};
use slab::Slab;

use crate::error::{IndexError, Result};
use crate::index::{AvlNode, IndexConfig};
use crate::types::OrderRecord;

/// Bounded AVL order index.
///
/// A height-balanced binary search tree keyed by order id, with an optional
/// cap on total record count enforced by evicting the minimum-id record after
/// each insertion that overflows the cap.
///
/// Single-threaded and synchronous: every operation runs to
/// completion on the caller's thread with no I/O. Recursion depth is
/// logarithmic in the record count thanks to the balance invariant.
#[derive(Debug)]
pub struct OrderIndex {
    /// Pre-allocated node storage
    /// Key: slab index, Value: AvlNode
    nodes: Slab<AvlNode>,

    /// Root of the tree (slab key), None when empty
    root: Option<usize>,

    /// Total number of records, maintained incrementally
    len: usize,

    /// Next order id (for auto-assignment when a record arrives with id 0)
    next_order_id: u64,

    /// Validated construction-time configuration
    config: IndexConfig,
}

impl Default for OrderIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderIndex {
    /// Create a new empty, unbounded index
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
            len: 0,
            next_order_id: 1,
            config: IndexConfig::default(),
        }
    }

    /// Create an unbounded index with pre-allocated node storage
    ///
    /// # Example
    ///
    /// ```
    /// use order_index::OrderIndex;
    ///
    /// let index = OrderIndex::with_capacity(10_000);
    /// assert!(index.capacity() >= 10_000);
    /// ```
    pub fn with_capacity(node_capacity: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(node_capacity),
            root: None,
            len: 0,
            next_order_id: 1,
            config: IndexConfig {
                preallocate: node_capacity,
                ..IndexConfig::default()
            },
        }
    }

    /// Create a capacity-bounded index
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidCapacity`] when `max_orders` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use order_index::OrderIndex;
    ///
    /// assert!(OrderIndex::bounded(5).is_ok());
    /// assert!(OrderIndex::bounded(0).is_err());
    /// ```
    pub fn bounded(max_orders: usize) -> Result<Self> {
        Self::with_config(IndexConfig::bounded(max_orders))
    }

    /// Create an index from a full configuration
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidCapacity`] when the configuration names a
    /// zero capacity.
    pub fn with_config(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nodes: Slab::with_capacity(config.preallocate),
            root: None,
            len: 0,
            next_order_id: 1,
            config,
        })
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Get the current pre-allocated slab capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Get the total number of records in the index
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the configured record bound, if any
    #[inline]
    pub fn max_orders(&self) -> Option<usize> {
        self.config.max_orders
    }

    /// Get the active configuration
    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Get the tree height (0 when empty, 1 for a single record)
    #[inline]
    pub fn height(&self) -> u32 {
        self.link_height(self.root)
    }

    // ========================================================================
    // Record Management
    // ========================================================================

    /// Insert a record, evicting the minimum-id record if the configured
    /// bound is exceeded.
    ///
    /// A record with `id == 0` is assigned the next id from the index's
    /// counter. The tree is rebalanced on the unwind of the insertion descent
    /// and again along the leftmost spine if an eviction fires, so the AVL
    /// invariant holds when this returns.
    ///
    /// # Returns
    ///
    /// `Ok(Some(record))` with the evicted record when the capacity bound
    /// fired, `Ok(None)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateOrderId`] when the index is configured
    /// with `allow_duplicate_ids = false` and the id is already present. The
    /// tree is left untouched in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use order_index::{OrderIndex, OrderRecord};
    ///
    /// let mut index = OrderIndex::new();
    /// index.insert(OrderRecord::new(42, "Avery Quinn")).unwrap();
    ///
    /// assert_eq!(index.len(), 1);
    /// assert!(index.search(42).is_some());
    /// ```
    pub fn insert(&mut self, mut record: OrderRecord) -> Result<Option<OrderRecord>> {
        // Auto-assign order id if not set
        if record.id == 0 {
            record.id = self.next_order_id;
            self.next_order_id += 1;
        }

        if !self.config.allow_duplicate_ids && self.contains(record.id) {
            return Err(IndexError::DuplicateOrderId(record.id));
        }

        let id = record.id;
        let key = self.nodes.insert(AvlNode::new(record));
        self.root = Some(self.insert_link(self.root, key, id));
        self.len += 1;

        // Capacity check runs once, at the outermost frame, after the
        // insertion unwind has fully rebalanced the tree.
        if let Some(max_orders) = self.config.max_orders {
            if self.len > max_orders {
                return Ok(Some(self.evict_oldest()));
            }
        }

        Ok(None)
    }

    /// Search for a record by order id.
    ///
    /// Standard BST descent, O(log n) guaranteed by the balance invariant.
    /// When duplicate ids are present, returns the first match on the descent
    /// path.
    ///
    /// # Example
    ///
    /// ```
    /// use order_index::{OrderIndex, OrderRecord};
    ///
    /// let mut index = OrderIndex::new();
    /// index.insert(OrderRecord::new(42, "Avery Quinn")).unwrap();
    ///
    /// assert_eq!(index.search(42).unwrap().customer, "Avery Quinn");
    /// assert!(index.search(99).is_none());
    /// ```
    pub fn search(&self, id: u64) -> Option<&OrderRecord> {
        let mut link = self.root;
        while let Some(key) = link {
            let node = &self.nodes[key];
            link = match id.cmp(&node.record.id) {
                Ordering::Equal => return Some(&node.record),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Check if a record with this order id exists
    #[inline]
    pub fn contains(&self, id: u64) -> bool {
        self.search(id).is_some()
    }

    /// Get the minimum-id record, i.e. the next eviction candidate
    pub fn oldest(&self) -> Option<&OrderRecord> {
        let mut key = self.root?;
        while let Some(left) = self.nodes[key].left {
            key = left;
        }
        Some(&self.nodes[key].record)
    }

    /// Remove all records
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Get all records in pre-order (node, left subtree, right subtree).
    ///
    /// Pre-order exposes tree shape rather than key order. Use
    /// [`orders_sorted`](Self::orders_sorted) for ascending-id output.
    pub fn orders_preorder(&self) -> Vec<&OrderRecord> {
        let mut out = Vec::with_capacity(self.len);
        self.collect_preorder(self.root, &mut out);
        out
    }

    /// Get all records sorted ascending by order id (in-order traversal)
    ///
    /// # Example
    ///
    /// ```
    /// use order_index::{OrderIndex, OrderRecord};
    ///
    /// let mut index = OrderIndex::new();
    /// for id in [30, 10, 20] {
    ///     index.insert(OrderRecord::new(id, "Mina Park")).unwrap();
    /// }
    ///
    /// let ids: Vec<u64> = index.orders_sorted().iter().map(|r| r.id).collect();
    /// assert_eq!(ids, vec![10, 20, 30]);
    /// ```
    pub fn orders_sorted(&self) -> Vec<&OrderRecord> {
        let mut out = Vec::with_capacity(self.len);
        self.collect_inorder(self.root, &mut out);
        out
    }

    fn collect_preorder<'a>(&'a self, link: Option<usize>, out: &mut Vec<&'a OrderRecord>) {
        if let Some(key) = link {
            let node = &self.nodes[key];
            out.push(&node.record);
            self.collect_preorder(node.left, out);
            self.collect_preorder(node.right, out);
        }
    }

    fn collect_inorder<'a>(&'a self, link: Option<usize>, out: &mut Vec<&'a OrderRecord>) {
        if let Some(key) = link {
            let node = &self.nodes[key];
            self.collect_inorder(node.left, out);
            out.push(&node.record);
            self.collect_inorder(node.right, out);
        }
    }

    // ========================================================================
    // State Digest
    // ========================================================================

    /// Compute a SHA-256 digest over the pre-order encoding of all records.
    ///
    /// The digest is shape-sensitive: two indexes have equal digests exactly
    /// when they hold the same records in the same tree structure, so
    /// identical insertion sequences can be verified to produce identical
    /// state across runs.
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        let mut buf = Vec::new();
        for record in self.orders_preorder() {
            buf.clear();
            record.encode_into(&mut buf);
            hasher.update(&buf);
        }
        hasher.finalize().into()
    }

    // ========================================================================
    // Insertion Internals
    // ========================================================================

    /// Recursive BST insert of an already-allocated node.
    ///
    /// Returns the (possibly new) subtree root: rotations on the unwind can
    /// replace it, so the parent frame always re-links with the return value.
    fn insert_link(&mut self, link: Option<usize>, new_key: usize, id: u64) -> usize {
        let Some(current) = link else {
            return new_key;
        };

        if id < self.nodes[current].id() {
            let child = self.insert_link(self.nodes[current].left, new_key, id);
            self.nodes[current].left = Some(child);
        } else {
            // Ties go right: equal ids accumulate in the right subtree
            let child = self.insert_link(self.nodes[current].right, new_key, id);
            self.nodes[current].right = Some(child);
        }

        self.update_height(current);
        self.rebalance_insert(current, id)
    }

    /// Apply the four AVL insertion cases at `key` for the freshly inserted
    /// `id`, returning the new subtree root.
    ///
    /// At most one case fires per node: the tree was balanced before the
    /// insertion, so a single rotation (simple or double) restores balance at
    /// each ancestor.
    fn rebalance_insert(&mut self, key: usize, id: u64) -> usize {
        let balance = self.balance_factor(key);

        if balance > 1 {
            let left = self.nodes[key].left.expect("left-heavy node has a left child");
            if id < self.nodes[left].id() {
                // Left-left: single right rotation
                return self.rotate_right(key);
            }
            // Left-right: rotate the left child left, then this node right
            let rotated = self.rotate_left(left);
            self.nodes[key].left = Some(rotated);
            return self.rotate_right(key);
        }

        if balance < -1 {
            let right = self.nodes[key].right.expect("right-heavy node has a right child");
            if id > self.nodes[right].id() {
                // Right-right: single left rotation
                return self.rotate_left(key);
            }
            // Right-left: rotate the right child right, then this node left
            let rotated = self.rotate_right(right);
            self.nodes[key].right = Some(rotated);
            return self.rotate_left(key);
        }

        key
    }

    // ========================================================================
    // Eviction Internals
    // ========================================================================

    /// Remove and return the minimum-id record.
    ///
    /// Called only when the capacity bound has been exceeded, so the tree is
    /// non-empty.
    fn evict_oldest(&mut self) -> OrderRecord {
        let (new_root, victim) = self.evict_min_link(self.root);
        self.root = new_root;
        let victim = victim.expect("capacity overflow implies a non-empty tree");
        self.len -= 1;
        self.nodes.remove(victim).record
    }

    /// Recursive removal of the leftmost node under `link`.
    ///
    /// The node is spliced out by replacing it with its own right subtree.
    /// The unwind recomputes heights and rebalances each spine ancestor:
    /// removing the minimum shortens the left side, which can drive an
    /// ancestor's balance factor to -2.
    ///
    /// Returns the new subtree root link and the slab key of the removed
    /// node (still allocated; the caller frees it).
    fn evict_min_link(&mut self, link: Option<usize>) -> (Option<usize>, Option<usize>) {
        let Some(current) = link else {
            return (None, None);
        };

        match self.nodes[current].left {
            None => (self.nodes[current].right, Some(current)),
            Some(left) => {
                let (new_left, victim) = self.evict_min_link(Some(left));
                self.nodes[current].left = new_left;
                self.update_height(current);
                (Some(self.rebalance_removal(current)), victim)
            }
        }
    }

    /// Restore the balance invariant at `key` after a removal below it.
    ///
    /// Unlike the insertion cases, there is no freshly inserted id to compare
    /// against; the child's own balance factor picks between the single and
    /// double rotation.
    fn rebalance_removal(&mut self, key: usize) -> usize {
        let balance = self.balance_factor(key);

        if balance > 1 {
            let left = self.nodes[key].left.expect("left-heavy node has a left child");
            if self.balance_factor(left) >= 0 {
                return self.rotate_right(key);
            }
            let rotated = self.rotate_left(left);
            self.nodes[key].left = Some(rotated);
            return self.rotate_right(key);
        }

        if balance < -1 {
            let right = self.nodes[key].right.expect("right-heavy node has a right child");
            if self.balance_factor(right) <= 0 {
                return self.rotate_left(key);
            }
            let rotated = self.rotate_right(right);
            self.nodes[key].right = Some(rotated);
            return self.rotate_left(key);
        }

        key
    }

    // ========================================================================
    // Rotations and Height Bookkeeping
    // ========================================================================

    /// Right rotation at `z`: its left child `y` becomes the subtree root,
    /// `z` becomes `y`'s right child, and `y`'s former right subtree becomes
    /// `z`'s left. Heights are recomputed bottom-up (`z` first, since `y`
    /// now depends on `z`'s new height).
    fn rotate_right(&mut self, z: usize) -> usize {
        let y = self.nodes[z].left.expect("right rotation requires a left child");
        let carried = self.nodes[y].right;

        self.nodes[y].right = Some(z);
        self.nodes[z].left = carried;

        self.update_height(z);
        self.update_height(y);
        y
    }

    /// Left rotation at `z`, the mirror of [`rotate_right`](Self::rotate_right).
    fn rotate_left(&mut self, z: usize) -> usize {
        let y = self.nodes[z].right.expect("left rotation requires a right child");
        let carried = self.nodes[y].left;

        self.nodes[y].left = Some(z);
        self.nodes[z].right = carried;

        self.update_height(z);
        self.update_height(y);
        y
    }

    /// Height of a link; 0 for an absent subtree
    #[inline]
    fn link_height(&self, link: Option<usize>) -> u32 {
        link.map_or(0, |key| self.nodes[key].height)
    }

    /// Recompute the cached height at `key` from its children
    #[inline]
    fn update_height(&mut self, key: usize) {
        let left = self.link_height(self.nodes[key].left);
        let right = self.link_height(self.nodes[key].right);
        self.nodes[key].height = 1 + left.max(right);
    }

    /// Balance factor at `key`: height(left) - height(right)
    #[inline]
    fn balance_factor(&self, key: usize) -> i32 {
        let left = self.link_height(self.nodes[key].left) as i32;
        let right = self.link_height(self.nodes[key].right) as i32;
        left - right
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
