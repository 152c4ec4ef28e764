//! Stress tests for the bounded order index.
//!
//! These tests verify:
//! 1. The balance and ordering invariants survive large random workloads
//! 2. The capacity bound holds under sustained churn and eviction always
//!    removes the minimum-id record
//! 3. Determinism is preserved across runs (identical sequences produce
//!    identical state digests)
//!
//! ## Running Stress Tests
//!
//! ```bash
//! # Run all stress tests (release mode recommended)
//! cargo test --release --test stress_test -- --nocapture
//!
//! # Run specific test
//! cargo test --release --test stress_test stress_100k_inserts -- --nocapture
//! ```

use std::time::Instant;

use order_index::{OrderIndex, OrderRecord};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Number of records for the large insert test
const STRESS_RECORD_COUNT: usize = 100_000;

/// Record bound for the churn test
const CHURN_CAPACITY: usize = 512;

/// Number of inserts pushed through the bounded index
const CHURN_INSERT_COUNT: usize = 20_000;

/// Minimum acceptable insert throughput (records per second). Conservative
/// enough that debug builds pass; release builds land orders of magnitude
/// above this.
const MIN_THROUGHPUT: f64 = 5_000.0;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Generate deterministic records for stress testing.
///
/// Uses a seeded RNG for reproducibility. Same seed = same records. Ids are
/// drawn from a space small enough that collisions occur, so duplicate-id
/// handling is exercised as well.
fn generate_deterministic_records(count: usize, seed: u64) -> Vec<OrderRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(count);

    let customers = [
        "Avery Quinn",
        "Mina Park",
        "Noor Haddad",
        "Kai Nilsen",
        "Rosa Ibarra",
        "Theo Mbeki",
        "Lena Vogel",
    ];
    let designs = ["Classic", "Modern", "Graphic", "Custom"];
    let sizes = ["Small", "Medium", "Large", "X-Large"];

    for _ in 0..count {
        let id: u64 = rng.gen_range(1..=1_000_000);
        let customer = customers[rng.gen_range(0..customers.len())];

        let record = if rng.gen_bool(0.8) {
            let design = designs[rng.gen_range(0..designs.len())];
            let size = sizes[rng.gen_range(0..sizes.len())];
            OrderRecord::new(id, customer).with_details(format!("{design} / {size}"))
        } else {
            OrderRecord::new(id, customer)
        };

        records.push(record);
    }

    records
}

/// Insert a record sequence into a fresh index and return the state digest.
fn run_deterministic_sequence(seed: u64, count: usize, max_orders: Option<usize>) -> [u8; 32] {
    let records = generate_deterministic_records(count, seed);

    let mut index = match max_orders {
        Some(max) => OrderIndex::bounded(max).expect("valid bound"),
        None => OrderIndex::with_capacity(count),
    };

    for record in records {
        index.insert(record).expect("duplicates are allowed by default");
    }

    index.state_digest()
}

/// Assert the observable AVL height bound: height <= 1.44 * log2(n + 2).
/// A tree that degenerated into a chain blows through this immediately.
fn assert_avl_height(index: &OrderIndex) {
    let bound = 1.44 * ((index.len() + 2) as f64).log2();
    assert!(
        (index.height() as f64) <= bound,
        "height {} exceeds AVL bound {bound:.2} for {} records",
        index.height(),
        index.len()
    );
}

/// Collect the ids currently held, ascending.
fn sorted_ids(index: &OrderIndex) -> Vec<u64> {
    index.orders_sorted().iter().map(|r| r.id).collect()
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Main stress test: insert 100k random records into an unbounded index.
///
/// # Verification
/// - Length matches the insert count
/// - In-order traversal is sorted (BST invariant, observably)
/// - Height stays within the AVL bound (balancing actually happened)
/// - Throughput is sane
#[test]
fn stress_100k_inserts() {
    println!("\n=== STRESS TEST: 100k Inserts ===\n");

    println!("Generating {STRESS_RECORD_COUNT} deterministic records (seed=42)...");
    let records = generate_deterministic_records(STRESS_RECORD_COUNT, 42);

    let mut index = OrderIndex::with_capacity(STRESS_RECORD_COUNT);

    let start = Instant::now();
    for record in records {
        index.insert(record).expect("unbounded insert cannot fail");
    }
    let elapsed = start.elapsed();

    let throughput = STRESS_RECORD_COUNT as f64 / elapsed.as_secs_f64();
    println!("  Inserted {STRESS_RECORD_COUNT} records in {elapsed:.2?}");
    println!("  Throughput: {throughput:.0} records/sec");
    println!("  Final height: {}", index.height());

    assert_eq!(index.len(), STRESS_RECORD_COUNT);
    assert_avl_height(&index);

    let ids = sorted_ids(&index);
    assert_eq!(ids.len(), STRESS_RECORD_COUNT);
    assert!(ids.windows(2).all(|w| w[0] <= w[1]), "in-order output not sorted");

    assert!(
        throughput >= MIN_THROUGHPUT,
        "throughput {throughput:.0}/s below floor {MIN_THROUGHPUT}/s"
    );
}

/// Sequential worst case: strictly ascending ids would degenerate a plain
/// BST into a linear chain. The AVL bound must still hold at every step.
#[test]
fn stress_sequential_inserts_bounded_height() {
    let mut index = OrderIndex::new();

    for id in 1..=10_000u64 {
        index.insert(OrderRecord::new(id, "Avery Quinn")).unwrap();
        if id % 1_000 == 0 {
            assert_avl_height(&index);
        }
    }

    assert_eq!(index.len(), 10_000);
    assert_avl_height(&index);
}

/// Churn test: a bounded index under sustained overflow.
///
/// Tracks a sorted model of the expected contents and verifies after every
/// insert that eviction removed exactly the minimum id present, that the
/// bound holds, and periodically that the index contents match the model and
/// the height bound survives eviction.
#[test]
fn stress_bounded_churn() {
    println!("\n=== STRESS TEST: Bounded Churn ===\n");

    let records = generate_deterministic_records(CHURN_INSERT_COUNT, 7);
    let mut index = OrderIndex::bounded(CHURN_CAPACITY).expect("valid bound");

    // Model: the expected multiset of ids, kept sorted.
    let mut model: Vec<u64> = Vec::with_capacity(CHURN_CAPACITY + 1);

    for (i, record) in records.into_iter().enumerate() {
        let id = record.id;
        let at_capacity = index.len() == CHURN_CAPACITY;
        let expected_min = if at_capacity {
            let oldest = index.oldest().expect("full index has a minimum").id;
            Some(oldest.min(id))
        } else {
            None
        };

        let evicted = index.insert(record).expect("duplicates are allowed");

        let pos = model.partition_point(|&m| m <= id);
        model.insert(pos, id);

        match (expected_min, evicted) {
            (Some(min), Some(victim)) => {
                assert_eq!(victim.id, min, "evicted id {} is not the minimum {min}", victim.id);
                let pos = model.binary_search(&victim.id).expect("victim is in the model");
                model.remove(pos);
            }
            (None, None) => {}
            (expected, actual) => {
                panic!("eviction mismatch at insert {i}: expected {expected:?}, got {actual:?}")
            }
        }

        assert!(index.len() <= CHURN_CAPACITY, "capacity bound violated");

        if i % 500 == 0 {
            assert_eq!(sorted_ids(&index), model, "contents diverged from model");
            assert_avl_height(&index);
        }
    }

    assert_eq!(index.len(), CHURN_CAPACITY);
    assert_eq!(sorted_ids(&index), model);
    assert_avl_height(&index);

    println!("  {CHURN_INSERT_COUNT} inserts through a bound of {CHURN_CAPACITY}: ok");
}

/// Every id that was never inserted (or has been fully evicted) must miss;
/// every id still held must hit.
#[test]
fn stress_search_consistency() {
    let records = generate_deterministic_records(5_000, 11);
    let mut index = OrderIndex::bounded(256).expect("valid bound");

    for record in records {
        index.insert(record).expect("duplicates are allowed");
    }

    let held = sorted_ids(&index);
    for &id in &held {
        assert_eq!(index.search(id).map(|r| r.id), Some(id));
    }

    let min_held = *held.first().expect("index is full");
    // Everything below the surviving minimum has been evicted.
    for id in (1..min_held).rev().take(100) {
        assert!(index.search(id).is_none(), "evicted id {id} still found");
    }
    // Ids beyond the generator's space were never inserted.
    assert!(index.search(2_000_000).is_none());
}

// ============================================================================
// DETERMINISM TESTS
// ============================================================================

/// Same seed must produce an identical state digest across runs; a different
/// seed must not.
#[test]
fn determinism_across_runs() {
    let digest_a = run_deterministic_sequence(42, 10_000, None);
    let digest_b = run_deterministic_sequence(42, 10_000, None);
    let digest_c = run_deterministic_sequence(43, 10_000, None);

    assert_eq!(digest_a, digest_b, "identical sequences diverged");
    assert_ne!(digest_a, digest_c, "distinct sequences collided");
}

/// Eviction is part of the deterministic state machine too.
#[test]
fn determinism_with_eviction() {
    let digest_a = run_deterministic_sequence(42, 10_000, Some(CHURN_CAPACITY));
    let digest_b = run_deterministic_sequence(42, 10_000, Some(CHURN_CAPACITY));

    assert_eq!(digest_a, digest_b, "bounded sequences diverged");
}
