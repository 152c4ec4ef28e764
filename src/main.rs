//! Order Index - Binary Entry Point
//!
//! A small demonstration of the bounded index: fill it past its cap, watch
//! the oldest orders fall out, and report the resulting state digest.

use order_index::{OrderIndex, OrderRecord};

fn main() {
    println!("===========================================");
    println!("  Order Index - Bounded AVL demo");
    println!("===========================================");
    println!();

    let mut index = OrderIndex::bounded(5).expect("bound of 5 is valid");
    println!("Created index with max_orders = {:?}", index.max_orders());
    println!();

    let orders = [
        (101, "Avery Quinn", "Classic / Medium"),
        (102, "Mina Park", "Graphic / Large"),
        (103, "Noor Haddad", "Modern / Small"),
        (104, "Kai Nilsen", "Custom / X-Large"),
        (105, "Rosa Ibarra", "Classic / Large"),
        (106, "Theo Mbeki", "Graphic / Medium"),
        (107, "Lena Vogel", "Modern / Large"),
    ];

    for (id, customer, details) in orders {
        let record = OrderRecord::new(id, customer).with_details(details);
        match index.insert(record) {
            Ok(Some(evicted)) => {
                println!("Inserted order {id} - evicted oldest order {} ({})", evicted.id, evicted.customer);
            }
            Ok(None) => println!("Inserted order {id}"),
            Err(e) => println!("Insert of order {id} rejected: {e}"),
        }
    }

    println!();
    println!("Index state:");
    println!("  Records: {}", index.len());
    println!("  Height:  {}", index.height());
    println!("  Oldest:  {:?}", index.oldest().map(|r| r.id));
    println!();

    println!("Orders (sorted by id):");
    for record in index.orders_sorted() {
        println!(
            "  #{:<4} {:<12} {}",
            record.id,
            record.customer,
            record.details.as_deref().unwrap_or("-")
        );
    }
    println!();

    println!("Searching for order 101 (evicted): {:?}", index.search(101).map(|r| r.id));
    println!("Searching for order 105:           {:?}", index.search(105).map(|r| r.id));
    println!();

    println!("State digest: {}", hex::encode(index.state_digest()));
}
