//! Property-Based Tests for the in-process store
//!
//! Uses proptest to check invariants of MemoryStore across arbitrary
//! command sequences.

use std::collections::HashMap;
use std::time::Duration;

use proptest::prelude::*;
use tokio_test::block_on;

use crate::store::{KvStore, MemoryStore};

const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,3}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Incr { key: String },
    Del { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        key_strategy().prop_map(|key| StoreOp::Incr { key }),
        key_strategy().prop_map(|key| StoreOp::Del { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // With ample capacity the store behaves like a plain map: every GET
    // observes the last SET/INCR/DEL applied to that key.
    #[test]
    fn prop_matches_reference_map(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        block_on(async {
            let store = MemoryStore::new(1_000);
            let mut model: HashMap<String, String> = HashMap::new();

            for op in ops {
                match op {
                    StoreOp::Set { key, value } => {
                        store.set(&key, &value, Some(TEST_TTL)).await.unwrap();
                        model.insert(key, value);
                    }
                    StoreOp::Incr { key } => {
                        let expected = match model.get(&key) {
                            None => Some(1),
                            Some(v) => v.parse::<i64>().ok().and_then(|n| n.checked_add(1)),
                        };
                        let result = store.incr(&key).await;
                        match expected {
                            Some(n) => {
                                prop_assert_eq!(result.unwrap(), n);
                                model.insert(key, n.to_string());
                            }
                            None => prop_assert!(result.is_err()),
                        }
                    }
                    StoreOp::Del { key } => {
                        let existed = store.del(&key).await.unwrap();
                        prop_assert_eq!(existed, model.remove(&key).is_some());
                    }
                }
            }

            for (key, value) in &model {
                let stored = store.get(key).await.unwrap();
                prop_assert_eq!(stored.as_ref(), Some(value));
            }
            prop_assert_eq!(store.len().await, model.len());
            Ok(())
        })?;
    }

    // The number of keys never exceeds capacity while evictable keys exist.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        block_on(async {
            let max_entries = 20;
            let store = MemoryStore::new(max_entries);

            for (key, value) in entries {
                store.set(&key, &value, Some(TEST_TTL)).await.unwrap();
                prop_assert!(store.len().await <= max_entries);
            }
            Ok(())
        })?;
    }

    // A persistent counter survives any amount of churn from expiring keys.
    #[test]
    fn prop_persistent_counter_survives_churn(
        bumps in 1usize..10,
        churn in prop::collection::vec(value_strategy(), 1..100)
    ) {
        block_on(async {
            let store = MemoryStore::new(8);
            for _ in 0..bumps {
                store.incr("cachever:ns").await.unwrap();
            }
            for (i, value) in churn.iter().enumerate() {
                store.set(&format!("cache:ns:{}", i), value, Some(TEST_TTL)).await.unwrap();
            }

            let version = store.get("cachever:ns").await.unwrap();
            prop_assert_eq!(version, Some(bumps.to_string()));
            Ok(())
        })?;
    }
}
