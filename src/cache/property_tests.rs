//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check codec, store and service behavior over generated inputs.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::cache::{codec, CacheService, CacheStore};

// == Test Configuration ==
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9:_]{1,32}"
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,256}"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Article {
    id: u64,
    title: String,
    tags: Vec<String>,
    meta: BTreeMap<String, i64>,
    rating: Option<i32>,
}

fn article_strategy() -> impl Strategy<Value = Article> {
    (
        any::<u64>(),
        ".{0,64}",
        prop::collection::vec("[a-z]{1,12}", 0..8),
        prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8),
        any::<Option<i32>>(),
    )
        .prop_map(|(id, title, tags, meta, rating)| Article {
            id,
            title,
            tags,
            meta,
            rating,
        })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so operations overlap
    let key = "k[0-4]";
    prop_oneof![
        (key, valid_value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // decode(encode(v)) == v for arbitrary structured values
    #[test]
    fn prop_codec_round_trip(article in article_strategy()) {
        let bytes = codec::encode(&article).unwrap();
        let decoded: Article = codec::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, article);
    }

    // Arbitrary bytes never panic the decoder
    #[test]
    fn prop_decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = codec::decode::<String>(&bytes);
    }

    // Storing then reading before expiry returns the exact payload
    #[test]
    fn prop_store_round_trip(key in valid_key_strategy(), payload in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut store = CacheStore::new(TEST_DEFAULT_TTL);
        store.set(key.clone(), payload.clone(), None);
        prop_assert_eq!(store.get(&key), Some(payload));
    }

    // The last write to a key wins
    #[test]
    fn prop_overwrite_semantics(key in valid_key_strategy(), first in valid_value_strategy(), second in valid_value_strategy()) {
        let mut store = CacheStore::new(TEST_DEFAULT_TTL);
        store.set(key.clone(), first.into_bytes(), None);
        store.set(key.clone(), second.clone().into_bytes(), None);

        prop_assert_eq!(store.get(&key), Some(second.into_bytes()));
        prop_assert_eq!(store.len(), 1);
    }

    // Pattern deletion removes exactly the keys containing the pattern
    #[test]
    fn prop_delete_by_pattern_exact(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..40),
        pattern in "[a-z0-9:]{1,3}",
    ) {
        let mut store = CacheStore::new(TEST_DEFAULT_TTL);
        for key in &keys {
            store.set(key.clone(), vec![1], None);
        }

        let expected_removed = keys.iter().filter(|k| k.contains(&pattern)).count();
        prop_assert_eq!(store.delete_by_pattern(&pattern), expected_removed);

        for key in &keys {
            prop_assert_eq!(store.get(key).is_some(), !key.contains(&pattern));
        }
    }

    // Flush leaves every previously stored key missing
    #[test]
    fn prop_flush_clears_all(keys in prop::collection::hash_set(valid_key_strategy(), 0..40)) {
        let mut store = CacheStore::new(TEST_DEFAULT_TTL);
        for key in &keys {
            store.set(key.clone(), vec![0], None);
        }

        prop_assert_eq!(store.flush(), keys.len());
        for key in &keys {
            prop_assert!(store.get(key).is_none());
        }
    }

    // Hit and miss counters match the outcomes observed by the caller
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = CacheStore::new(TEST_DEFAULT_TTL);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value.into_bytes(), None),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_entries, store.len());
    }

    // Overwriting a key with arbitrary garbage never surfaces as an error
    #[test]
    fn prop_corrupt_payload_is_miss(key in valid_key_strategy(), garbage in prop::collection::vec(any::<u8>(), 0..64)) {
        let cache = CacheService::new(TEST_DEFAULT_TTL);

        let (read, len) = tokio_test::block_on(async {
            cache.store().write().await.set(key.clone(), garbage, None);
            let read = cache.get::<Article>(&key).await;
            (read, cache.len().await)
        });

        prop_assert!(read.is_none());
        prop_assert_eq!(len, 0);
    }

    // Concurrent get/set/delete on overlapping keys only ever observes whole values
    #[test]
    fn prop_concurrent_operation_correctness(
        operations in prop::collection::vec(cache_op_strategy(), 10..60)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        let written: HashMap<String, Vec<String>> = operations.iter().fold(
            HashMap::new(),
            |mut acc, op| {
                if let CacheOp::Set { key, value } = op {
                    acc.entry(key.clone()).or_default().push(value.clone());
                }
                acc
            },
        );

        rt.block_on(async {
            let cache = CacheService::new(TEST_DEFAULT_TTL);

            let mut handles = vec![];
            for op in operations {
                let cache = cache.clone();
                handles.push(tokio::spawn(async move {
                    match op {
                        CacheOp::Set { key, value } => {
                            cache.set(&key, &value, None).await.map(|_| None).map_err(|e| e.to_string())
                        }
                        CacheOp::Get { key } => {
                            Ok(cache.get::<String>(&key).await.map(|v| (key, v)))
                        }
                        CacheOp::Delete { key } => {
                            cache.delete(&key).await;
                            Ok(None)
                        }
                    }
                }));
            }

            for handle in handles {
                let result = handle.await.expect("Task should not panic");
                prop_assert!(result.is_ok(), "Concurrent operation failed: {:?}", result);

                // Every value read must be one that was written for that key
                if let Ok(Some((key, value))) = result {
                    let candidates = written.get(&key);
                    prop_assert!(
                        candidates.map(|c| c.contains(&value)).unwrap_or(false),
                        "Read value {:?} for {} was never written",
                        value,
                        key
                    );
                }
            }

            let stats = cache.stats().await;
            prop_assert_eq!(stats.corrupt_evictions, 0);
            prop_assert!(stats.total_entries <= written.len());

            Ok(())
        })?;
    }
}

// == Additional Unit Tests for Edge Cases ==
#[cfg(test)]
mod tests {
    use crate::error::CacheError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (CacheError::NotFound("key".to_string()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
            (CacheError::Encode("bad".to_string()), StatusCode::BAD_REQUEST),
            (CacheError::Upstream("down".to_string()), StatusCode::BAD_GATEWAY),
            (CacheError::Decode("bad".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (CacheError::Internal("error".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(
                response.status(),
                expected_status,
                "Error should map to correct HTTP status"
            );
        }
    }
}
