//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check entry freshness rules and the synchronous cache
//! operations against a plain HashMap model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheOptions, RequestCache};

// == Strategies ==
/// Generates cache keys shaped like the ones the service uses
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "(transactions|categories):[a-z0-9]{1,12}".prop_map(|s| s)
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}".prop_map(|s| s)
}

/// Synchronous cache operations
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Append { key: String, value: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Append { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // An entry is valid up to and including expires_at, and expired after it.
    #[test]
    fn prop_expiry_is_strictly_after_ttl(ttl_ms in 1u64..100_000, offset_ms in 0u64..200_000) {
        let start = Instant::now();
        let entry = CacheEntry::stored_at((), start, Duration::from_millis(ttl_ms));
        let read_at = start + Duration::from_millis(offset_ms);

        prop_assert_eq!(entry.is_expired(read_at), offset_ms > ttl_ms);
    }

    // Staleness starts strictly after 80% of the TTL and never precedes expiry.
    #[test]
    fn prop_stale_threshold(ttl_ms in 5u64..100_000, offset_ms in 0u64..200_000) {
        let start = Instant::now();
        let ttl = Duration::from_millis(ttl_ms);
        let entry = CacheEntry::stored_at((), start, ttl);
        let read_at = start + Duration::from_millis(offset_ms);

        let threshold = ttl * 4 / 5;
        prop_assert_eq!(entry.is_stale(read_at), Duration::from_millis(offset_ms) > threshold);
        if entry.is_expired(read_at) {
            prop_assert!(entry.is_stale(read_at));
        }
    }

    // set / update / invalidate behave like a map of the latest write per key.
    #[test]
    fn prop_sync_operations_match_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache: RequestCache<String> = RequestCache::new(CacheOptions::default());
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(&key, value.clone());
                    model.insert(key, value);
                }
                CacheOp::Append { key, value } => {
                    let stored = cache.update(&key, |current| {
                        format!("{}{}", current.map(String::as_str).unwrap_or(""), value)
                    });
                    let expected = format!("{}{}", model.get(&key).map(String::as_str).unwrap_or(""), value);
                    prop_assert_eq!(&stored, &expected);
                    model.insert(key, expected);
                }
                CacheOp::Invalidate { key } => {
                    prop_assert_eq!(cache.invalidate(&key), model.remove(&key).is_some());
                }
            }
        }

        prop_assert_eq!(cache.len(), model.len());
        for (key, value) in &model {
            let cached = cache.peek(key);
            prop_assert_eq!(cached.as_ref(), Some(value));
        }
        prop_assert_eq!(cache.stats().total_entries, model.len());
    }
}

// == Property Test for Error Response Format ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every error variant renders a JSON body with a string "error" field.
    #[test]
    fn prop_error_response_format(error_msg in "[a-zA-Z0-9 _-]{1,100}") {
        use crate::error::{AppError, CacheError};
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            AppError::NotFound(error_msg.clone()),
            AppError::InvalidRequest(error_msg.clone()),
            AppError::RateLimited { message: error_msg.clone(), retry_after_secs: 1 },
            AppError::Unauthorized(error_msg.clone()),
            AppError::Conflict(error_msg.clone()),
            AppError::Upstream(CacheError::fetch("key", anyhow::anyhow!(error_msg.clone()))),
            AppError::Internal(error_msg.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in error_variants {
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = rt.block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });
            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            let error_str = json.get("error").and_then(|v| v.as_str());
            prop_assert!(error_str.is_some(), "'error' field should be a string");
            prop_assert!(error_str.unwrap().contains(&error_msg));
        }
    }
}
