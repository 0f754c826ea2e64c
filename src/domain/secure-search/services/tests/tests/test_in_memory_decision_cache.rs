// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use secure_search::{DecisionCache, DecisionCacheConfig, Tuple};
use secure_search_services::{InMemoryDecisionCache, NoOpDecisionCache};
use time_source::{SystemTimeSource, SystemTimeSourceStub};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_get_returns_fresh_decision() {
    let harness = CacheHarness::new(Duration::from_secs(30), 100);
    let tuple = Tuple::viewer("alice", "doc-1");

    harness.cache.put(tuple.clone(), true).await;

    let decision = harness.cache.get(&tuple).await.unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.decided_at, harness.time_source.now());
    assert_eq!(harness.cache.get(&Tuple::viewer("bob", "doc-1")).await, None);
}

#[test_log::test(tokio::test)]
async fn test_expired_decision_is_a_miss() {
    let harness = CacheHarness::new(Duration::from_secs(30), 100);
    let tuple = Tuple::viewer("alice", "doc-1");

    harness.cache.put(tuple.clone(), false).await;

    harness.time_source.advance(chrono::Duration::seconds(29));
    assert!(harness.cache.get(&tuple).await.is_some());

    harness.time_source.advance(chrono::Duration::seconds(1));
    assert_eq!(harness.cache.get(&tuple).await, None);
    assert_eq!(harness.cache.get_many(&[tuple]).await, [None]);
}

#[test_log::test(tokio::test)]
async fn test_last_write_wins() {
    let harness = CacheHarness::new(Duration::from_secs(30), 100);
    let tuple = Tuple::viewer("alice", "doc-1");

    harness.cache.put(tuple.clone(), true).await;
    harness.cache.put(tuple.clone(), false).await;

    assert!(!harness.cache.get(&tuple).await.unwrap().allowed);
    assert_eq!(harness.cache.num_entries().await, 1);
}

#[test_log::test(tokio::test)]
async fn test_full_cache_evicts_oldest_decision() {
    let harness = CacheHarness::new(Duration::from_secs(30), 2);
    let (a, b, c) = (
        Tuple::viewer("alice", "a"),
        Tuple::viewer("alice", "b"),
        Tuple::viewer("alice", "c"),
    );

    harness.cache.put(a.clone(), true).await;
    harness.time_source.advance(chrono::Duration::seconds(1));
    harness.cache.put(b.clone(), true).await;
    harness.time_source.advance(chrono::Duration::seconds(1));
    harness.cache.put(c.clone(), true).await;

    assert_eq!(harness.cache.num_entries().await, 2);
    assert_eq!(harness.cache.get(&a).await, None);
    assert!(harness.cache.get(&b).await.is_some());
    assert!(harness.cache.get(&c).await.is_some());
}

#[test_log::test(tokio::test)]
async fn test_full_cache_purges_expired_entries_first() {
    let harness = CacheHarness::new(Duration::from_secs(10), 3);
    let (a, b, c, d) = (
        Tuple::viewer("alice", "a"),
        Tuple::viewer("alice", "b"),
        Tuple::viewer("alice", "c"),
        Tuple::viewer("alice", "d"),
    );

    harness.cache.put(a.clone(), true).await;
    harness.cache.put(b.clone(), true).await;
    harness.time_source.advance(chrono::Duration::seconds(5));
    harness.cache.put(c.clone(), true).await;
    harness.time_source.advance(chrono::Duration::seconds(7));
    harness.cache.put(d.clone(), true).await;

    // Both expired entries went away, nothing fresh had to be evicted
    assert_eq!(harness.cache.num_entries().await, 2);
    assert!(harness.cache.get(&c).await.is_some());
    assert!(harness.cache.get(&d).await.is_some());
}

#[test_log::test(tokio::test)]
async fn test_updating_existing_entry_does_not_evict() {
    let harness = CacheHarness::new(Duration::from_secs(30), 2);
    let (a, b) = (Tuple::viewer("alice", "a"), Tuple::viewer("alice", "b"));

    harness.cache.put(a.clone(), true).await;
    harness.cache.put(b.clone(), true).await;
    harness.cache.put(a.clone(), false).await;

    assert_eq!(harness.cache.num_entries().await, 2);
    assert!(harness.cache.get(&b).await.is_some());
}

#[test_log::test(tokio::test)]
async fn test_zero_capacity_stores_nothing() {
    let harness = CacheHarness::new(Duration::from_secs(30), 0);
    let tuple = Tuple::viewer("alice", "a");

    harness.cache.put(tuple.clone(), true).await;

    assert_eq!(harness.cache.get(&tuple).await, None);
    assert_eq!(harness.cache.num_entries().await, 0);
}

#[test_log::test(tokio::test)]
async fn test_invalidate_and_clear() {
    let harness = CacheHarness::new(Duration::from_secs(30), 100);
    let (a, b, c) = (
        Tuple::viewer("alice", "a"),
        Tuple::viewer("alice", "b"),
        Tuple::viewer("alice", "c"),
    );

    harness
        .cache
        .put_many(vec![(a.clone(), true), (b.clone(), false), (c.clone(), true)])
        .await;

    harness.cache.invalidate(&a).await;
    let cached = harness.cache.get_many(&[a, b, c]).await;
    assert_eq!(
        cached.iter().map(|d| d.map(|d| d.allowed)).collect::<Vec<_>>(),
        [None, Some(false), Some(true)]
    );

    harness.cache.clear().await;
    assert_eq!(harness.cache.num_entries().await, 0);
}

#[test_log::test(tokio::test)]
async fn test_no_op_cache_always_misses() {
    let cache = NoOpDecisionCache {};
    let tuple = Tuple::viewer("alice", "a");

    cache.put(tuple.clone(), true).await;

    assert_eq!(cache.get(&tuple).await, None);
    assert_eq!(cache.get_many(&[tuple.clone(), tuple]).await, [None, None]);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Harness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct CacheHarness {
    time_source: SystemTimeSourceStub,
    cache: InMemoryDecisionCache,
}

impl CacheHarness {
    fn new(ttl: Duration, max_entries: usize) -> Self {
        let time_source =
            SystemTimeSourceStub::new_set(Utc.with_ymd_and_hms(2050, 1, 1, 12, 0, 0).unwrap());

        let cache = InMemoryDecisionCache::new(
            Arc::new(DecisionCacheConfig { ttl, max_entries }),
            Arc::new(time_source.clone()),
        );

        Self { time_source, cache }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
