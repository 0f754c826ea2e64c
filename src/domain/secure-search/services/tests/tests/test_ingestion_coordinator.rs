// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use secure_search::*;
use secure_search_inmem::{
    DummyEmbeddingClient,
    DummyEmbeddingConfig,
    InMemoryAuthorizationStore,
    InMemoryVectorIndex,
};
use secure_search_services::*;
use time_source::SystemTimeSourceStub;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_admit_indexes_content_and_grants_viewer() {
    let harness = IngestionHarness::builder().build();

    harness
        .coordinator
        .admit("alice", "report", "quarterly revenue report")
        .await
        .unwrap();

    assert!(harness.vector_index.contains("report").await.unwrap());
    assert_eq!(
        harness
            .authorization_store
            .check_batch(&[Tuple::viewer("alice", "report"), Tuple::viewer("bob", "report")])
            .await
            .unwrap(),
        [true, false]
    );

    let found = harness.search("quarterly revenue").await;
    assert_eq!(found[0].item_id, "report");
    assert_eq!(
        found[0].payload,
        serde_json::json!({
            "resource_id": "report",
            "text": "quarterly revenue report",
        })
    );
}

#[test_log::test(tokio::test)]
async fn test_payload_can_omit_content() {
    let harness = IngestionHarness::builder()
        .config(IngestionConfig {
            payload_include_content: false,
            ..Default::default()
        })
        .build();

    harness
        .coordinator
        .admit("alice", "report", "secret numbers")
        .await
        .unwrap();

    let found = harness.search("secret numbers").await;
    assert_eq!(
        found[0].payload,
        serde_json::json!({ "resource_id": "report" })
    );
}

#[test_log::test(tokio::test)]
async fn test_readmission_replaces_previous_vector() {
    let harness = IngestionHarness::builder().build();

    harness
        .coordinator
        .admit("alice", "doc", "first version about cats")
        .await
        .unwrap();
    harness
        .coordinator
        .admit("alice", "doc", "second version about dogs")
        .await
        .unwrap();

    assert_eq!(harness.vector_index.num_points().await, 1);

    let found = harness.search("dogs").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].payload["text"], "second version about dogs");
}

#[test_log::test(tokio::test)]
async fn test_admission_clears_cached_deny() {
    let harness = IngestionHarness::builder().build();
    let tuple = Tuple::viewer("alice", "doc");
    harness.decision_cache.put(tuple.clone(), false).await;

    harness
        .coordinator
        .admit("alice", "doc", "content")
        .await
        .unwrap();

    assert_eq!(harness.decision_cache.get(&tuple).await, None);
}

#[test_log::test(tokio::test)]
async fn test_embedding_failure_stores_nothing() {
    let mut embedding_client = MockEmbeddingClient::new();
    embedding_client
        .expect_embed()
        .returning(|_| Err(EmbeddingError::Timeout));

    let harness = IngestionHarness::builder()
        .embedding_client(Arc::new(embedding_client))
        .build();

    let err = harness
        .coordinator
        .admit("alice", "doc", "content")
        .await
        .unwrap_err();

    assert!(matches!(err, AdmitError::EmbeddingFailure(_)), "{err:?}");
    assert_eq!(harness.vector_index.num_points().await, 0);
    assert_eq!(
        harness
            .authorization_store
            .check_batch(&[Tuple::viewer("alice", "doc")])
            .await
            .unwrap(),
        [false]
    );
}

#[test_log::test(tokio::test)]
async fn test_failed_grant_is_partial_ingestion() {
    let mut authorization_client = MockAuthorizationClient::new();
    authorization_client.expect_write().returning(|_| {
        Err(WriteTuplesError::Service(
            AuthorizationServiceError::Unavailable("down".into()),
        ))
    });

    let harness = IngestionHarness::builder()
        .authorization_client(Arc::new(authorization_client))
        .build();

    let err = harness
        .coordinator
        .admit("alice", "doc", "content")
        .await
        .unwrap_err();

    let AdmitError::PartialIngestion(e) = err else {
        panic!("Unexpected error: {err:?}");
    };
    assert_eq!(e.subject_id, "alice");
    assert_eq!(e.resource_id, "doc");
    assert!(harness.vector_index.contains("doc").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_revoke_withdraws_access_and_clears_cache() {
    let harness = IngestionHarness::builder().build();
    harness
        .coordinator
        .admit("alice", "doc", "content")
        .await
        .unwrap();
    harness
        .decision_cache
        .put(Tuple::viewer("alice", "doc"), true)
        .await;
    harness
        .decision_cache
        .put(Tuple::viewer("bob", "other"), true)
        .await;

    harness.coordinator.revoke("alice", "doc").await.unwrap();
    // Revoking twice is fine
    harness.coordinator.revoke("alice", "doc").await.unwrap();

    assert_eq!(
        harness
            .authorization_store
            .check_batch(&[Tuple::viewer("alice", "doc")])
            .await
            .unwrap(),
        [false]
    );
    assert_eq!(harness.decision_cache.num_entries().await, 0);
    assert!(harness.vector_index.contains("doc").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_remove_drops_vector() {
    let harness = IngestionHarness::builder().build();
    harness
        .coordinator
        .admit("alice", "doc", "content")
        .await
        .unwrap();

    harness.coordinator.remove("doc").await.unwrap();
    harness.coordinator.remove("doc").await.unwrap();

    assert!(!harness.vector_index.contains("doc").await.unwrap());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Readiness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test(start_paused = true))]
async fn test_admit_waits_until_searchable() {
    let harness = IngestionHarness::builder()
        .indexing_lag(Duration::from_secs(3))
        .config(IngestionConfig {
            wait_until_searchable: true,
            ..Default::default()
        })
        .build();

    let started = tokio::time::Instant::now();
    harness
        .coordinator
        .admit("alice", "doc", "content")
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(harness.vector_index.contains("doc").await.unwrap());
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_wait_until_searchable_gives_up() {
    let mut vector_index = MockVectorIndexClient::new();
    vector_index.expect_contains().returning(|_| Ok(false));
    vector_index
        .expect_indexing_lag_bound()
        .return_const(Duration::from_secs(1));

    let harness = IngestionHarness::builder()
        .vector_index(Arc::new(vector_index))
        .config(IngestionConfig {
            readiness_timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .build();

    let err = harness
        .coordinator
        .wait_until_searchable("doc")
        .await
        .unwrap_err();

    let AdmitError::IndexNotReady(e) = err else {
        panic!("Unexpected error: {err:?}");
    };
    assert_eq!(
        e,
        IndexNotReadyError {
            resource_id: "doc".to_string(),
            waited: Duration::from_secs(3),
        }
    );
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_wait_until_searchable_polls_at_fixed_interval() {
    let num_polls = Arc::new(AtomicUsize::new(0));

    let mut vector_index = MockVectorIndexClient::new();
    vector_index.expect_contains().returning({
        let num_polls = num_polls.clone();
        move |_| Ok(num_polls.fetch_add(1, Ordering::SeqCst) >= 2)
    });
    vector_index
        .expect_indexing_lag_bound()
        .return_const(Duration::ZERO);

    let harness = IngestionHarness::builder()
        .vector_index(Arc::new(vector_index))
        .config(IngestionConfig {
            readiness_poll_interval: Duration::from_millis(250),
            ..Default::default()
        })
        .build();

    let started = tokio::time::Instant::now();
    harness
        .coordinator
        .wait_until_searchable("doc")
        .await
        .unwrap();

    assert_eq!(num_polls.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(started.elapsed() < Duration::from_millis(750));
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_wait_until_searchable_stops_on_index_failure() {
    let mut vector_index = MockVectorIndexClient::new();
    vector_index
        .expect_contains()
        .times(1)
        .returning(|_| Err(IndexError::Unavailable("503".into())));
    vector_index
        .expect_indexing_lag_bound()
        .return_const(Duration::ZERO);

    let harness = IngestionHarness::builder()
        .vector_index(Arc::new(vector_index))
        .build();

    let err = harness
        .coordinator
        .wait_until_searchable("doc")
        .await
        .unwrap_err();

    assert!(matches!(err, AdmitError::IndexUnavailable(_)), "{err:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Harness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct IngestionHarness {
    vector_index: Arc<InMemoryVectorIndex>,
    authorization_store: Arc<InMemoryAuthorizationStore>,
    decision_cache: Arc<InMemoryDecisionCache>,
    embedding_client: Arc<dyn EmbeddingClient>,
    coordinator: Arc<dyn IngestionCoordinator>,
}

#[derive(Default)]
struct IngestionHarnessBuilder {
    config: IngestionConfig,
    indexing_lag: Duration,
    embedding_client: Option<Arc<dyn EmbeddingClient>>,
    vector_index: Option<Arc<dyn VectorIndexClient>>,
    authorization_client: Option<Arc<dyn AuthorizationClient>>,
}

impl IngestionHarnessBuilder {
    fn config(mut self, config: IngestionConfig) -> Self {
        self.config = config;
        self
    }

    fn indexing_lag(mut self, indexing_lag: Duration) -> Self {
        self.indexing_lag = indexing_lag;
        self
    }

    fn embedding_client(mut self, client: Arc<dyn EmbeddingClient>) -> Self {
        self.embedding_client = Some(client);
        self
    }

    fn vector_index(mut self, client: Arc<dyn VectorIndexClient>) -> Self {
        self.vector_index = Some(client);
        self
    }

    fn authorization_client(mut self, client: Arc<dyn AuthorizationClient>) -> Self {
        self.authorization_client = Some(client);
        self
    }

    fn build(self) -> IngestionHarness {
        let vector_index = Arc::new(InMemoryVectorIndex::with_indexing_lag(self.indexing_lag));
        let authorization_store = Arc::new(InMemoryAuthorizationStore::new());
        let decision_cache = Arc::new(InMemoryDecisionCache::new(
            Arc::new(DecisionCacheConfig::default()),
            Arc::new(SystemTimeSourceStub::new()),
        ));

        let embedding_client: Arc<dyn EmbeddingClient> = match self.embedding_client {
            Some(client) => client,
            None => Arc::new(DummyEmbeddingClient::new(Arc::new(
                DummyEmbeddingConfig::default(),
            ))),
        };
        let vector_index_client: Arc<dyn VectorIndexClient> = match self.vector_index {
            Some(client) => client,
            None => vector_index.clone(),
        };
        let authorization_client: Arc<dyn AuthorizationClient> = match self.authorization_client {
            Some(client) => client,
            None => authorization_store.clone(),
        };

        let coordinator = IngestionCoordinatorImpl::new(
            Arc::new(self.config),
            embedding_client.clone(),
            vector_index_client,
            authorization_client,
            decision_cache.clone(),
        );

        IngestionHarness {
            vector_index,
            authorization_store,
            decision_cache,
            embedding_client,
            coordinator: Arc::new(coordinator),
        }
    }
}

impl IngestionHarness {
    fn builder() -> IngestionHarnessBuilder {
        IngestionHarnessBuilder::default()
    }

    async fn search(&self, text: &str) -> Vec<Candidate> {
        let vector = self.embedding_client.embed(text).await.unwrap();
        self.vector_index
            .search(&vector, 10, &HashSet::new())
            .await
            .unwrap()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
