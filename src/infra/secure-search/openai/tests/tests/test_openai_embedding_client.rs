// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use http_common::RetryPolicy;
use pretty_assertions::assert_eq;
use secure_search::{EmbeddingClient, EmbeddingError};
use secure_search_openai::*;
use serde_json::{Value, json};
use test_utils::TestHttpServer;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_openai_request_format() {
    let harness = OpenAiHarness::new(vec![]).await;
    let client = harness.client(|config| {
        config.url = harness.server.url().join("v1/").unwrap().to_string();
        config.api_key = Some("sk-test".to_string());
    });

    let vector = client.embed("hello world").await.unwrap();

    assert_eq!(vector, [0.5, -0.25, 1.0]);

    let requests = harness.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].uri, "/v1/embeddings");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(requests[0].api_key, None);
    assert_eq!(
        requests[0].body,
        json!({
            "input": ["hello world"],
            "model": "text-embedding-ada-002",
        })
    );
}

#[test_log::test(tokio::test)]
async fn test_azure_request_format() {
    let harness = OpenAiHarness::new(vec![]).await;
    let client = harness.client(|config| {
        config.flavor = OpenAiFlavor::Azure {
            api_version: "2024-02-01".to_string(),
        };
        config.url = harness
            .server
            .url()
            .join("openai/deployments/ada")
            .unwrap()
            .to_string();
        config.api_key = Some("azure-key".to_string());
    });

    client.embed("hello").await.unwrap();

    let requests = harness.requests();
    assert_eq!(
        requests[0].uri,
        "/openai/deployments/ada/embeddings?api-version=2024-02-01"
    );
    assert_eq!(requests[0].api_key.as_deref(), Some("azure-key"));
    assert_eq!(requests[0].authorization, None);
}

#[test_log::test(tokio::test)]
async fn test_picks_first_embedding_by_index() {
    let harness = OpenAiHarness::new(vec![(
        StatusCode::OK,
        json!({
            "data": [
                {"index": 1, "embedding": [9.0, 9.0, 9.0]},
                {"index": 0, "embedding": [1.0, 2.0, 3.0]},
            ]
        }),
    )])
    .await;
    let client = harness.client(|_| {});

    assert_eq!(client.embed("hello").await.unwrap(), [1.0, 2.0, 3.0]);
}

#[test_log::test(tokio::test)]
async fn test_dimension_mismatch_is_rejected() {
    let harness = OpenAiHarness::new(vec![]).await;
    let client = harness.client(|config| config.dimensions = 1536);

    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::BadResponse(_)), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn test_empty_response_is_rejected() {
    let harness = OpenAiHarness::new(vec![(StatusCode::OK, json!({ "data": [] }))]).await;
    let client = harness.client(|_| {});

    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::BadResponse(_)), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn test_server_errors_are_retried() {
    let harness = OpenAiHarness::new(vec![
        (StatusCode::SERVICE_UNAVAILABLE, json!({})),
        (StatusCode::TOO_MANY_REQUESTS, json!({})),
    ])
    .await;
    let client = harness.client(|_| {});

    assert_eq!(client.embed("hello").await.unwrap(), [0.5, -0.25, 1.0]);
    assert_eq!(harness.requests().len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_persistent_server_error_is_unavailable() {
    let harness = OpenAiHarness::new(vec![
        (StatusCode::BAD_GATEWAY, json!({})),
        (StatusCode::BAD_GATEWAY, json!({})),
        (StatusCode::BAD_GATEWAY, json!({})),
    ])
    .await;
    let client = harness.client(|_| {});

    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::Unavailable(_)), "{err:?}");
    assert_eq!(harness.requests().len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_rejected_request_is_not_retried() {
    let harness = OpenAiHarness::new(vec![(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"message": "Incorrect API key provided"}}),
    )])
    .await;
    let client = harness.client(|_| {});

    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::BadResponse(_)), "{err:?}");
    assert_eq!(harness.requests().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_unreachable_service_is_unavailable() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let client = OpenAiEmbeddingClient::new(Arc::new(OpenAiEmbeddingConfig {
        url: format!("http://{addr}/v1/"),
        dimensions: 3,
        retry_policy: RetryPolicy::none(),
        ..Default::default()
    }));

    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::Unavailable(_)), "{err:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Harness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
struct RecordedRequest {
    uri: String,
    authorization: Option<String>,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct FakeOpenAiState {
    scripted: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn fake_embeddings(
    State(state): State<FakeOpenAiState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        uri: uri.to_string(),
        authorization: header("authorization"),
        api_key: header("api-key"),
        body,
    });

    let (status, response) = state.scripted.lock().unwrap().pop_front().unwrap_or((
        StatusCode::OK,
        json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.5, -0.25, 1.0]}],
            "model": "text-embedding-ada-002",
        }),
    ));

    (status, Json(response))
}

struct OpenAiHarness {
    server: TestHttpServer,
    state: FakeOpenAiState,
}

impl OpenAiHarness {
    async fn new(scripted: Vec<(StatusCode, Value)>) -> Self {
        let state = FakeOpenAiState {
            scripted: Arc::new(Mutex::new(scripted.into())),
            ..Default::default()
        };

        let router = axum::Router::new()
            .fallback(fake_embeddings)
            .with_state(state.clone());

        Self {
            server: TestHttpServer::spawn(router).await,
            state,
        }
    }

    fn client(&self, configure: impl FnOnce(&mut OpenAiEmbeddingConfig)) -> OpenAiEmbeddingClient {
        let mut config = OpenAiEmbeddingConfig {
            url: self.server.url().join("v1/").unwrap().to_string(),
            dimensions: 3,
            retry_policy: RetryPolicy {
                max_retries: 2,
                initial_backoff: Duration::from_millis(1),
            },
            ..Default::default()
        };
        configure(&mut config);

        OpenAiEmbeddingClient::new(Arc::new(config))
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
