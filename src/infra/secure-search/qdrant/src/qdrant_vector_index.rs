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
use std::time::Duration;

use dill::{Singleton, component, interface, scope};
use http_common::{
    HttpCallError,
    build_http_client,
    decode_json_response,
    ensure_success,
    send_with_retry,
};
use internal_error::{InternalError, ResultIntoInternal};
use secure_search::{Candidate, IndexError, VectorIndexClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use url::Url;
use uuid::Uuid;

use crate::QdrantConfig;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ITEM_ID_KEY: &str = "item_id";
const PAYLOAD_KEY: &str = "payload";

const ENDPOINT_COLLECTION: &str = "qdrant:collection";
const ENDPOINT_SEARCH: &str = "qdrant:points/search";
const ENDPOINT_UPSERT: &str = "qdrant:points";
const ENDPOINT_DELETE: &str = "qdrant:points/delete";
const ENDPOINT_GET: &str = "qdrant:points/{id}";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Qdrant only accepts integers and UUIDs as point ids, so item ids are mapped
/// to stable name-based UUIDs and the original id travels in the payload
pub fn point_id_for(item_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, item_id.as_bytes()).to_string()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct Connection {
    client: reqwest::Client,
    base_url: Url,
}

pub struct QdrantVectorIndex {
    config: Arc<QdrantConfig>,
    connection: OnceCell<Connection>,
}

#[component(pub)]
#[interface(dyn VectorIndexClient)]
#[scope(Singleton)]
impl QdrantVectorIndex {
    pub fn new(config: Arc<QdrantConfig>) -> Self {
        Self {
            config,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection, IndexError> {
        self.connection
            .get_or_try_init(|| async {
                let client = build_http_client(
                    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
                    self.config.timeout,
                )
                .int_err()?;

                let mut base_url =
                    Url::parse(&self.config.url).context_int_err("invalid Qdrant URL")?;
                if !base_url.path().ends_with('/') {
                    let path = format!("{}/", base_url.path());
                    base_url.set_path(&path);
                }

                let connection = Connection { client, base_url };

                if self.config.create_collection {
                    self.ensure_collection(&connection).await?;
                }

                Ok::<_, IndexError>(connection)
            })
            .await
    }

    fn collection_url(&self, connection: &Connection, suffix: &str) -> Result<Url, InternalError> {
        connection
            .base_url
            .join(&format!("collections/{}{suffix}", self.config.collection))
            .int_err()
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(api_key) => request.header("api-key", api_key),
            None => request,
        }
    }

    #[tracing::instrument(
        level = "debug",
        name = "QdrantVectorIndex::ensure_collection",
        skip_all,
        fields(collection = %self.config.collection)
    )]
    async fn ensure_collection(&self, connection: &Connection) -> Result<(), IndexError> {
        let url = self.collection_url(connection, "")?;

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_COLLECTION, || {
            self.authorize(connection.client.get(url.clone()))
        })
        .await
        .map_err(into_index_error)?;

        if response.status() != reqwest::StatusCode::NOT_FOUND {
            ensure_success(ENDPOINT_COLLECTION, response)
                .await
                .map_err(into_index_error)?;
            return Ok(());
        }

        tracing::info!(
            collection = %self.config.collection,
            dimensions = self.config.dimensions,
            "Creating vector collection",
        );

        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: self.config.dimensions,
                distance: "Cosine",
            },
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_COLLECTION, || {
            self.authorize(connection.client.put(url.clone()).json(&body))
        })
        .await
        .map_err(into_index_error)?;

        // Lost a race with another writer creating the same collection
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }

        ensure_success(ENDPOINT_COLLECTION, response)
            .await
            .map_err(into_index_error)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl VectorIndexClient for QdrantVectorIndex {
    #[tracing::instrument(
        level = "debug",
        name = "QdrantVectorIndex::search",
        skip_all,
        fields(limit = limit, num_excluded = exclude_ids.len())
    )]
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        exclude_ids: &HashSet<String>,
    ) -> Result<Vec<Candidate>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let connection = self.connection().await?;
        let url = self.collection_url(connection, "/points/search")?;

        let filter = if exclude_ids.is_empty() {
            None
        } else {
            let mut has_id: Vec<_> = exclude_ids.iter().map(|id| point_id_for(id)).collect();
            has_id.sort();
            Some(SearchFilter {
                must_not: vec![HasIdCondition { has_id }],
            })
        };

        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
            filter,
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_SEARCH, || {
            self.authorize(connection.client.post(url.clone()).json(&body))
        })
        .await
        .map_err(into_index_error)?;

        let response: QdrantResponse<Vec<ScoredPoint>> =
            decode_json_response(ENDPOINT_SEARCH, response)
                .await
                .map_err(into_index_error)?;

        response
            .result
            .into_iter()
            .enumerate()
            .map(|(rank, point)| point.into_candidate(rank))
            .collect()
    }

    #[tracing::instrument(level = "debug", name = "QdrantVectorIndex::upsert", skip_all, fields(%item_id))]
    async fn upsert(&self, item_id: &str, vector: Vec<f32>, payload: Value) -> Result<(), IndexError> {
        let connection = self.connection().await?;
        let url = self.collection_url(connection, "/points?wait=true")?;

        let body = UpsertPointsRequest {
            points: [PointStruct {
                id: point_id_for(item_id),
                vector,
                payload: serde_json::json!({
                    ITEM_ID_KEY: item_id,
                    PAYLOAD_KEY: payload,
                }),
            }],
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_UPSERT, || {
            self.authorize(connection.client.put(url.clone()).json(&body))
        })
        .await
        .map_err(into_index_error)?;

        ensure_success(ENDPOINT_UPSERT, response)
            .await
            .map_err(into_index_error)?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", name = "QdrantVectorIndex::delete", skip_all, fields(%item_id))]
    async fn delete(&self, item_id: &str) -> Result<(), IndexError> {
        let connection = self.connection().await?;
        let url = self.collection_url(connection, "/points/delete?wait=true")?;

        let body = DeletePointsRequest {
            points: [point_id_for(item_id)],
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_DELETE, || {
            self.authorize(connection.client.post(url.clone()).json(&body))
        })
        .await
        .map_err(into_index_error)?;

        ensure_success(ENDPOINT_DELETE, response)
            .await
            .map_err(into_index_error)?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", name = "QdrantVectorIndex::contains", skip_all, fields(%item_id))]
    async fn contains(&self, item_id: &str) -> Result<bool, IndexError> {
        let connection = self.connection().await?;
        let url = self.collection_url(connection, &format!("/points/{}", point_id_for(item_id)))?;

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_GET, || {
            self.authorize(connection.client.get(url.clone()))
        })
        .await
        .map_err(into_index_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        ensure_success(ENDPOINT_GET, response)
            .await
            .map_err(into_index_error)?;
        Ok(true)
    }

    fn indexing_lag_bound(&self) -> Duration {
        // Writes are issued with `wait=true`
        Duration::ZERO
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn into_index_error(e: HttpCallError) -> IndexError {
    tracing::warn!(error = ?e, error_msg = %e, "Vector index request failed");

    if e.is_timeout() {
        IndexError::Timeout
    } else if e.is_unavailable() {
        IndexError::Unavailable(Box::new(e))
    } else {
        IndexError::BadResponse(Box::new(e))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Wire format
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<SearchFilter>,
}

#[derive(Serialize)]
struct SearchFilter {
    must_not: Vec<HasIdCondition>,
}

#[derive(Serialize)]
struct HasIdCondition {
    has_id: Vec<String>,
}

#[derive(Serialize)]
struct UpsertPointsRequest {
    points: [PointStruct; 1],
}

#[derive(Serialize)]
struct PointStruct {
    id: String,
    vector: Vec<f32>,
    payload: Value,
}

#[derive(Serialize)]
struct DeletePointsRequest {
    points: [String; 1],
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: serde_json::Map<String, Value>,
}

impl ScoredPoint {
    fn into_candidate(mut self, rank: usize) -> Result<Candidate, IndexError> {
        let Some(Value::String(item_id)) = self.payload.remove(ITEM_ID_KEY) else {
            return Err(IndexError::BadResponse(
                format!("point {} carries no item id", self.id).into(),
            ));
        };

        Ok(Candidate {
            item_id,
            rank,
            score: self.score,
            payload: self.payload.remove(PAYLOAD_KEY).unwrap_or(Value::Null),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
