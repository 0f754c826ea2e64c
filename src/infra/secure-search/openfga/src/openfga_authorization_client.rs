// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::Arc;

use dill::{Singleton, component, interface, scope};
use futures::{StreamExt, TryStreamExt};
use http_common::{
    HttpCallError,
    build_http_client,
    decode_json_response,
    ensure_success,
    send_with_retry,
};
use internal_error::{InternalError, ResultIntoInternal};
use secure_search::{
    AuthorizationClient,
    AuthorizationServiceError,
    Tuple,
    TupleWrite,
    WriteTuplesError,
};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use url::Url;

use crate::{OpenFgaBatchMode, OpenFgaConfig};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ENDPOINT_CHECK: &str = "openfga:check";
const ENDPOINT_BATCH_CHECK: &str = "openfga:batch-check";
const ENDPOINT_WRITE: &str = "openfga:write";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct Connection {
    client: reqwest::Client,
    check_url: Url,
    batch_check_url: Url,
    write_url: Url,
}

pub struct OpenFgaAuthorizationClient {
    config: Arc<OpenFgaConfig>,
    connection: OnceCell<Connection>,
}

#[component(pub)]
#[interface(dyn AuthorizationClient)]
#[scope(Singleton)]
impl OpenFgaAuthorizationClient {
    pub fn new(config: Arc<OpenFgaConfig>) -> Self {
        Self {
            config,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection, InternalError> {
        self.connection
            .get_or_try_init(|| async {
                let client = build_http_client(
                    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
                    self.config.timeout,
                )
                .int_err()?;

                let mut base_url =
                    Url::parse(&self.config.url).context_int_err("invalid OpenFGA URL")?;
                if !base_url.path().ends_with('/') {
                    let path = format!("{}/", base_url.path());
                    base_url.set_path(&path);
                }
                let store_url = base_url
                    .join(&format!("stores/{}/", self.config.store_id))
                    .int_err()?;

                Ok::<_, InternalError>(Connection {
                    client,
                    check_url: store_url.join("check").int_err()?,
                    batch_check_url: store_url.join("batch-check").int_err()?,
                    write_url: store_url.join("write").int_err()?,
                })
            })
            .await
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    fn tuple_key<'a>(&self, tuple: &'a Tuple) -> TupleKey<'a> {
        TupleKey {
            user: format!("{}:{}", self.config.user_type, tuple.subject),
            relation: &tuple.relation,
            object: format!("{}:{}", self.config.object_type, tuple.object),
        }
    }

    fn tuple_keys<'a>(&self, writes: &[&'a TupleWrite]) -> Option<TupleKeys<'a>> {
        if writes.is_empty() {
            return None;
        }

        Some(TupleKeys {
            tuple_keys: writes.iter().map(|w| self.tuple_key(w.tuple())).collect(),
        })
    }

    async fn check_one(
        &self,
        connection: &Connection,
        tuple: &Tuple,
    ) -> Result<bool, AuthorizationServiceError> {
        let body = CheckRequest {
            tuple_key: self.tuple_key(tuple),
            authorization_model_id: self.config.authorization_model_id.as_deref(),
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_CHECK, || {
            self.authorize(connection.client.post(connection.check_url.clone()).json(&body))
        })
        .await
        .map_err(into_authorization_error)?;

        let response: CheckResponse = decode_json_response(ENDPOINT_CHECK, response)
            .await
            .map_err(into_authorization_error)?;

        Ok(response.allowed)
    }

    async fn batch_check_chunk(
        &self,
        connection: &Connection,
        tuples: &[Tuple],
    ) -> Result<Vec<bool>, AuthorizationServiceError> {
        let body = BatchCheckRequest {
            checks: tuples
                .iter()
                .enumerate()
                .map(|(i, tuple)| BatchCheckItem {
                    tuple_key: self.tuple_key(tuple),
                    correlation_id: i.to_string(),
                })
                .collect(),
            authorization_model_id: self.config.authorization_model_id.as_deref(),
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_BATCH_CHECK, || {
            self.authorize(
                connection
                    .client
                    .post(connection.batch_check_url.clone())
                    .json(&body),
            )
        })
        .await
        .map_err(into_authorization_error)?;

        let mut response: BatchCheckResponse = decode_json_response(ENDPOINT_BATCH_CHECK, response)
            .await
            .map_err(into_authorization_error)?;

        (0..tuples.len())
            .map(|i| match response.result.remove(&i.to_string()) {
                Some(BatchCheckSingleResult {
                    error: Some(error), ..
                }) => Err(AuthorizationServiceError::BadResponse(
                    format!("check of {} failed: {}", tuples[i], error.message).into(),
                )),
                Some(BatchCheckSingleResult { allowed, .. }) => Ok(allowed),
                None => Err(AuthorizationServiceError::BadResponse(
                    format!("batch-check response has no outcome for {}", tuples[i]).into(),
                )),
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl AuthorizationClient for OpenFgaAuthorizationClient {
    #[tracing::instrument(
        level = "debug",
        name = "OpenFgaAuthorizationClient::check_batch",
        skip_all,
        fields(num_tuples = tuples.len(), mode = ?self.config.batch_mode)
    )]
    async fn check_batch(&self, tuples: &[Tuple]) -> Result<Vec<bool>, AuthorizationServiceError> {
        if tuples.is_empty() {
            return Ok(Vec::new());
        }

        let connection = self.connection().await?;

        match self.config.batch_mode {
            OpenFgaBatchMode::Native => {
                let mut outcomes = Vec::with_capacity(tuples.len());
                for chunk in tuples.chunks(self.config.max_batch_size.max(1)) {
                    outcomes.extend(self.batch_check_chunk(connection, chunk).await?);
                }
                Ok(outcomes)
            }
            OpenFgaBatchMode::Compat => {
                let checks: Vec<_> = tuples
                    .iter()
                    .map(|tuple| self.check_one(connection, tuple))
                    .collect();

                futures::stream::iter(checks)
                    .buffered(self.config.max_concurrent_checks.max(1))
                    .try_collect()
                    .await
            }
        }
    }

    #[tracing::instrument(
        level = "debug",
        name = "OpenFgaAuthorizationClient::write",
        skip_all,
        fields(num_writes = writes.len())
    )]
    async fn write(&self, writes: &[TupleWrite]) -> Result<(), WriteTuplesError> {
        if writes.is_empty() {
            return Ok(());
        }

        let connection = self
            .connection()
            .await
            .map_err(AuthorizationServiceError::from)?;

        let (grants, revokes): (Vec<_>, Vec<_>) = writes
            .iter()
            .partition(|write| matches!(write, TupleWrite::Grant(_)));

        let body = WriteRequest {
            writes: self.tuple_keys(&grants),
            deletes: self.tuple_keys(&revokes),
            authorization_model_id: self.config.authorization_model_id.as_deref(),
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT_WRITE, || {
            self.authorize(connection.client.post(connection.write_url.clone()).json(&body))
        })
        .await
        .map_err(into_authorization_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response
                .text()
                .await
                .map_err(|e| into_authorization_error(HttpCallError::transport(ENDPOINT_WRITE, e)))?;

            if let Some(conflict) = classify_write_conflict(&body, writes) {
                return Err(conflict);
            }

            return Err(into_authorization_error(HttpCallError::UnexpectedStatus {
                endpoint: ENDPOINT_WRITE.to_string(),
                status,
                body,
            })
            .into());
        }

        ensure_success(ENDPOINT_WRITE, response)
            .await
            .map_err(into_authorization_error)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn into_authorization_error(e: HttpCallError) -> AuthorizationServiceError {
    tracing::warn!(error = ?e, error_msg = %e, "Authorization request failed");

    if e.is_timeout() {
        AuthorizationServiceError::Timeout
    } else if e.is_unavailable() {
        AuthorizationServiceError::Unavailable(Box::new(e))
    } else {
        AuthorizationServiceError::BadResponse(Box::new(e))
    }
}

/// OpenFGA rejects the whole write with `400` when a written tuple exists or
/// a deleted one does not. Older servers report both cases with one message,
/// in which case the kind of writes decides.
fn classify_write_conflict(body: &str, writes: &[TupleWrite]) -> Option<WriteTuplesError> {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());

    if !message.contains("already exist") && !message.contains("not exist") {
        return None;
    }

    if message.contains("cannot delete") {
        return Some(WriteTuplesError::NotFound);
    }
    if message.contains("cannot write") {
        return Some(WriteTuplesError::AlreadyExists);
    }

    if writes.iter().all(|w| matches!(w, TupleWrite::Revoke(_))) {
        Some(WriteTuplesError::NotFound)
    } else {
        Some(WriteTuplesError::AlreadyExists)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Wire format
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
struct TupleKey<'a> {
    user: String,
    relation: &'a str,
    object: String,
}

#[derive(Serialize)]
struct CheckRequest<'a> {
    tuple_key: TupleKey<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    allowed: bool,
}

#[derive(Serialize)]
struct BatchCheckRequest<'a> {
    checks: Vec<BatchCheckItem<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<&'a str>,
}

#[derive(Serialize)]
struct BatchCheckItem<'a> {
    tuple_key: TupleKey<'a>,
    correlation_id: String,
}

#[derive(Deserialize)]
struct BatchCheckResponse {
    #[serde(default)]
    result: HashMap<String, BatchCheckSingleResult>,
}

#[derive(Deserialize)]
struct BatchCheckSingleResult {
    #[serde(default)]
    allowed: bool,
    #[serde(default)]
    error: Option<ErrorResponse>,
}

#[derive(Serialize)]
struct TupleKeys<'a> {
    tuple_keys: Vec<TupleKey<'a>>,
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    writes: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deletes: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_model_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
