// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use dill::{Singleton, component, interface, scope};
use http_common::{HttpCallError, build_http_client, decode_json_response, send_with_retry};
use internal_error::{InternalError, ResultIntoInternal};
use secure_search::{EmbeddingClient, EmbeddingError, ensure_dimensions};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use url::Url;

use crate::{OpenAiEmbeddingConfig, OpenAiFlavor};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ENDPOINT: &str = "embeddings";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct Connection {
    client: reqwest::Client,
    embeddings_url: Url,
}

pub struct OpenAiEmbeddingClient {
    config: Arc<OpenAiEmbeddingConfig>,
    connection: OnceCell<Connection>,
}

#[component(pub)]
#[interface(dyn EmbeddingClient)]
#[scope(Singleton)]
impl OpenAiEmbeddingClient {
    pub fn new(config: Arc<OpenAiEmbeddingConfig>) -> Self {
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

                Ok::<_, InternalError>(Connection {
                    client,
                    embeddings_url: self.embeddings_url()?,
                })
            })
            .await
    }

    fn embeddings_url(&self) -> Result<Url, InternalError> {
        let mut base = Url::parse(&self.config.url).context_int_err("invalid embeddings URL")?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base.join(ENDPOINT).int_err()?;
        if let OpenAiFlavor::Azure { api_version } = &self.config.flavor {
            url.query_pairs_mut().append_pair("api-version", api_version);
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let Some(api_key) = &self.config.api_key else {
            return request;
        };

        match self.config.flavor {
            OpenAiFlavor::OpenAi => request.bearer_auth(api_key),
            OpenAiFlavor::Azure { .. } => request.header("api-key", api_key),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    #[tracing::instrument(
        level = "debug",
        name = "OpenAiEmbeddingClient::embed",
        skip_all,
        fields(model = %self.config.model, text_len = text.len())
    )]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let connection = self.connection().await?;

        let body = EmbeddingsRequest {
            input: [text],
            model: &self.config.model,
        };

        let response = send_with_retry(&self.config.retry_policy, ENDPOINT, || {
            self.authorize(
                connection
                    .client
                    .post(connection.embeddings_url.clone())
                    .json(&body),
            )
        })
        .await
        .map_err(into_embedding_error)?;

        let response: EmbeddingsResponse = decode_json_response(ENDPOINT, response)
            .await
            .map_err(into_embedding_error)?;

        let Some(item) = response.data.into_iter().min_by_key(|item| item.index) else {
            return Err(EmbeddingError::BadResponse(
                "response contains no embeddings".into(),
            ));
        };

        ensure_dimensions(item.embedding, self.config.dimensions)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn into_embedding_error(e: HttpCallError) -> EmbeddingError {
    tracing::warn!(error = ?e, error_msg = %e, "Embeddings request failed");

    if e.is_timeout() {
        EmbeddingError::Timeout
    } else if e.is_unavailable() {
        EmbeddingError::Unavailable(Box::new(e))
    } else {
        EmbeddingError::BadResponse(Box::new(e))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Wire format
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
