// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use http_common::RetryPolicy;
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const CONFIG_KIND: &str = "SecureSearchConfig";
pub const CONFIG_VERSION: u64 = 1;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Root of the configuration file. Durations are expressed in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SecureSearchConfig {
    /// Over-fetch and backfill tuning
    pub retriever: RetrieverConfig,

    /// Memoization of authorization outcomes
    pub decision_cache: DecisionCachingConfig,

    /// Admission of new resources
    pub ingestion: IngestConfig,

    /// Text embeddings provider
    pub embeddings: EmbeddingsConfig,

    /// Vector index backend
    pub index: IndexConfig,

    /// Authorization service backend
    pub authorization: AuthorizationConfig,

    pub logging: LoggingConfig,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Retriever
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetrieverConfig {
    pub over_fetch_factor: usize,
    pub slack: usize,
    pub max_over_fetch_rounds: usize,
    pub batch_size: usize,
    pub max_concurrent_batches: usize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub embedding_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub index_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub authorization_timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        secure_search::SecureRetrieverConfig::default().into()
    }
}

impl From<secure_search::SecureRetrieverConfig> for RetrieverConfig {
    fn from(value: secure_search::SecureRetrieverConfig) -> Self {
        Self {
            over_fetch_factor: value.over_fetch_factor,
            slack: value.slack,
            max_over_fetch_rounds: value.default_max_over_fetch_rounds,
            batch_size: value.default_batch_size,
            max_concurrent_batches: value.max_concurrent_batches,
            embedding_timeout: value.embedding_timeout,
            index_timeout: value.index_timeout,
            authorization_timeout: value.authorization_timeout,
        }
    }
}

impl From<&RetrieverConfig> for secure_search::SecureRetrieverConfig {
    fn from(value: &RetrieverConfig) -> Self {
        Self {
            over_fetch_factor: value.over_fetch_factor,
            slack: value.slack,
            default_max_over_fetch_rounds: value.max_over_fetch_rounds,
            default_batch_size: value.batch_size,
            max_concurrent_batches: value.max_concurrent_batches,
            embedding_timeout: value.embedding_timeout,
            index_timeout: value.index_timeout,
            authorization_timeout: value.authorization_timeout,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Decision cache
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DecisionCachingConfig {
    /// When disabled every check goes to the authorization service
    pub enabled: bool,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for DecisionCachingConfig {
    fn default() -> Self {
        let defaults = secure_search::DecisionCacheConfig::default();
        Self {
            enabled: true,
            ttl: defaults.ttl,
            max_entries: defaults.max_entries,
        }
    }
}

impl From<&DecisionCachingConfig> for secure_search::DecisionCacheConfig {
    fn from(value: &DecisionCachingConfig) -> Self {
        Self {
            ttl: value.ttl,
            max_entries: value.max_entries,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Ingestion
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IngestConfig {
    pub payload_include_content: bool,
    pub wait_until_searchable: bool,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub readiness_poll_interval: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub readiness_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let defaults = secure_search::IngestionConfig::default();
        Self {
            payload_include_content: defaults.payload_include_content,
            wait_until_searchable: defaults.wait_until_searchable,
            readiness_poll_interval: defaults.readiness_poll_interval,
            readiness_timeout: defaults.readiness_timeout,
        }
    }
}

impl From<&IngestConfig> for secure_search::IngestionConfig {
    fn from(value: &IngestConfig) -> Self {
        Self {
            payload_include_content: value.payload_include_content,
            wait_until_searchable: value.wait_until_searchable,
            readiness_poll_interval: value.readiness_poll_interval,
            readiness_timeout: value.readiness_timeout,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Embeddings
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "provider")]
pub enum EmbeddingsConfig {
    /// Deterministic hashing embeddings for demos and tests
    Dummy(DummyEmbeddingsConfig),
    OpenAi(OpenAiEmbeddingsConfig),
}

impl EmbeddingsConfig {
    pub fn dimensions(&self) -> usize {
        match self {
            Self::Dummy(c) => c.dimensions,
            Self::OpenAi(c) => c.dimensions,
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self::Dummy(DummyEmbeddingsConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DummyEmbeddingsConfig {
    pub dimensions: usize,
}

impl Default for DummyEmbeddingsConfig {
    fn default() -> Self {
        Self {
            dimensions: secure_search_inmem::DummyEmbeddingConfig::default().dimensions,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OpenAiEmbeddingsConfig {
    pub url: String,
    pub api_key: Option<String>,
    /// Switches to Azure OpenAI, where `url` points to a deployment
    pub azure_api_version: Option<String>,
    pub model: String,
    pub dimensions: usize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for OpenAiEmbeddingsConfig {
    fn default() -> Self {
        let defaults = secure_search_openai::OpenAiEmbeddingConfig::default();
        Self {
            url: defaults.url,
            api_key: None,
            azure_api_version: None,
            model: defaults.model,
            dimensions: defaults.dimensions,
            timeout: defaults.timeout,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&OpenAiEmbeddingsConfig> for secure_search_openai::OpenAiEmbeddingConfig {
    fn from(value: &OpenAiEmbeddingsConfig) -> Self {
        use secure_search_openai::OpenAiFlavor;

        Self {
            flavor: match &value.azure_api_version {
                Some(api_version) => OpenAiFlavor::Azure {
                    api_version: api_version.clone(),
                },
                None => OpenAiFlavor::OpenAi,
            },
            url: value.url.clone(),
            api_key: value.api_key.clone(),
            model: value.model.clone(),
            dimensions: value.dimensions,
            timeout: value.timeout,
            retry_policy: value.retry,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Vector index
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "provider")]
pub enum IndexConfig {
    InMemory(InMemoryIndexConfig),
    Qdrant(QdrantIndexConfig),
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::InMemory(InMemoryIndexConfig::default())
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InMemoryIndexConfig {
    /// Artificial delay before upserted vectors become searchable
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub indexing_lag: Duration,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QdrantIndexConfig {
    pub url: String,
    pub collection: String,
    pub api_key: Option<String>,
    pub create_collection: bool,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for QdrantIndexConfig {
    fn default() -> Self {
        let defaults = secure_search_qdrant::QdrantConfig::default();
        Self {
            url: defaults.url,
            collection: defaults.collection,
            api_key: None,
            create_collection: defaults.create_collection,
            timeout: defaults.timeout,
            retry: RetryPolicy::default(),
        }
    }
}

impl QdrantIndexConfig {
    /// Vector size of the collection always follows the embeddings provider
    pub fn to_client_config(&self, dimensions: usize) -> secure_search_qdrant::QdrantConfig {
        secure_search_qdrant::QdrantConfig {
            url: self.url.clone(),
            collection: self.collection.clone(),
            api_key: self.api_key.clone(),
            dimensions,
            create_collection: self.create_collection,
            timeout: self.timeout,
            retry_policy: self.retry,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Authorization
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "provider")]
pub enum AuthorizationConfig {
    /// Process-local tuple store, lost on restart
    #[default]
    InMemory,
    OpenFga(OpenFgaAuthorizationConfig),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum BatchMode {
    #[default]
    Native,
    Compat,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OpenFgaAuthorizationConfig {
    pub url: String,
    pub store_id: String,
    pub authorization_model_id: Option<String>,
    pub api_token: Option<String>,
    pub user_type: String,
    pub object_type: String,
    pub batch_mode: BatchMode,
    pub max_batch_size: usize,
    pub max_concurrent_checks: usize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for OpenFgaAuthorizationConfig {
    fn default() -> Self {
        let defaults = secure_search_openfga::OpenFgaConfig::default();
        Self {
            url: defaults.url,
            store_id: defaults.store_id,
            authorization_model_id: None,
            api_token: None,
            user_type: defaults.user_type,
            object_type: defaults.object_type,
            batch_mode: BatchMode::Native,
            max_batch_size: defaults.max_batch_size,
            max_concurrent_checks: defaults.max_concurrent_checks,
            timeout: defaults.timeout,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&OpenFgaAuthorizationConfig> for secure_search_openfga::OpenFgaConfig {
    fn from(value: &OpenFgaAuthorizationConfig) -> Self {
        use secure_search_openfga::OpenFgaBatchMode;

        Self {
            url: value.url.clone(),
            store_id: value.store_id.clone(),
            authorization_model_id: value.authorization_model_id.clone(),
            api_token: value.api_token.clone(),
            user_type: value.user_type.clone(),
            object_type: value.object_type.clone(),
            batch_mode: match value.batch_mode {
                BatchMode::Native => OpenFgaBatchMode::Native,
                BatchMode::Compat => OpenFgaBatchMode::Compat,
            },
            max_batch_size: value.max_batch_size,
            max_concurrent_checks: value.max_concurrent_checks,
            timeout: value.timeout,
            retry_policy: value.retry,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Logging
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG` when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum LogFormat {
    /// Human-readable multi-line output on stderr
    #[default]
    Pretty,
    /// One JSON object per event on stderr
    Json,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
