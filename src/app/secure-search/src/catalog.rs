// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use dill::CatalogBuilder;
use secure_search::{DecisionCacheConfig, IngestionConfig, SecureRetrieverConfig, VectorIndexClient};
use secure_search_inmem::{
    DummyEmbeddingClient,
    DummyEmbeddingConfig,
    InMemoryAuthorizationStore,
    InMemoryVectorIndex,
};
use secure_search_openai::{OpenAiEmbeddingClient, OpenAiEmbeddingConfig};
use secure_search_openfga::{OpenFgaAuthorizationClient, OpenFgaConfig};
use secure_search_qdrant::QdrantVectorIndex;
use time_source::SystemTimeSourceDefault;

use crate::{AuthorizationConfig, EmbeddingsConfig, IndexConfig, SecureSearchConfig};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Binds the client traits to the configured backends and registers the
/// retrieval and ingestion services on top of them
pub fn configure_catalog(config: &SecureSearchConfig) -> CatalogBuilder {
    let mut b = CatalogBuilder::new();

    b.add::<SystemTimeSourceDefault>();

    b.add_value(SecureRetrieverConfig::from(&config.retriever));
    b.add_value(DecisionCacheConfig::from(&config.decision_cache));
    b.add_value(IngestionConfig::from(&config.ingestion));

    match &config.embeddings {
        EmbeddingsConfig::Dummy(c) => {
            b.add_value(DummyEmbeddingConfig {
                dimensions: c.dimensions,
            });
            b.add::<DummyEmbeddingClient>();
        }
        EmbeddingsConfig::OpenAi(c) => {
            b.add_value(OpenAiEmbeddingConfig::from(c));
            b.add::<OpenAiEmbeddingClient>();
        }
    }

    match &config.index {
        IndexConfig::InMemory(c) => {
            b.add_value(InMemoryVectorIndex::with_indexing_lag(c.indexing_lag))
                .bind::<dyn VectorIndexClient, InMemoryVectorIndex>();
        }
        IndexConfig::Qdrant(c) => {
            b.add_value(c.to_client_config(config.embeddings.dimensions()));
            b.add::<QdrantVectorIndex>();
        }
    }

    match &config.authorization {
        AuthorizationConfig::InMemory => {
            b.add::<InMemoryAuthorizationStore>();
        }
        AuthorizationConfig::OpenFga(c) => {
            b.add_value(OpenFgaConfig::from(c));
            b.add::<OpenFgaAuthorizationClient>();
        }
    }

    secure_search_services::register_dependencies(&mut b, config.decision_cache.enabled);

    tracing::debug!(
        dimensions = config.embeddings.dimensions(),
        decision_cache_enabled = config.decision_cache.enabled,
        "Configured secure search catalog",
    );

    b
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
