// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secure_search::EmbeddingClient;
use secure_search_inmem::{DummyEmbeddingClient, DummyEmbeddingConfig};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test_log::test(tokio::test)]
async fn test_embeddings_are_deterministic_and_normalized() {
    let client = DummyEmbeddingClient::new(Arc::new(DummyEmbeddingConfig { dimensions: 32 }));

    let a = client.embed("Quarterly revenue report").await.unwrap();
    let b = client.embed("quarterly REVENUE report!").await.unwrap();

    assert_eq!(client.dimensions(), 32);
    assert_eq!(a.len(), 32);
    assert_eq!(a, b);
    assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
}

#[test_log::test(tokio::test)]
async fn test_shared_words_are_closer() {
    let client = DummyEmbeddingClient::new(Arc::new(DummyEmbeddingConfig::default()));

    let query = client.embed("revenue report").await.unwrap();
    let related = client.embed("annual revenue report").await.unwrap();
    let unrelated = client.embed("kitten").await.unwrap();

    assert!(dot(&query, &related) > dot(&query, &unrelated));
}

#[test_log::test(tokio::test)]
async fn test_empty_text_gives_zero_vector() {
    let client = DummyEmbeddingClient::new(Arc::new(DummyEmbeddingConfig { dimensions: 8 }));

    assert_eq!(client.embed("  ").await.unwrap(), vec![0.0; 8]);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
