// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use dill::{component, interface};
use secure_search::{EmbeddingClient, EmbeddingError};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyEmbeddingConfig {
    pub dimensions: usize,
}

impl Default for DummyEmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 64 }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Deterministic bag-of-words embedding that needs no model.
///
/// Every lowercased word is hashed into one of the dimensions, so texts
/// sharing words end up close to each other.
pub struct DummyEmbeddingClient {
    config: Arc<DummyEmbeddingConfig>,
}

#[component(pub)]
#[interface(dyn EmbeddingClient)]
impl DummyEmbeddingClient {
    pub fn new(config: Arc<DummyEmbeddingConfig>) -> Self {
        Self { config }
    }

    fn bucket(&self, word: &str) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        usize::try_from(hash % self.config.dimensions as u64).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for DummyEmbeddingClient {
    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.config.dimensions];
        if vector.is_empty() {
            return Ok(vector);
        }

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&word.to_lowercase())] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(vector)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
