// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::{BoxedError, InternalError};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Turns text into a fixed-dimension embedding vector.
///
/// The model is part of the client configuration so that the query side and
/// the ingestion side always produce vectors in the same space.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Length of every vector returned by [`EmbeddingClient::embed`]
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding service is unavailable")]
    Unavailable(#[source] BoxedError),

    #[error("Embedding service did not respond in time")]
    Timeout,

    #[error("Embedding service returned an unexpected response")]
    BadResponse(#[source] BoxedError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Expected embedding of {expected} dimensions but got {actual}")]
pub struct DimensionMismatchError {
    pub expected: usize,
    pub actual: usize,
}

/// Rejects vectors that would not fit the index
pub fn ensure_dimensions(vector: Vec<f32>, expected: usize) -> Result<Vec<f32>, EmbeddingError> {
    if vector.len() == expected {
        Ok(vector)
    } else {
        Err(EmbeddingError::BadResponse(Box::new(
            DimensionMismatchError {
                expected,
                actual: vector.len(),
            },
        )))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
