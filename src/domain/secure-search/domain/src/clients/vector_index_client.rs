// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;
use std::time::Duration;

use internal_error::{BoxedError, InternalError};
use thiserror::Error;

use crate::Candidate;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Stores one embedding vector per item and finds the nearest items to a
/// query vector
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait VectorIndexClient: Send + Sync {
    /// Returns at most `limit` candidates in descending similarity, skipping
    /// items listed in `exclude_ids`. Ranks are relative to this response.
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        exclude_ids: &HashSet<String>,
    ) -> Result<Vec<Candidate>, IndexError>;

    /// Replaces any vector previously stored for the item
    async fn upsert(
        &self,
        item_id: &str,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> Result<(), IndexError>;

    /// Deleting an absent item is not an error
    async fn delete(&self, item_id: &str) -> Result<(), IndexError>;

    async fn contains(&self, item_id: &str) -> Result<bool, IndexError>;

    /// Upper bound on the delay between a successful upsert and the item
    /// becoming visible to [`VectorIndexClient::search`]
    fn indexing_lag_bound(&self) -> Duration;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Vector index is unavailable")]
    Unavailable(#[source] BoxedError),

    #[error("Vector index did not respond in time")]
    Timeout,

    #[error("Vector index returned an unexpected response")]
    BadResponse(#[source] BoxedError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
