// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;
use thiserror::Error;

use crate::{
    AuthorizationServiceError,
    EmbeddingError,
    IndexError,
    RetrievalContext,
    RetrievalRequest,
    RetrievalResult,
};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Finds the top-K items most similar to a query among the items the
/// requesting subject is allowed to view.
///
/// Denied items never influence the result beyond being skipped: their ids,
/// content and ranks are not returned.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait SecureRetriever: Send + Sync {
    async fn retrieve(
        &self,
        ctx: &RetrievalContext,
        request: RetrievalRequest,
    ) -> Result<RetrievalResult, RetrieveError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequestError),

    #[error("Failed to embed the query")]
    EmbeddingFailure(#[from] EmbeddingError),

    #[error("Failed to search the vector index")]
    IndexUnavailable(#[from] IndexError),

    #[error("Failed to check authorization of candidates")]
    AuthorizationServiceError(#[from] AuthorizationServiceError),

    #[error("Retrieval request was canceled")]
    RequestCanceled,

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl RetrieveError {
    /// True when a dependency the query path relies on could not be used even
    /// after its own retries
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, Self::EmbeddingFailure(_) | Self::IndexUnavailable(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid retrieval request: {reason}")]
pub struct InvalidRequestError {
    pub reason: String,
}

impl InvalidRequestError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
