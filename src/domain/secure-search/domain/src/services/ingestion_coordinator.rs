// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use internal_error::InternalError;
use thiserror::Error;

use crate::{AuthorizationServiceError, EmbeddingError, IndexError};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Makes resources searchable and controls who can find them
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait IngestionCoordinator: Send + Sync {
    /// Embeds and indexes the content, then grants the subject the viewer
    /// relation on the resource. Re-admitting a resource replaces its vector.
    async fn admit(
        &self,
        subject_id: &str,
        resource_id: &str,
        content: &str,
    ) -> Result<(), AdmitError>;

    /// Withdraws the viewer relation. The vector stays in the index.
    async fn revoke(&self, subject_id: &str, resource_id: &str) -> Result<(), RevokeError>;

    /// Drops the vector of the resource. Authorization tuples are untouched.
    async fn remove(&self, resource_id: &str) -> Result<(), RemoveError>;

    /// Resolves once a freshly admitted resource is visible to searches
    async fn wait_until_searchable(&self, resource_id: &str) -> Result<(), AdmitError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum AdmitError {
    #[error("Failed to embed the content")]
    EmbeddingFailure(#[from] EmbeddingError),

    #[error("Failed to store the vector")]
    IndexUnavailable(#[from] IndexError),

    #[error(transparent)]
    PartialIngestion(#[from] PartialIngestionError),

    #[error(transparent)]
    IndexNotReady(#[from] IndexNotReadyError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// The vector was stored but the authorization tuple was not, so the resource
/// is indexed yet invisible to the subject
#[derive(Error, Debug)]
#[error("Resource '{resource_id}' was indexed but granting access to '{subject_id}' failed")]
pub struct PartialIngestionError {
    pub subject_id: String,
    pub resource_id: String,
    #[source]
    pub source: AuthorizationServiceError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Resource '{resource_id}' did not become searchable within {waited:?}")]
pub struct IndexNotReadyError {
    pub resource_id: String,
    pub waited: Duration,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum RevokeError {
    #[error(transparent)]
    AuthorizationServiceError(#[from] AuthorizationServiceError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum RemoveError {
    #[error("Failed to delete the vector")]
    IndexUnavailable(#[from] IndexError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
