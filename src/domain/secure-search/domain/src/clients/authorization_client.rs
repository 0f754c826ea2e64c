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

use crate::{Tuple, TupleWrite};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Evaluates and maintains relationship tuples in an external policy engine.
///
/// Checks are always batched: per-item round trips would dominate retrieval
/// latency.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Returns one outcome per tuple, in the order of the input
    async fn check_batch(&self, tuples: &[Tuple]) -> Result<Vec<bool>, AuthorizationServiceError>;

    async fn write(&self, writes: &[TupleWrite]) -> Result<(), WriteTuplesError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum AuthorizationServiceError {
    #[error("Authorization service is unavailable")]
    Unavailable(#[source] BoxedError),

    #[error("Authorization service did not respond in time")]
    Timeout,

    #[error("Authorization service returned an unexpected response")]
    BadResponse(#[source] BoxedError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum WriteTuplesError {
    #[error("Tuple already exists")]
    AlreadyExists,

    #[error("Tuple does not exist")]
    NotFound,

    #[error(transparent)]
    Service(#[from] AuthorizationServiceError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
