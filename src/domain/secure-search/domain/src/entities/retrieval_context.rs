// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tokio_util::sync::CancellationToken;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Per-request execution context.
///
/// Cancelling the token aborts the retrieval at the next upstream call
/// boundary and discards everything collected so far.
#[derive(Debug, Clone, Default)]
pub struct RetrievalContext {
    pub cancellation: CancellationToken,
}

impl RetrievalContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
