// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupted {
    Canceled,
    TimedOut,
}

/// Awaits a call to an external service unless the request gets canceled or
/// the call outlives its timeout. In both cases the call future is dropped.
pub(crate) async fn guard_upstream_call<F>(
    cancellation: &CancellationToken,
    timeout: Duration,
    call: F,
) -> Result<F::Output, Interrupted>
where
    F: Future,
{
    tokio::select! {
        biased;

        () = cancellation.cancelled() => Err(Interrupted::Canceled),
        res = tokio::time::timeout(timeout, call) => res.map_err(|_| Interrupted::TimedOut),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
