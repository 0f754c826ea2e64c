// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{AuthorizationDecision, Tuple};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Short-lived memo of authorization outcomes shared by concurrent
/// retrievals.
///
/// Implementations must never return a decision older than their TTL.
/// Conflicting writes to the same tuple resolve as last-write-wins.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait DecisionCache: Send + Sync {
    async fn get(&self, tuple: &Tuple) -> Option<AuthorizationDecision>;

    /// Same as [`DecisionCache::get`] for every tuple, in input order
    async fn get_many(&self, tuples: &[Tuple]) -> Vec<Option<AuthorizationDecision>>;

    async fn put(&self, tuple: Tuple, allowed: bool);

    async fn put_many(&self, decisions: Vec<(Tuple, bool)>);

    async fn invalidate(&self, tuple: &Tuple);

    async fn clear(&self);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
