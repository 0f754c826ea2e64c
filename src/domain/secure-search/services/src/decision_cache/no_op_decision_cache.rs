// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use secure_search::{AuthorizationDecision, DecisionCache, Tuple};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Cache that remembers nothing, every lookup goes to the authorization
/// service
#[dill::component(pub)]
#[dill::interface(dyn DecisionCache)]
pub struct NoOpDecisionCache {}

#[async_trait::async_trait]
impl DecisionCache for NoOpDecisionCache {
    async fn get(&self, _tuple: &Tuple) -> Option<AuthorizationDecision> {
        None
    }

    async fn get_many(&self, tuples: &[Tuple]) -> Vec<Option<AuthorizationDecision>> {
        vec![None; tuples.len()]
    }

    async fn put(&self, _tuple: Tuple, _allowed: bool) {}

    async fn put_many(&self, _decisions: Vec<(Tuple, bool)>) {}

    async fn invalidate(&self, _tuple: &Tuple) {}

    async fn clear(&self) {}
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
