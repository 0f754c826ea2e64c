// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use dill::component;
use internal_error::InternalError;
use secure_search::{AuthorizationClient, AuthorizationServiceError, DecisionCache, Tuple};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Resolves a batch of authorization checks, serving what it can from the
/// decision cache and sending only the misses to the authorization service
pub struct DecisionResolver {
    decision_cache: Arc<dyn DecisionCache>,
    authorization_client: Arc<dyn AuthorizationClient>,
}

#[component(pub)]
impl DecisionResolver {
    pub fn new(
        decision_cache: Arc<dyn DecisionCache>,
        authorization_client: Arc<dyn AuthorizationClient>,
    ) -> Self {
        Self {
            decision_cache,
            authorization_client,
        }
    }

    /// Returns one outcome per tuple in input order. Any failure of the
    /// authorization service fails the whole batch.
    #[tracing::instrument(level = "debug", skip_all, fields(num_tuples = tuples.len()))]
    pub async fn resolve(&self, tuples: &[Tuple]) -> Result<Vec<bool>, AuthorizationServiceError> {
        let mut outcomes: Vec<Option<bool>> = self
            .decision_cache
            .get_many(tuples)
            .await
            .into_iter()
            .map(|decision| decision.map(|d| d.allowed))
            .collect();

        let misses: Vec<Tuple> = tuples
            .iter()
            .zip(&outcomes)
            .filter(|(_, outcome)| outcome.is_none())
            .map(|(tuple, _)| tuple.clone())
            .collect();

        tracing::debug!(
            num_cached = tuples.len() - misses.len(),
            num_misses = misses.len(),
            "Resolved decisions from cache",
        );

        if !misses.is_empty() {
            let checked = self.authorization_client.check_batch(&misses).await?;

            if checked.len() != misses.len() {
                return Err(AuthorizationServiceError::BadResponse(Box::new(
                    CheckCountMismatchError {
                        requested: misses.len(),
                        received: checked.len(),
                    },
                )));
            }

            let mut checked_iter = checked.iter().copied();
            for outcome in outcomes.iter_mut().filter(|o| o.is_none()) {
                *outcome = checked_iter.next();
            }

            self.decision_cache
                .put_many(misses.into_iter().zip(checked).collect())
                .await;
        }

        outcomes
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| InternalError::new("Authorization outcome left unresolved").into())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
#[error("Requested {requested} authorization checks but received {received} outcomes")]
struct CheckCountMismatchError {
    requested: usize,
    received: usize,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
