// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;
use std::sync::Arc;

use dill::{component, interface};
use futures::{StreamExt, TryStreamExt};
use secure_search::*;

use crate::DecisionResolver;
use crate::upstream_call::{Interrupted, guard_upstream_call};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct SecureRetrieverImpl {
    config: Arc<SecureRetrieverConfig>,
    embedding_client: Arc<dyn EmbeddingClient>,
    vector_index: Arc<dyn VectorIndexClient>,
    decision_resolver: Arc<DecisionResolver>,
}

#[component(pub)]
#[interface(dyn SecureRetriever)]
impl SecureRetrieverImpl {
    pub fn new(
        config: Arc<SecureRetrieverConfig>,
        embedding_client: Arc<dyn EmbeddingClient>,
        vector_index: Arc<dyn VectorIndexClient>,
        decision_resolver: Arc<DecisionResolver>,
    ) -> Self {
        Self {
            config,
            embedding_client,
            vector_index,
            decision_resolver,
        }
    }

    async fn embed_query(
        &self,
        ctx: &RetrievalContext,
        query_text: &str,
    ) -> Result<Vec<f32>, RetrieveError> {
        match guard_upstream_call(
            &ctx.cancellation,
            self.config.embedding_timeout,
            self.embedding_client.embed(query_text),
        )
        .await
        {
            Ok(res) => Ok(res?),
            Err(Interrupted::Canceled) => Err(RetrieveError::RequestCanceled),
            Err(Interrupted::TimedOut) => Err(EmbeddingError::Timeout.into()),
        }
    }

    async fn search_index(
        &self,
        ctx: &RetrievalContext,
        query_vector: &[f32],
        fetch_size: usize,
        seen: &HashSet<String>,
    ) -> Result<Vec<Candidate>, RetrieveError> {
        match guard_upstream_call(
            &ctx.cancellation,
            self.config.index_timeout,
            self.vector_index.search(query_vector, fetch_size, seen),
        )
        .await
        {
            Ok(res) => Ok(res?),
            Err(Interrupted::Canceled) => Err(RetrieveError::RequestCanceled),
            Err(Interrupted::TimedOut) => Err(IndexError::Timeout.into()),
        }
    }

    async fn check_batch(
        &self,
        ctx: &RetrievalContext,
        tuples: &[Tuple],
    ) -> Result<Vec<bool>, RetrieveError> {
        match guard_upstream_call(
            &ctx.cancellation,
            self.config.authorization_timeout,
            self.decision_resolver.resolve(tuples),
        )
        .await
        {
            Ok(res) => Ok(res?),
            Err(Interrupted::Canceled) => Err(RetrieveError::RequestCanceled),
            Err(Interrupted::TimedOut) => Err(AuthorizationServiceError::Timeout.into()),
        }
    }

    /// Checks candidates of one round in batches and appends the allowed ones
    /// to `accepted` in rank order until it holds `desired_count` items.
    ///
    /// Batches are checked concurrently but consumed strictly in order, so the
    /// outcome does not depend on which check completes first. Batches still
    /// in flight when the target is reached are dropped.
    async fn authorize_round(
        &self,
        ctx: &RetrievalContext,
        params: &RetrievalParams<'_>,
        candidates: Vec<Candidate>,
        accepted: &mut Vec<Candidate>,
        counters: &mut RetrievalCounters,
    ) -> Result<(), RetrieveError> {
        let checks: Vec<_> = candidates
            .chunks(params.batch_size)
            .map(<[Candidate]>::to_vec)
            .map(|batch| {
                let tuples: Vec<Tuple> = batch
                    .iter()
                    .map(|c| Tuple::viewer(params.subject_id, c.item_id.as_str()))
                    .collect();

                async move {
                    let outcomes = self.check_batch(ctx, &tuples).await?;
                    Ok::<_, RetrieveError>((batch, outcomes))
                }
            })
            .collect();

        let mut checked_batches =
            futures::stream::iter(checks).buffered(self.config.max_concurrent_batches.max(1));

        while let Some((batch, outcomes)) = checked_batches.try_next().await? {
            for (mut candidate, allowed) in batch.into_iter().zip(outcomes) {
                counters.evaluated += 1;

                if allowed {
                    candidate.rank = accepted.len();
                    accepted.push(candidate);
                    if accepted.len() >= params.desired_count {
                        return Ok(());
                    }
                } else {
                    counters.denied += 1;
                    tracing::trace!(item_id = %candidate.item_id, "Candidate denied");
                }
            }
        }

        Ok(())
    }

    async fn retrieve_impl(
        &self,
        ctx: &RetrievalContext,
        request: &RetrievalRequest,
    ) -> Result<RetrievalResult, RetrieveError> {
        request.validate()?;

        let params = RetrievalParams {
            subject_id: &request.subject_id,
            desired_count: request.desired_count,
            max_rounds: request
                .max_over_fetch_rounds
                .unwrap_or(self.config.default_max_over_fetch_rounds)
                .max(1),
            batch_size: request
                .batch_size
                .unwrap_or(self.config.default_batch_size)
                .max(1),
        };

        let query_vector = self.embed_query(ctx, &request.query_text).await?;

        let mut fetch_size = self.config.initial_fetch_size(params.desired_count);
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<Candidate> = Vec::with_capacity(params.desired_count);
        let mut counters = RetrievalCounters::default();

        let completeness = loop {
            counters.rounds += 1;

            let mut returned = self
                .search_index(ctx, &query_vector, fetch_size, &seen)
                .await?;

            let index_exhausted = returned.len() < fetch_size;
            returned.truncate(fetch_size);

            // Items the index returned despite being excluded are not evaluated again
            let candidates: Vec<Candidate> = returned
                .into_iter()
                .filter(|c| seen.insert(c.item_id.clone()))
                .collect();

            let num_candidates = candidates.len();
            let num_accepted_before = accepted.len();

            self.authorize_round(ctx, &params, candidates, &mut accepted, &mut counters)
                .await?;

            tracing::debug!(
                round = counters.rounds,
                fetch_size,
                num_candidates,
                num_allowed = accepted.len() - num_accepted_before,
                num_accepted = accepted.len(),
                index_exhausted,
                "Completed retrieval round",
            );

            if accepted.len() >= params.desired_count {
                break RetrievalCompleteness::Complete;
            }
            if index_exhausted {
                break RetrievalCompleteness::IndexExhausted;
            }
            if counters.rounds >= params.max_rounds {
                break RetrievalCompleteness::RoundLimitReached;
            }

            fetch_size = fetch_size.saturating_mul(2);
        };

        tracing::debug!(
            ?completeness,
            num_items = accepted.len(),
            rounds = counters.rounds,
            candidates_evaluated = counters.evaluated,
            candidates_denied = counters.denied,
            "Retrieval finished",
        );

        Ok(RetrievalResult {
            items: accepted,
            completeness,
        })
    }
}

#[async_trait::async_trait]
impl SecureRetriever for SecureRetrieverImpl {
    #[tracing::instrument(
        level = "debug",
        name = "SecureRetrieverImpl::retrieve",
        skip_all,
        fields(subject_id = %request.subject_id, desired_count = request.desired_count)
    )]
    async fn retrieve(
        &self,
        ctx: &RetrievalContext,
        request: RetrievalRequest,
    ) -> Result<RetrievalResult, RetrieveError> {
        match self.retrieve_impl(ctx, &request).await {
            Ok(result) => Ok(result),
            Err(e @ (RetrieveError::RequestCanceled | RetrieveError::InvalidRequest(_))) => {
                tracing::debug!(error = ?e, error_msg = %e, "Retrieval rejected");
                Err(e)
            }
            Err(e) => {
                tracing::error!(error = ?e, error_msg = %e, "Retrieval failed");
                Err(e)
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct RetrievalParams<'a> {
    subject_id: &'a str,
    desired_count: usize,
    max_rounds: usize,
    batch_size: usize,
}

/// Per-request counters, only ever logged
#[derive(Debug, Default)]
struct RetrievalCounters {
    rounds: usize,
    evaluated: usize,
    denied: usize,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
