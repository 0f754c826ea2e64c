// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::Arc;

use dill::{Singleton, component, interface, scope};
use secure_search::{AuthorizationDecision, DecisionCache, DecisionCacheConfig, Tuple};
use time_source::SystemTimeSource;
use tokio::sync::RwLock;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct State {
    decisions: HashMap<Tuple, AuthorizationDecision>,
}

impl State {
    fn insert(&mut self, tuple: Tuple, decision: AuthorizationDecision, config: &DecisionCacheConfig) {
        if config.max_entries == 0 {
            return;
        }

        if !self.decisions.contains_key(&tuple) && self.decisions.len() >= config.max_entries {
            self.decisions
                .retain(|_, d| !d.is_expired(decision.decided_at, config.ttl));

            if self.decisions.len() >= config.max_entries {
                self.evict_oldest();
            }
        }

        self.decisions.insert(tuple, decision);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .decisions
            .iter()
            .min_by_key(|(_, d)| d.decided_at)
            .map(|(tuple, _)| tuple.clone());

        if let Some(tuple) = oldest {
            self.decisions.remove(&tuple);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Process-local decision cache with lazy expiration and a bounded number of
/// entries
pub struct InMemoryDecisionCache {
    config: Arc<DecisionCacheConfig>,
    time_source: Arc<dyn SystemTimeSource>,
    state: RwLock<State>,
}

#[component(pub)]
#[interface(dyn DecisionCache)]
#[scope(Singleton)]
impl InMemoryDecisionCache {
    pub fn new(config: Arc<DecisionCacheConfig>, time_source: Arc<dyn SystemTimeSource>) -> Self {
        Self {
            config,
            time_source,
            state: Default::default(),
        }
    }

    /// Number of stored entries, including expired ones not purged yet
    pub async fn num_entries(&self) -> usize {
        self.state.read().await.decisions.len()
    }

    fn fresh(&self, decision: Option<&AuthorizationDecision>) -> Option<AuthorizationDecision> {
        let now = self.time_source.now();
        decision
            .filter(|d| !d.is_expired(now, self.config.ttl))
            .copied()
    }
}

#[async_trait::async_trait]
impl DecisionCache for InMemoryDecisionCache {
    async fn get(&self, tuple: &Tuple) -> Option<AuthorizationDecision> {
        let state = self.state.read().await;
        self.fresh(state.decisions.get(tuple))
    }

    async fn get_many(&self, tuples: &[Tuple]) -> Vec<Option<AuthorizationDecision>> {
        let state = self.state.read().await;
        tuples
            .iter()
            .map(|tuple| self.fresh(state.decisions.get(tuple)))
            .collect()
    }

    async fn put(&self, tuple: Tuple, allowed: bool) {
        let decision = AuthorizationDecision::new(allowed, self.time_source.now());

        let mut state = self.state.write().await;
        state.insert(tuple, decision, &self.config);
    }

    async fn put_many(&self, decisions: Vec<(Tuple, bool)>) {
        let now = self.time_source.now();

        let mut state = self.state.write().await;
        for (tuple, allowed) in decisions {
            state.insert(tuple, AuthorizationDecision::new(allowed, now), &self.config);
        }
    }

    async fn invalidate(&self, tuple: &Tuple) {
        let mut state = self.state.write().await;
        state.decisions.remove(tuple);
    }

    async fn clear(&self) {
        let mut state = self.state.write().await;
        state.decisions.clear();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
