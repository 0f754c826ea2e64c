// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use dill::{Singleton, component, interface, scope};
use secure_search::{Candidate, IndexError, VectorIndexClient};
use tokio::sync::RwLock;
use tokio::time::Instant;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct Point {
    vector: Vec<f32>,
    payload: serde_json::Value,
    seq: u64,
    visible_at: Instant,
}

#[derive(Default)]
struct State {
    points: HashMap<String, Point>,
    next_seq: u64,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Brute-force cosine similarity index.
///
/// Equal scores are ordered by insertion. An optional indexing lag delays
/// visibility of upserted points to mimic eventually consistent engines.
pub struct InMemoryVectorIndex {
    indexing_lag: Duration,
    state: Arc<RwLock<State>>,
}

#[component(pub)]
#[interface(dyn VectorIndexClient)]
#[scope(Singleton)]
impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::with_indexing_lag(Duration::ZERO)
    }

    pub fn with_indexing_lag(indexing_lag: Duration) -> Self {
        Self {
            indexing_lag,
            state: Default::default(),
        }
    }

    pub async fn num_points(&self) -> usize {
        self.state.read().await.points.len()
    }
}

#[async_trait::async_trait]
impl VectorIndexClient for InMemoryVectorIndex {
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        exclude_ids: &HashSet<String>,
    ) -> Result<Vec<Candidate>, IndexError> {
        let now = Instant::now();
        let state = self.state.read().await;

        let mut scored: Vec<(&String, &Point, f32)> = state
            .points
            .iter()
            .filter(|(id, point)| point.visible_at <= now && !exclude_ids.contains(*id))
            .map(|(id, point)| (id, point, cosine_similarity(vector, &point.vector)))
            .collect();

        scored.sort_by(|(_, a, score_a), (_, b, score_b)| {
            score_b.total_cmp(score_a).then(a.seq.cmp(&b.seq))
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(rank, (id, point, score))| Candidate {
                item_id: id.clone(),
                rank,
                score,
                payload: point.payload.clone(),
            })
            .collect())
    }

    async fn upsert(
        &self,
        item_id: &str,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> Result<(), IndexError> {
        let mut state = self.state.write().await;

        let seq = state.next_seq;
        state.next_seq += 1;

        state.points.insert(
            item_id.to_string(),
            Point {
                vector,
                payload,
                seq,
                visible_at: Instant::now() + self.indexing_lag,
            },
        );
        Ok(())
    }

    async fn delete(&self, item_id: &str) -> Result<(), IndexError> {
        let mut state = self.state.write().await;
        state.points.remove(item_id);
        Ok(())
    }

    async fn contains(&self, item_id: &str) -> Result<bool, IndexError> {
        let state = self.state.read().await;
        Ok(state
            .points
            .get(item_id)
            .is_some_and(|point| point.visible_at <= Instant::now()))
    }

    fn indexing_lag_bound(&self) -> Duration {
        self.indexing_lag
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
