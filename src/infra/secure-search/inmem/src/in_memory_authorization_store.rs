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
use std::sync::atomic::{AtomicUsize, Ordering};

use dill::{Singleton, component, interface, scope};
use secure_search::{
    AuthorizationClient,
    AuthorizationServiceError,
    Tuple,
    TupleWrite,
    WriteTuplesError,
};
use tokio::sync::RwLock;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct State {
    tuples: HashSet<Tuple>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Authorization store that allows exactly the tuples written to it
pub struct InMemoryAuthorizationStore {
    state: Arc<RwLock<State>>,
    num_check_calls: AtomicUsize,
    num_checked_tuples: AtomicUsize,
}

#[component(pub)]
#[interface(dyn AuthorizationClient)]
#[scope(Singleton)]
impl InMemoryAuthorizationStore {
    pub fn new() -> Self {
        Self {
            state: Default::default(),
            num_check_calls: AtomicUsize::new(0),
            num_checked_tuples: AtomicUsize::new(0),
        }
    }

    pub async fn grant_all(&self, tuples: impl IntoIterator<Item = Tuple>) {
        let mut state = self.state.write().await;
        state.tuples.extend(tuples);
    }

    /// Number of `check_batch` round trips served so far
    pub fn num_check_calls(&self) -> usize {
        self.num_check_calls.load(Ordering::Relaxed)
    }

    pub fn num_checked_tuples(&self) -> usize {
        self.num_checked_tuples.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl AuthorizationClient for InMemoryAuthorizationStore {
    async fn check_batch(&self, tuples: &[Tuple]) -> Result<Vec<bool>, AuthorizationServiceError> {
        self.num_check_calls.fetch_add(1, Ordering::Relaxed);
        self.num_checked_tuples
            .fetch_add(tuples.len(), Ordering::Relaxed);

        let state = self.state.read().await;
        Ok(tuples.iter().map(|t| state.tuples.contains(t)).collect())
    }

    /// Writes are applied all or nothing
    async fn write(&self, writes: &[TupleWrite]) -> Result<(), WriteTuplesError> {
        let mut state = self.state.write().await;

        for write in writes {
            match write {
                TupleWrite::Grant(tuple) if state.tuples.contains(tuple) => {
                    return Err(WriteTuplesError::AlreadyExists);
                }
                TupleWrite::Revoke(tuple) if !state.tuples.contains(tuple) => {
                    return Err(WriteTuplesError::NotFound);
                }
                _ => {}
            }
        }

        for write in writes {
            match write {
                TupleWrite::Grant(tuple) => {
                    state.tuples.insert(tuple.clone());
                }
                TupleWrite::Revoke(tuple) => {
                    state.tuples.remove(tuple);
                }
            }
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
