// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::Candidate;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Explains why a result holds as many items as it does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalCompleteness {
    /// The desired number of authorized items was found
    Complete,
    /// Fewer items were found because the index has nothing more to offer
    IndexExhausted,
    /// Fewer items were found because the retriever stopped backfilling after
    /// the allowed number of rounds. More authorized items may exist.
    RoundLimitReached,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Authorized items in similarity order. `rank` is the position of the
    /// item within this result, so it carries nothing about filtered items.
    pub items: Vec<Candidate>,
    pub completeness: RetrievalCompleteness,
}

impl RetrievalResult {
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|c| c.item_id.as_str()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.completeness == RetrievalCompleteness::Complete
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
