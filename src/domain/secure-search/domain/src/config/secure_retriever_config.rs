// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureRetrieverConfig {
    /// Multiplier applied to K to size the first fetch, reflects the expected
    /// worst-case share of denied candidates. Values below 2 are raised to 2.
    pub over_fetch_factor: usize,
    /// Minimum number of extra candidates fetched on top of K
    pub slack: usize,
    pub default_max_over_fetch_rounds: usize,
    pub default_batch_size: usize,
    /// How many authorization batches of one round may be in flight at once
    pub max_concurrent_batches: usize,
    pub embedding_timeout: Duration,
    pub index_timeout: Duration,
    pub authorization_timeout: Duration,
}

impl SecureRetrieverConfig {
    pub const MIN_OVER_FETCH_FACTOR: usize = 2;

    pub fn initial_fetch_size(&self, desired_count: usize) -> usize {
        let factor = self.over_fetch_factor.max(Self::MIN_OVER_FETCH_FACTOR);
        desired_count
            .saturating_mul(factor)
            .max(desired_count.saturating_add(self.slack))
    }
}

impl Default for SecureRetrieverConfig {
    fn default() -> Self {
        Self {
            over_fetch_factor: 2,
            slack: 5,
            default_max_over_fetch_rounds: 3,
            default_batch_size: 10,
            max_concurrent_batches: 4,
            embedding_timeout: Duration::from_secs(10),
            index_timeout: Duration::from_secs(5),
            authorization_timeout: Duration::from_secs(5),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
