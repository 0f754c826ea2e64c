// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_retry::strategy::ExponentialBackoff;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// How many times a failed outbound call is repeated before giving up.
///
/// Only transport failures, `429 Too Many Requests` and `5xx` responses are
/// retried. The delay doubles with every attempt, starting from
/// `initial_backoff` rounded down to an even number of milliseconds.
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,

    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Delays to wait before each retry, one per allowed retry
    pub fn backoff_strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        // `ExponentialBackoff` yields `factor * base^n` for n >= 1
        let half_initial_ms = u64::try_from(self.initial_backoff.as_millis() / 2).unwrap_or(u64::MAX);

        ExponentialBackoff::from_millis(2)
            .factor(half_initial_ms)
            .max_delay(MAX_BACKOFF)
            .take(self.max_retries as usize)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
