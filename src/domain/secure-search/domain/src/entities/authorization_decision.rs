// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use chrono::{DateTime, Utc};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub decided_at: DateTime<Utc>,
}

impl AuthorizationDecision {
    pub fn new(allowed: bool, decided_at: DateTime<Utc>) -> Self {
        Self {
            allowed,
            decided_at,
        }
    }

    /// A decision is only usable strictly within `ttl` of being made.
    /// Decisions stamped in the future (clock skew) count as fresh.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match now.signed_duration_since(self.decided_at).to_std() {
            Ok(age) => age >= ttl,
            Err(_) => false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
