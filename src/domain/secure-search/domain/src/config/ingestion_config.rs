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
pub struct IngestionConfig {
    /// Store the raw text next to the vector so search results can show it
    pub payload_include_content: bool,
    /// Make `admit` return only after the resource is visible to searches
    pub wait_until_searchable: bool,
    pub readiness_poll_interval: Duration,
    /// Extra waiting time on top of the index's declared indexing lag
    pub readiness_timeout: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            payload_include_content: true,
            wait_until_searchable: false,
            readiness_poll_interval: Duration::from_millis(250),
            readiness_timeout: Duration::from_secs(15),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
