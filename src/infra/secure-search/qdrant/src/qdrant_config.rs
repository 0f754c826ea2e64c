// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use http_common::RetryPolicy;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333/";
pub const DEFAULT_QDRANT_COLLECTION: &str = "secure-search";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    /// Sent as the `api-key` header
    pub api_key: Option<String>,
    pub dimensions: usize,
    /// Create the collection on first use when it does not exist yet
    pub create_collection: bool,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_QDRANT_COLLECTION.to_string(),
            api_key: None,
            dimensions: 1536,
            create_collection: true,
            timeout: Duration::from_secs(10),
            retry_policy: RetryPolicy::default(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
