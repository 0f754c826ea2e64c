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

pub const DEFAULT_OPENFGA_URL: &str = "http://localhost:8080/";
pub const DEFAULT_USER_TYPE: &str = "user";
pub const DEFAULT_OBJECT_TYPE: &str = "doc";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFgaBatchMode {
    /// One `batch-check` call per chunk of `max_batch_size` tuples
    Native,
    /// Individual `check` calls for servers that predate `batch-check`
    Compat,
}

#[derive(Debug, Clone)]
pub struct OpenFgaConfig {
    pub url: String,
    pub store_id: String,
    pub authorization_model_id: Option<String>,
    pub api_token: Option<String>,
    /// Type prefix of subjects on the wire, i.e. `user:<subject_id>`
    pub user_type: String,
    /// Type prefix of objects on the wire, i.e. `doc:<resource_id>`
    pub object_type: String,
    pub batch_mode: OpenFgaBatchMode,
    pub max_batch_size: usize,
    /// Concurrency limit of individual checks in compat mode
    pub max_concurrent_checks: usize,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for OpenFgaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OPENFGA_URL.to_string(),
            store_id: String::new(),
            authorization_model_id: None,
            api_token: None,
            user_type: DEFAULT_USER_TYPE.to_string(),
            object_type: DEFAULT_OBJECT_TYPE.to_string(),
            batch_mode: OpenFgaBatchMode::Native,
            max_batch_size: 50,
            max_concurrent_checks: 8,
            timeout: Duration::from_secs(5),
            retry_policy: RetryPolicy::default(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
