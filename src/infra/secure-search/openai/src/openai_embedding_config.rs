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

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAiFlavor {
    /// `Authorization: Bearer` authentication, model is chosen per request
    OpenAi,
    /// `api-key` header authentication, `url` points to a deployment, e.g.
    /// `https://{resource}.openai.azure.com/openai/deployments/{deployment}/`
    Azure { api_version: String },
}

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    pub flavor: OpenAiFlavor,
    /// Base URL the \`embeddings\` path is resolved against
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimensions: usize,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            flavor: OpenAiFlavor::OpenAi,
            url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
