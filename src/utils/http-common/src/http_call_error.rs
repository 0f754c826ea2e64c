// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum HttpCallError {
    #[error("Request to {endpoint} timed out")]
    Timeout {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to reach {endpoint}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{endpoint} returned a malformed response")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpCallError {
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            Self::Timeout { endpoint, source }
        } else {
            Self::Unreachable { endpoint, source }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Failures that say nothing about the request itself: the remote side
    /// could not be reached or is temporarily unable to serve
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Unreachable { .. } => true,
            Self::UnexpectedStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            Self::MalformedResponse { .. } => false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
