// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_retry::RetryIf;

use crate::{HttpCallError, RetryPolicy};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Sends the request produced by `make_request`, repeating it according to
/// the retry policy.
///
/// Returns the last received response even if its status is not successful,
/// use [`ensure_success`] or [`decode_json_response`] to interpret it.
pub async fn send_with_retry<F>(
    retry_policy: &RetryPolicy,
    endpoint: &str,
    make_request: F,
) -> Result<reqwest::Response, HttpCallError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let result = RetryIf::spawn(
        retry_policy.backoff_strategy(),
        || {
            let request = make_request();
            async move {
                let response = request.send().await.map_err(AttemptError::Transport)?;
                if is_retryable_status(response.status()) {
                    Err(AttemptError::Status(response))
                } else {
                    Ok(response)
                }
            }
        },
        |e: &AttemptError| match e {
            AttemptError::Status(response) => {
                tracing::warn!(
                    endpoint,
                    status = %response.status(),
                    "Outbound call returned a retryable status",
                );
                true
            }
            AttemptError::Transport(e) if is_retryable_error(e) => {
                tracing::warn!(
                    endpoint,
                    error = ?e,
                    error_msg = %e,
                    "Outbound call failed with a retryable transport error",
                );
                true
            }
            AttemptError::Transport(_) => false,
        },
    )
    .await;

    match result {
        Ok(response) | Err(AttemptError::Status(response)) => Ok(response),
        Err(AttemptError::Transport(e)) => Err(HttpCallError::transport(endpoint, e)),
    }
}

enum AttemptError {
    Status(reqwest::Response),
    Transport(reqwest::Error),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn ensure_success(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, HttpCallError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .map_err(|e| HttpCallError::transport(endpoint, e))?;

    Err(HttpCallError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

pub async fn decode_json_response<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, HttpCallError> {
    let response = ensure_success(endpoint, response).await?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| HttpCallError::transport(endpoint, e))?;

    serde_json::from_slice(&bytes).map_err(|source| HttpCallError::MalformedResponse {
        endpoint: endpoint.to_string(),
        source,
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

fn is_retryable_error(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
