// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::InvalidRequestError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub query_text: String,
    pub subject_id: String,
    /// Number of authorized results wanted (K)
    pub desired_count: usize,
    /// Falls back to the retriever configuration when not set
    pub max_over_fetch_rounds: Option<usize>,
    /// Falls back to the retriever configuration when not set
    pub batch_size: Option<usize>,
}

impl RetrievalRequest {
    pub fn new(
        query_text: impl Into<String>,
        subject_id: impl Into<String>,
        desired_count: usize,
    ) -> Self {
        Self {
            query_text: query_text.into(),
            subject_id: subject_id.into(),
            desired_count,
            max_over_fetch_rounds: None,
            batch_size: None,
        }
    }

    pub fn with_max_over_fetch_rounds(mut self, max_over_fetch_rounds: usize) -> Self {
        self.max_over_fetch_rounds = Some(max_over_fetch_rounds);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn validate(&self) -> Result<(), InvalidRequestError> {
        if self.desired_count == 0 {
            return Err(InvalidRequestError::new("desired count must be at least 1"));
        }
        if self.max_over_fetch_rounds == Some(0) {
            return Err(InvalidRequestError::new(
                "max over-fetch rounds must be at least 1",
            ));
        }
        if self.batch_size == Some(0) {
            return Err(InvalidRequestError::new("batch size must be at least 1"));
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
