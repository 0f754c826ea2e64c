// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Item returned by a similarity search before any authorization is applied
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item_id: String,
    /// Zero-based position in the similarity order of the response it came from
    pub rank: usize,
    pub score: f32,
    pub payload: serde_json::Value,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
