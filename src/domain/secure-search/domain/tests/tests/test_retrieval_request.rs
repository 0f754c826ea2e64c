// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use pretty_assertions::assert_eq;
use secure_search::{RetrievalRequest, Tuple, TupleWrite};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_valid_request() {
    let request = RetrievalRequest::new("rust", "alice", 5)
        .with_max_over_fetch_rounds(1)
        .with_batch_size(1);

    assert_eq!(request.validate(), Ok(()));
}

#[test]
fn test_zero_desired_count_is_rejected() {
    let err = RetrievalRequest::new("rust", "alice", 0)
        .validate()
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid retrieval request: desired count must be at least 1"
    );
}

#[test]
fn test_zero_rounds_is_rejected() {
    let res = RetrievalRequest::new("rust", "alice", 3)
        .with_max_over_fetch_rounds(0)
        .validate();

    assert!(res.is_err());
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let res = RetrievalRequest::new("rust", "alice", 3)
        .with_batch_size(0)
        .validate();

    assert!(res.is_err());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_viewer_tuple() {
    let tuple = Tuple::viewer("alice", "doc-1");

    assert_eq!(tuple, Tuple::new("alice", "viewer", "doc-1"));
    assert_eq!(tuple.to_string(), "doc-1#viewer@alice");
    assert_eq!(TupleWrite::Revoke(tuple.clone()).tuple(), &tuple);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
