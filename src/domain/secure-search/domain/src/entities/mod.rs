// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod authorization_decision;
mod candidate;
mod retrieval_context;
mod retrieval_request;
mod retrieval_result;
mod tuple;

pub use authorization_decision::*;
pub use candidate::*;
pub use retrieval_context::*;
pub use retrieval_request::*;
pub use retrieval_result::*;
pub use tuple::*;
