// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod http_call_error;
mod http_client;
mod retry_policy;

pub use http_call_error::*;
pub use http_client::*;
pub use retry_policy::*;
