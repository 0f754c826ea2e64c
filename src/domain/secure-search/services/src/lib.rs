// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod decision_cache;
mod decision_resolver;
mod dependencies;
mod ingestion_coordinator_impl;
mod secure_retriever_impl;
mod upstream_call;

pub use decision_cache::*;
pub use decision_resolver::*;
pub use dependencies::*;
pub use ingestion_coordinator_impl::*;
pub use secure_retriever_impl::*;
