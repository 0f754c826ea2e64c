// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod dummy_embedding_client;
mod in_memory_authorization_store;
mod in_memory_vector_index;

pub use dummy_embedding_client::*;
pub use in_memory_authorization_store::*;
pub use in_memory_vector_index::*;
