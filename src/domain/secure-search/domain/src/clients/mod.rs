// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod authorization_client;
mod embedding_client;
mod vector_index_client;

pub use authorization_client::*;
pub use embedding_client::*;
pub use vector_index_client::*;
