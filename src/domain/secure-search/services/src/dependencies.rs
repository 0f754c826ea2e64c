// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use dill::CatalogBuilder;

use crate::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Registers the retrieval and ingestion services. Adapters implementing the
/// client traits, the configs and a [`time_source::SystemTimeSource`] are
/// expected to be added by the caller.
pub fn register_dependencies(catalog_builder: &mut CatalogBuilder, decision_cache_enabled: bool) {
    if decision_cache_enabled {
        catalog_builder.add::<InMemoryDecisionCache>();
    } else {
        catalog_builder.add::<NoOpDecisionCache>();
    }

    catalog_builder.add::<DecisionResolver>();
    catalog_builder.add::<SecureRetrieverImpl>();
    catalog_builder.add::<IngestionCoordinatorImpl>();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
