// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Relation that grants a subject the right to see a resource in search
/// results
pub const RELATION_VIEWER: &str = "viewer";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Authorization fact stating that `subject` has `relation` to `object`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tuple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Tuple {
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    pub fn viewer(subject_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::new(subject_id, RELATION_VIEWER, resource_id)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.subject)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleWrite {
    Grant(Tuple),
    Revoke(Tuple),
}

impl TupleWrite {
    pub fn tuple(&self) -> &Tuple {
        match self {
            Self::Grant(tuple) | Self::Revoke(tuple) => tuple,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
