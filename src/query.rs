/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Predicates over records built from criteria.
//!
//! A [`Query`] is built from a criteria [`Entity`], which is a partial entity whose fields must be
//! present in a record with equal values. A field which is missing from a record never matches,
//! even if the criteria value is `null`.
//!
//! An empty criteria entity matches nothing, regardless of the [`Logic`]. Use
//! [`Repository::find_all`] or [`Repository::remove_all`] to operate on every record.
//!
//! [`Entity`]: crate::entity::Entity
//! [`Repository::find_all`]: crate::store::Repository::find_all
//! [`Repository::remove_all`]: crate::store::Repository::remove_all

use serde_json::{Map, Value};

use crate::entity::Entity;

/// How the fields of a [`Query`] are combined.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    /// Every criteria field must match.
    #[default]
    And,

    /// At least one criteria field must match.
    Or,
}

/// A predicate over records.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    criteria: Map<String, Value>,
    logic: Logic,
}

impl Query {
    /// Create a query which matches records against the fields of `criteria`.
    ///
    /// Protected fields of `criteria` are criteria like any other field, so a query can be scoped
    /// to an owner. Fields which `criteria` marks for removal are ignored.
    pub fn new(criteria: &Entity, logic: Logic) -> Self {
        Query {
            criteria: criteria.fields().clone(),
            logic,
        }
    }

    /// Create a query which requires every field of `criteria` to match.
    pub fn all(criteria: &Entity) -> Self {
        Self::new(criteria, Logic::And)
    }

    /// Create a query which requires any field of `criteria` to match.
    pub fn any(criteria: &Entity) -> Self {
        Self::new(criteria, Logic::Or)
    }

    /// Return whether this query has no criteria and therefore matches nothing.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Return whether `entity` matches this query.
    pub fn matches(&self, entity: &Entity) -> bool {
        self.matches_fields(entity.fields())
    }

    /// Return whether the stored `fields` of a record match this query.
    pub fn matches_fields(&self, fields: &Map<String, Value>) -> bool {
        if self.criteria.is_empty() {
            return false;
        }

        let mut matching = self
            .criteria
            .iter()
            .map(|(field, value)| fields.get(field) == Some(value));

        match self.logic {
            Logic::And => matching.all(|matched| matched),
            Logic::Or => matching.any(|matched| matched),
        }
    }
}
