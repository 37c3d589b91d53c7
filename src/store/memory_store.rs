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

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::entity::{Entity, EntityKind, IdKind, RecordId};
use crate::store::{OpenRepo, Repository};

/// The configuration for opening a [`MemoryStore`].
///
/// [`MemoryStore`]: crate::store::MemoryStore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MemoryConfig;

impl MemoryConfig {
    /// Create a new `MemoryConfig`.
    pub fn new() -> Self {
        MemoryConfig
    }
}

impl OpenRepo for MemoryConfig {
    type Repo = MemoryStore;

    fn open(&self, kind: EntityKind) -> crate::Result<Self::Repo> {
        Ok(MemoryStore {
            kind,
            records: BTreeMap::new(),
        })
    }
}

/// A `Repository` which stores records in memory.
///
/// Unlike other `Repository` implementations, records in a `MemoryStore` are not stored
/// persistently and are only accessible to the current process. This backend is useful for
/// testing.
///
/// Records are identified by sequential integers starting at 1.
///
/// You can use [`MemoryConfig`] to open a repository of this type.
///
/// [`MemoryConfig`]: crate::store::MemoryConfig
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStore {
    kind: EntityKind,
    records: BTreeMap<u64, Map<String, Value>>,
}

impl MemoryStore {
    fn int_id(id: &RecordId) -> crate::Result<u64> {
        id.as_int().ok_or(crate::Error::IdType {
            expected: IdKind::Int,
        })
    }

    fn entity(&self, id: u64, fields: &Map<String, Value>) -> Entity {
        Entity::from_fields(self.kind, Some(RecordId::Int(id)), fields.clone())
    }
}

impl Repository for MemoryStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn id_kind(&self) -> IdKind {
        IdKind::Int
    }

    fn storage_root(&self) -> Option<&Path> {
        None
    }

    fn create(&mut self, entity: &Entity) -> crate::Result<RecordId> {
        let id = match entity.id() {
            Some(id) => {
                let id = Self::int_id(id)?;
                if self.records.contains_key(&id) {
                    return Err(crate::Error::AlreadyExists);
                }
                id
            }
            None => match self.records.keys().next_back() {
                Some(last) => last.checked_add(1).ok_or(crate::Error::IdsExhausted)?,
                None => 1,
            },
        };

        self.records.insert(id, entity.fields().clone());
        Ok(RecordId::Int(id))
    }

    fn find_by_id(&self, id: &RecordId) -> crate::Result<Option<Entity>> {
        let id = Self::int_id(id)?;
        Ok(self.records.get(&id).map(|fields| self.entity(id, fields)))
    }

    fn find_all(&self) -> crate::Result<Vec<Entity>> {
        Ok(self
            .records
            .iter()
            .map(|(id, fields)| self.entity(*id, fields))
            .collect())
    }

    fn update_by_id(&mut self, id: &RecordId, update: &Entity) -> crate::Result<Option<RecordId>> {
        let int_id = Self::int_id(id)?;
        match self.records.get_mut(&int_id) {
            Some(fields) => {
                update.apply_to(fields);
                Ok(Some(id.clone()))
            }
            None => Ok(None),
        }
    }

    fn remove_by_id(&mut self, id: &RecordId) -> crate::Result<Option<RecordId>> {
        let int_id = Self::int_id(id)?;
        Ok(self.records.remove(&int_id).map(|_| id.clone()))
    }

    fn remove_all(&mut self) -> crate::Result<Vec<RecordId>> {
        let ids = self.records.keys().copied().map(RecordId::Int).collect();
        self.records.clear();
        Ok(ids)
    }
}
