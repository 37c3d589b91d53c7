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

use std::fmt;
use std::path::Path;

use static_assertions::assert_obj_safe;

use crate::entity::{Entity, EntityKind, IdKind, RecordId};
use crate::query::Query;

/// A persistent collection of records of a single [`EntityKind`].
///
/// A `Repository` is the uniform CRUD contract implemented by every storage backend. Records are
/// materialized fresh from storage on every read; nothing is cached between calls.
///
/// Single-record operations are atomic. Bulk operations are a sequence of independent
/// single-record operations, and they report zero matches with an empty list rather than an error.
///
/// Only the required methods need to be implemented; the bulk operations are provided in terms of
/// them, but a backend can override them when it can do better.
///
/// [`EntityKind`]: crate::entity::EntityKind
pub trait Repository: fmt::Debug + Send {
    /// The kind of entity stored in this repository.
    fn kind(&self) -> EntityKind;

    /// The kind of identifier this repository uses for its records.
    fn id_kind(&self) -> IdKind;

    /// The directory which holds the storage of this repository, if it has one.
    fn storage_root(&self) -> Option<&Path>;

    /// Persist `entity` as a new record and return its id.
    ///
    /// If `entity` has an id, that id is used for the new record. Otherwise the backend assigns
    /// one, if it can.
    ///
    /// # Errors
    /// - `Error::RequiresId`: The backend needs a caller-supplied id and `entity` has none.
    /// - `Error::AlreadyExists`: A record with the id of `entity` already exists.
    /// - `Error::IdType`: The id of `entity` is not of the kind this backend uses.
    /// - `Error::IdsExhausted`: The backend assigns sequential ids and the highest id is taken.
    /// - `Error::Io`: An I/O error occurred.
    fn create(&mut self, entity: &Entity) -> crate::Result<RecordId>;

    /// Return the record with the given `id`, or `None` if it does not exist.
    fn find_by_id(&self, id: &RecordId) -> crate::Result<Option<Entity>>;

    /// Return every record in the repository.
    fn find_all(&self) -> crate::Result<Vec<Entity>>;

    /// Merge `update` into the record with the given `id`.
    ///
    /// This returns the id of the record, or `None` if it does not exist. If merging `update`
    /// would not change the record, nothing is written.
    fn update_by_id(&mut self, id: &RecordId, update: &Entity) -> crate::Result<Option<RecordId>>;

    /// Remove the record with the given `id`.
    ///
    /// This returns the id of the record, or `None` if it did not exist.
    fn remove_by_id(&mut self, id: &RecordId) -> crate::Result<Option<RecordId>>;

    /// Remove every record in the repository and return their ids.
    fn remove_all(&mut self) -> crate::Result<Vec<RecordId>>;

    /// Return the first record which matches `entity`.
    ///
    /// If `entity` has an id, only the record with that id is considered, and it must also match
    /// any fields of `entity`. Otherwise, `entity` is used as criteria.
    fn find_one(&self, entity: &Entity) -> crate::Result<Option<Entity>> {
        match entity.id() {
            Some(id) => Ok(self.find_by_id(id)?.filter(|record| {
                entity.fields().is_empty() || Query::all(entity).matches(record)
            })),
            None => Ok(self.find_by_crit(entity)?.into_iter().next()),
        }
    }

    /// Return the records with the given `ids`, skipping those which do not exist.
    fn find_by_ids(&self, ids: &[RecordId]) -> crate::Result<Vec<Entity>> {
        let mut records = Vec::new();
        for id in ids {
            if let Some(record) = self.find_by_id(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Return the records which match every field of `criteria`.
    fn find_by_crit(&self, criteria: &Entity) -> crate::Result<Vec<Entity>> {
        let query = Query::all(criteria);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|record| query.matches(record))
            .collect())
    }

    /// Return the records which have one of the given `ids` and match every field of `criteria`.
    fn find(&self, ids: &[RecordId], criteria: &Entity) -> crate::Result<Vec<Entity>> {
        let query = Query::all(criteria);
        Ok(self
            .find_by_ids(ids)?
            .into_iter()
            .filter(|record| query.matches(record))
            .collect())
    }

    /// Merge `update` into each record with one of the given `ids` and return the ids updated.
    fn update_by_ids(
        &mut self,
        ids: &[RecordId],
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        let mut updated = Vec::new();
        for id in ids {
            if let Some(id) = self.update_by_id(id, update)? {
                updated.push(id);
            }
        }
        Ok(updated)
    }

    /// Merge `update` into each record which matches `criteria` and return the ids updated.
    fn update_by_crit(&mut self, criteria: &Entity, update: &Entity) -> crate::Result<Vec<RecordId>> {
        let ids = record_ids(self.find_by_crit(criteria)?);
        self.update_by_ids(&ids, update)
    }

    /// Merge `update` into each record which has one of the given `ids` and matches `criteria`.
    fn update(
        &mut self,
        ids: &[RecordId],
        criteria: &Entity,
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        let ids = record_ids(self.find(ids, criteria)?);
        self.update_by_ids(&ids, update)
    }

    /// Remove the records with the given `ids` and return the ids removed.
    fn remove_by_ids(&mut self, ids: &[RecordId]) -> crate::Result<Vec<RecordId>> {
        let mut removed = Vec::new();
        for id in ids {
            if let Some(id) = self.remove_by_id(id)? {
                removed.push(id);
            }
        }
        Ok(removed)
    }

    /// Remove the records which match `criteria` and return the ids removed.
    fn remove_by_crit(&mut self, criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        let ids = record_ids(self.find_by_crit(criteria)?);
        self.remove_by_ids(&ids)
    }

    /// Remove the records which have one of the given `ids` and match `criteria`.
    fn remove(&mut self, ids: &[RecordId], criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        let ids = record_ids(self.find(ids, criteria)?);
        self.remove_by_ids(&ids)
    }
}

assert_obj_safe!(Repository);

/// Collect the ids of the given `records`.
pub(crate) fn record_ids(records: Vec<Entity>) -> Vec<RecordId> {
    records
        .into_iter()
        .filter_map(|record| record.id().cloned())
        .collect()
}

impl Repository for Box<dyn Repository> {
    fn kind(&self) -> EntityKind {
        self.as_ref().kind()
    }

    fn id_kind(&self) -> IdKind {
        self.as_ref().id_kind()
    }

    fn storage_root(&self) -> Option<&Path> {
        self.as_ref().storage_root()
    }

    fn create(&mut self, entity: &Entity) -> crate::Result<RecordId> {
        self.as_mut().create(entity)
    }

    fn find_by_id(&self, id: &RecordId) -> crate::Result<Option<Entity>> {
        self.as_ref().find_by_id(id)
    }

    fn find_all(&self) -> crate::Result<Vec<Entity>> {
        self.as_ref().find_all()
    }

    fn update_by_id(&mut self, id: &RecordId, update: &Entity) -> crate::Result<Option<RecordId>> {
        self.as_mut().update_by_id(id, update)
    }

    fn remove_by_id(&mut self, id: &RecordId) -> crate::Result<Option<RecordId>> {
        self.as_mut().remove_by_id(id)
    }

    fn remove_all(&mut self) -> crate::Result<Vec<RecordId>> {
        self.as_mut().remove_all()
    }

    fn find_one(&self, entity: &Entity) -> crate::Result<Option<Entity>> {
        self.as_ref().find_one(entity)
    }

    fn find_by_ids(&self, ids: &[RecordId]) -> crate::Result<Vec<Entity>> {
        self.as_ref().find_by_ids(ids)
    }

    fn find_by_crit(&self, criteria: &Entity) -> crate::Result<Vec<Entity>> {
        self.as_ref().find_by_crit(criteria)
    }

    fn find(&self, ids: &[RecordId], criteria: &Entity) -> crate::Result<Vec<Entity>> {
        self.as_ref().find(ids, criteria)
    }

    fn update_by_ids(
        &mut self,
        ids: &[RecordId],
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        self.as_mut().update_by_ids(ids, update)
    }

    fn update_by_crit(&mut self, criteria: &Entity, update: &Entity) -> crate::Result<Vec<RecordId>> {
        self.as_mut().update_by_crit(criteria, update)
    }

    fn update(
        &mut self,
        ids: &[RecordId],
        criteria: &Entity,
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        self.as_mut().update(ids, criteria, update)
    }

    fn remove_by_ids(&mut self, ids: &[RecordId]) -> crate::Result<Vec<RecordId>> {
        self.as_mut().remove_by_ids(ids)
    }

    fn remove_by_crit(&mut self, criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        self.as_mut().remove_by_crit(criteria)
    }

    fn remove(&mut self, ids: &[RecordId], criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        self.as_mut().remove(ids, criteria)
    }
}
