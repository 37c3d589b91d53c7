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

use serde_json::Value;
use tracing::debug;

use super::create_with_generated_id;
use crate::entity::{Entity, RecordId, DELETE, PROTECTED_FIELDS_FIELD, UID_FIELD};
use crate::query::Query;
use crate::store::Repository;

/// Return `criteria` unless it has no fields.
fn non_empty(criteria: Option<&Entity>) -> Option<&Entity> {
    criteria.filter(|criteria| !criteria.fields().is_empty())
}

/// Return the fields which should remain in the protected fields list of `record` after `update`.
///
/// This returns `None` if `update` leaves the list unchanged.
fn remaining_protected(record: &Entity, update: &Entity) -> Option<Vec<Value>> {
    let protected = match record.get(PROTECTED_FIELDS_FIELD) {
        Some(Value::Array(protected)) => protected,
        _ => return None,
    };

    let remaining = protected
        .iter()
        .filter(|field| match field {
            Value::String(field) => !update.is_deleted(field),
            _ => true,
        })
        .cloned()
        .collect::<Vec<_>>();

    if remaining.len() == protected.len() {
        None
    } else {
        Some(remaining)
    }
}

/// A service which manages the entries of password vaults.
///
/// Every operation takes an optional owner id. When it is given, the operation only sees entries
/// whose [`UID_FIELD`] is equal to it, and new entries are stamped with it. The owner field can
/// never be changed by an update.
///
/// Bulk updates and deletions without ids or criteria, and bulk reads without ids, criteria or an
/// owner, would touch every entry. They are refused with `Error::EmptyQuery` unless the service is
/// constructed with [`VaultSupport::with_unscoped_bulk`].
///
/// [`UID_FIELD`]: crate::entity::UID_FIELD
/// [`VaultSupport::with_unscoped_bulk`]: crate::support::VaultSupport::with_unscoped_bulk
#[derive(Debug)]
pub struct VaultSupport<R> {
    repo: R,
    unscoped_bulk: bool,
}

impl<R: Repository> VaultSupport<R> {
    /// Create a service which stores vault entries in `repo`.
    pub fn new(repo: R) -> Self {
        VaultSupport {
            repo,
            unscoped_bulk: false,
        }
    }

    /// Create a service which allows bulk operations on every entry.
    pub fn with_unscoped_bulk(repo: R) -> Self {
        VaultSupport {
            repo,
            unscoped_bulk: true,
        }
    }

    /// The underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Consume this service and return the underlying repository.
    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Combine `criteria` with the `owner` scope.
    fn scoped(&self, owner: Option<&RecordId>, criteria: Option<&Entity>) -> Option<Entity> {
        let mut scoped = match (non_empty(criteria), owner) {
            (Some(criteria), _) => criteria.clone(),
            (None, Some(_)) => Entity::new(self.repo.kind()),
            (None, None) => return None,
        };

        scoped.set_id(None);
        if let Some(owner) = owner {
            scoped.set(UID_FIELD, owner.to_value());
        }

        Some(scoped)
    }

    /// Return the stored entry with the given `pk` if it matches the scope.
    fn find_scoped(
        &self,
        owner: Option<&RecordId>,
        pk: &RecordId,
        criteria: Option<&Entity>,
    ) -> crate::Result<Entity> {
        let scope = self.scoped(owner, criteria).map(|scoped| Query::all(&scoped));
        self.repo
            .find_by_id(pk)?
            .filter(|record| scope.as_ref().map_or(true, |query| query.matches(record)))
            .ok_or(crate::Error::RecordNotFound)
    }

    /// Return the stored entries with one of the given `pks` which match the scope.
    fn find_all_scoped(
        &self,
        owner: Option<&RecordId>,
        pks: Option<&[RecordId]>,
        criteria: Option<&Entity>,
    ) -> crate::Result<Vec<Entity>> {
        match (pks, self.scoped(owner, criteria)) {
            (Some(pks), Some(scoped)) => self.repo.find(pks, &scoped),
            (Some(pks), None) => self.repo.find_by_ids(pks),
            (None, Some(scoped)) => self.repo.find_by_crit(&scoped),
            (None, None) if self.unscoped_bulk => self.repo.find_all(),
            (None, None) => Err(crate::Error::EmptyQuery),
        }
    }

    /// Refuse a bulk mutation without ids or criteria unless it is allowed.
    fn check_bulk(&self, pks: Option<&[RecordId]>, criteria: Option<&Entity>) -> crate::Result<()> {
        if pks.is_none() && non_empty(criteria).is_none() && !self.unscoped_bulk {
            Err(crate::Error::EmptyQuery)
        } else {
            Ok(())
        }
    }

    /// Store a new vault entry and return its id.
    ///
    /// If `owner` is given, it is stored in the owner field of the entry.
    ///
    /// # Errors
    /// - `Error::EmptyRecordInsertion`: `entity` has no fields other than protected fields.
    pub fn create_vault_entry(
        &mut self,
        owner: Option<&RecordId>,
        mut entity: Entity,
    ) -> crate::Result<RecordId> {
        if entity.is_empty() {
            return Err(crate::Error::EmptyRecordInsertion);
        }

        if let Some(owner) = owner {
            entity.set(UID_FIELD, owner.to_value());
        }

        let id = create_with_generated_id(&mut self.repo, &entity)?;
        debug!(%id, owner = ?owner, "Created a vault entry.");

        Ok(id)
    }

    /// Return a single vault entry.
    ///
    /// If `pk` is given, the entry with that id is returned if it matches `criteria` and is owned by
    /// `owner`. Otherwise, the first entry which matches `criteria` and is owned by `owner` is
    /// returned.
    ///
    /// # Errors
    /// - `Error::EmptyQuery`: Neither `pk` nor `criteria` is given.
    /// - `Error::RecordNotFound`: No matching entry exists.
    pub fn read_vault_entry(
        &self,
        owner: Option<&RecordId>,
        pk: Option<&RecordId>,
        criteria: Option<&Entity>,
    ) -> crate::Result<Entity> {
        let record = match (pk, non_empty(criteria)) {
            (Some(pk), _) => self.find_scoped(owner, pk, criteria)?,
            (None, Some(_)) => self
                .find_all_scoped(owner, None, criteria)?
                .into_iter()
                .next()
                .ok_or(crate::Error::RecordNotFound)?,
            (None, None) => return Err(crate::Error::EmptyQuery),
        };

        Ok(record.public(&[]))
    }

    /// Return the vault entries which have one of the given `pks`, match `criteria` and are owned
    /// by `owner`.
    ///
    /// Any of the three can be omitted.
    ///
    /// # Errors
    /// - `Error::EmptyQuery`: None of `owner`, `pks` and `criteria` is given and unscoped bulk
    /// operations are not allowed.
    pub fn read_vault_entries(
        &self,
        owner: Option<&RecordId>,
        pks: Option<&[RecordId]>,
        criteria: Option<&Entity>,
    ) -> crate::Result<Vec<Entity>> {
        Ok(self
            .find_all_scoped(owner, pks, criteria)?
            .iter()
            .map(|record| record.public(&[]))
            .collect())
    }

    /// Merge `update` into the vault entry with the given `pk` and return its id.
    ///
    /// Fields removed by `update` are also removed from the protected fields list of the entry.
    ///
    /// # Errors
    /// - `Error::OwnerMutation`: `update` sets or removes the owner field.
    /// - `Error::RecordNotFound`: The entry does not exist or is not owned by `owner`.
    pub fn update_vault_entry(
        &mut self,
        owner: Option<&RecordId>,
        pk: &RecordId,
        update: &Entity,
    ) -> crate::Result<RecordId> {
        if update.touches(UID_FIELD) {
            return Err(crate::Error::OwnerMutation(UID_FIELD.to_string()));
        }

        let record = self.find_scoped(owner, pk, None)?;

        let mut update = update.clone();
        match remaining_protected(&record, &update) {
            Some(remaining) if remaining.is_empty() => update.set(PROTECTED_FIELDS_FIELD, DELETE),
            Some(remaining) => update.set(PROTECTED_FIELDS_FIELD, Value::Array(remaining)),
            None => (),
        }

        let id = self
            .repo
            .update_by_id(pk, &update)?
            .ok_or(crate::Error::RecordNotFound)?;
        debug!(%id, owner = ?owner, "Updated a vault entry.");

        Ok(id)
    }

    /// Merge `update` into every vault entry which has one of the given `pks`, matches `criteria`
    /// and is owned by `owner`.
    ///
    /// This returns the ids of the entries which were updated.
    ///
    /// # Errors
    /// - `Error::OwnerMutation`: `update` sets or removes the owner field.
    /// - `Error::EmptyQuery`: Neither `pks` nor `criteria` is given and unscoped bulk operations
    /// are not allowed.
    pub fn update_vault_entries(
        &mut self,
        owner: Option<&RecordId>,
        pks: Option<&[RecordId]>,
        criteria: Option<&Entity>,
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        if update.touches(UID_FIELD) {
            return Err(crate::Error::OwnerMutation(UID_FIELD.to_string()));
        }
        self.check_bulk(pks, criteria)?;

        let ids = self
            .find_all_scoped(owner, pks, criteria)?
            .into_iter()
            .filter_map(|record| record.id().cloned())
            .collect::<Vec<_>>();

        let mut updated = Vec::new();
        for id in ids {
            match self.update_vault_entry(owner, &id, update) {
                Ok(id) => updated.push(id),
                Err(crate::Error::RecordNotFound) => continue,
                Err(error) => return Err(error),
            }
        }

        Ok(updated)
    }

    /// Remove the vault entry with the given `pk` and return its id.
    ///
    /// # Errors
    /// - `Error::RecordNotFound`: The entry does not exist or is not owned by `owner`.
    pub fn delete_vault_entry(
        &mut self,
        owner: Option<&RecordId>,
        pk: &RecordId,
    ) -> crate::Result<RecordId> {
        self.find_scoped(owner, pk, None)?;

        let id = self
            .repo
            .remove_by_id(pk)?
            .ok_or(crate::Error::RecordNotFound)?;
        debug!(%id, owner = ?owner, "Deleted a vault entry.");

        Ok(id)
    }

    /// Remove every vault entry which has one of the given `pks`, matches `criteria` and is owned
    /// by `owner`.
    ///
    /// This returns the ids of the entries which were removed.
    ///
    /// # Errors
    /// - `Error::EmptyQuery`: Neither `pks` nor `criteria` is given and unscoped bulk operations
    /// are not allowed.
    pub fn delete_vault_entries(
        &mut self,
        owner: Option<&RecordId>,
        pks: Option<&[RecordId]>,
        criteria: Option<&Entity>,
    ) -> crate::Result<Vec<RecordId>> {
        self.check_bulk(pks, criteria)?;

        let removed = match (pks, self.scoped(owner, criteria)) {
            (Some(pks), Some(scoped)) => self.repo.remove(pks, &scoped)?,
            (Some(pks), None) => self.repo.remove_by_ids(pks)?,
            (None, Some(scoped)) => self.repo.remove_by_crit(&scoped)?,
            (None, None) => self.repo.remove_all()?,
        };
        debug!(count = removed.len(), owner = ?owner, "Deleted vault entries.");

        Ok(removed)
    }
}
