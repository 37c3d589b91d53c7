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

use tracing::debug;

use super::{create_with_generated_id, display_value};
use crate::entity::{Entity, RecordId};
use crate::store::Repository;

/// The field which identifies the user a master password belongs to.
const USER_FIELD: &str = "user";

/// The fields of a master password which can not be updated.
const IMMUTABLE_FIELDS: [&str; 2] = [USER_FIELD, "token"];

/// A way of looking up a master password.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MasterKey {
    /// The id of the master password record.
    Id(RecordId),

    /// The user the master password belongs to.
    User(String),
}

impl From<RecordId> for MasterKey {
    fn from(id: RecordId) -> Self {
        MasterKey::Id(id)
    }
}

/// A service which manages master passwords.
///
/// Each user has at most one master password.
#[derive(Debug)]
pub struct MasterSupport<R> {
    repo: R,
}

impl<R: Repository> MasterSupport<R> {
    /// Create a service which stores master passwords in `repo`.
    pub fn new(repo: R) -> Self {
        MasterSupport { repo }
    }

    /// The underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Consume this service and return the underlying repository.
    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Store a new master password and return its id.
    ///
    /// # Errors
    /// - `Error::MissingField`: `entity` has no `user` field.
    /// - `Error::MasterPasswordExists`: The user already has a master password.
    pub fn create_master_password(&mut self, entity: Entity) -> crate::Result<RecordId> {
        let user = entity
            .get(USER_FIELD)
            .cloned()
            .ok_or_else(|| crate::Error::MissingField(USER_FIELD.to_string()))?;

        let criteria = Entity::new(self.repo.kind()).with(USER_FIELD, user.clone());
        if !self.repo.find_by_crit(&criteria)?.is_empty() {
            return Err(crate::Error::MasterPasswordExists(display_value(&user)));
        }

        let id = create_with_generated_id(&mut self.repo, &entity)?;
        debug!(%id, "Created a master password.");

        Ok(id)
    }

    /// Return the master password identified by `key`.
    ///
    /// # Errors
    /// - `Error::IdType`: The id is not of the kind the repository uses.
    /// - `Error::UserNotExists`: There is no such master password.
    /// - `Error::MultipleMasterPasswords`: The user has more than one master password.
    pub fn read_master_password(&self, key: MasterKey) -> crate::Result<Entity> {
        match key {
            MasterKey::Id(id) => {
                self.check_id(&id)?;
                self.repo
                    .find_by_id(&id)?
                    .map(|record| record.public(&[]))
                    .ok_or_else(|| crate::Error::UserNotExists(id.to_string()))
            }
            MasterKey::User(user) => {
                let criteria = Entity::new(self.repo.kind()).with(USER_FIELD, user.as_str());
                let mut records = self.repo.find_by_crit(&criteria)?;
                match records.len() {
                    0 => Err(crate::Error::UserNotExists(user)),
                    1 => Ok(records.remove(0).public(&[])),
                    count => Err(crate::Error::MultipleMasterPasswords { user, count }),
                }
            }
        }
    }

    /// Merge `update` into the master password with the given `id` and return its id.
    ///
    /// # Errors
    /// - `Error::InvalidUpdate`: `update` sets or removes the `user` or `token` field.
    /// - `Error::IdType`: The id is not of the kind the repository uses.
    /// - `Error::UserNotExists`: There is no master password with the given `id`.
    pub fn update_master_password(
        &mut self,
        id: &RecordId,
        update: &Entity,
    ) -> crate::Result<RecordId> {
        if let Some(field) = IMMUTABLE_FIELDS.iter().find(|field| update.touches(field)) {
            return Err(crate::Error::InvalidUpdate(field.to_string()));
        }
        self.check_id(id)?;

        let id = self
            .repo
            .update_by_id(id, update)?
            .ok_or_else(|| crate::Error::UserNotExists(id.to_string()))?;
        debug!(%id, "Updated a master password.");

        Ok(id)
    }

    fn check_id(&self, id: &RecordId) -> crate::Result<()> {
        let expected = self.repo.id_kind();
        if id.kind() == expected {
            Ok(())
        } else {
            Err(crate::Error::IdType { expected })
        }
    }
}
