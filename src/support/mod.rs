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

//! Business rules of a password vault.
//!
//! This module enforces the invariants which no storage backend enforces on its own:
//! - [`MasterSupport`] keeps at most one master password per user and refuses updates to the
//! `user` and `token` fields of a master password.
//! - [`VaultSupport`] refuses empty vault entries, scopes every operation to an optional owner id
//! stored in the [`UID_FIELD`] of each entry, and keeps the list of protected fields of an entry
//! consistent when fields are removed.
//!
//! Both services own the [`Repository`] they operate on. Entities returned by them are public
//! projections: protected fields are removed and the id is kept.
//!
//! When a backend needs caller-supplied ids, both services generate a UUID key and retry.
//!
//! [`MasterSupport`]: crate::support::MasterSupport
//! [`VaultSupport`]: crate::support::VaultSupport
//! [`UID_FIELD`]: crate::entity::UID_FIELD
//! [`Repository`]: crate::store::Repository

use serde_json::Value;
use tracing::debug;

use crate::entity::{Entity, RecordId};
use crate::store::Repository;

pub use self::master::{MasterKey, MasterSupport};
pub use self::vault::VaultSupport;

mod master;
mod vault;

/// Create `entity` in `repo`, generating a UUID key if the backend requires an id.
fn create_with_generated_id<R: Repository>(
    repo: &mut R,
    entity: &Entity,
) -> crate::Result<RecordId> {
    match repo.create(entity) {
        Err(crate::Error::RequiresId) => {
            let id = RecordId::new_key();
            debug!(%id, table = repo.kind().table(), "Generated a record id.");
            repo.create(&entity.clone().with_id(id))
        }
        result => result,
    }
}

/// Render a field value for an error message.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        other => other.to_string(),
    }
}
