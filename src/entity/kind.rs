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

/// A descriptor for a kind of [`Entity`].
///
/// This names the table which entities of this kind are stored in and the fields they are
/// expected to have.
///
/// [`Entity`]: crate::entity::Entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKind {
    table: &'static str,
    fields: &'static [&'static str],
}

impl EntityKind {
    /// Create a new entity kind with the given `table` tag and known `fields`.
    pub const fn new(table: &'static str, fields: &'static [&'static str]) -> Self {
        EntityKind { table, fields }
    }

    /// The tag of the table which entities of this kind are stored in.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// The fields which entities of this kind are expected to have.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Return whether `field` is part of the schema of this kind.
    pub fn is_known(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

/// The master password of a user.
///
/// There is at most one master entity per `user`.
pub const MASTER: EntityKind = EntityKind::new("master", &["user", "token", "pw", "salt"]);

/// An entry in a user's password vault.
pub const VAULT: EntityKind =
    EntityKind::new("vault", &["pw", "salt", "user", "label", "email", "site"]);
