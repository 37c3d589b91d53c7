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

//! Records stored in a repository.
//!
//! An [`Entity`] is an ordered mapping from field names to JSON values, tagged with an
//! [`EntityKind`] and an optional [`RecordId`]. The kind names the table the entity belongs to and
//! the fields it is expected to have, but fields outside of that schema are still permitted; they
//! are reported by [`Entity::extension_fields`].
//!
//! Field names which start with an underscore and are fully upper-case, like [`UID_FIELD`], are
//! *protected* fields. They are used for bookkeeping and are excluded from the projection returned
//! by [`Entity::public`] unless explicitly whitelisted.
//!
//! An entity which is used as an update can mark fields for removal by setting them to
//! [`DELETE`]. When the update is merged into a record, those fields are removed from the record
//! instead of being overwritten.
//!
//! [`Entity`]: crate::entity::Entity
//! [`EntityKind`]: crate::entity::EntityKind
//! [`RecordId`]: crate::entity::RecordId
//! [`Entity::extension_fields`]: crate::entity::Entity::extension_fields
//! [`Entity::public`]: crate::entity::Entity::public
//! [`UID_FIELD`]: crate::entity::UID_FIELD
//! [`DELETE`]: crate::entity::DELETE

pub use self::id::{IdKind, RecordId};
pub use self::kind::{EntityKind, MASTER, VAULT};
pub use self::record::{
    is_protected, Delete, Entity, FieldOp, FieldUpdate, DELETE, PROTECTED_FIELDS_FIELD, UID_FIELD,
};

mod id;
mod kind;
mod record;
