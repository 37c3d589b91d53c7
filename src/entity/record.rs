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

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use super::id::RecordId;
use super::kind::EntityKind;

/// The field which scopes a record to the user who owns it.
pub const UID_FIELD: &str = "_UID";

/// The field which lists the names of protected fields of a record.
pub const PROTECTED_FIELDS_FIELD: &str = "_PROTECTED_FIELDS";

/// Return whether `field` is a protected field.
///
/// Protected fields start with an underscore and are fully upper-case.
pub fn is_protected(field: &str) -> bool {
    field.starts_with('_') && field.to_uppercase() == field
}

/// The marker which removes a field when it is set in an update.
///
/// See [`DELETE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delete;

/// The delete marker.
///
/// Setting a field of an update entity to this value removes the field from every record the
/// update is applied to.
///
/// ```
/// use vault_store::entity::{Entity, DELETE, VAULT};
///
/// let mut update = Entity::new(VAULT);
/// update.set("pw", DELETE);
/// assert!(update.is_deleted("pw"));
/// ```
pub const DELETE: Delete = Delete;

/// An operation on a single field of an [`Entity`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Set the field to a value.
    Set(Value),

    /// Remove the field.
    Delete,
}

/// A value which can be assigned to a field of an [`Entity`].
///
/// This is implemented for every type which converts into a JSON value and for [`Delete`].
pub trait FieldUpdate {
    /// Convert this value into a field operation.
    fn into_op(self) -> FieldOp;
}

impl<T: Into<Value>> FieldUpdate for T {
    fn into_op(self) -> FieldOp {
        FieldOp::Set(self.into())
    }
}

impl FieldUpdate for Delete {
    fn into_op(self) -> FieldOp {
        FieldOp::Delete
    }
}

/// A record of a repository.
///
/// An entity is an ordered mapping from field names to JSON values with an optional identifier.
/// Fields can be marked for removal by setting them to [`DELETE`], which only has an effect when
/// the entity is used as an update.
///
/// Two entities are equal if their identifiers and their non-protected fields are equal.
#[derive(Debug, Clone)]
pub struct Entity {
    kind: EntityKind,
    id: Option<RecordId>,
    fields: Map<String, Value>,
    deleted: BTreeSet<String>,
}

impl Entity {
    /// Create a new empty entity of the given `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Entity {
            kind,
            id: None,
            fields: Map::new(),
            deleted: BTreeSet::new(),
        }
    }

    /// Create an entity of the given `kind` from stored `fields`.
    pub fn from_fields(kind: EntityKind, id: Option<RecordId>, fields: Map<String, Value>) -> Self {
        Entity {
            kind,
            id,
            fields,
            deleted: BTreeSet::new(),
        }
    }

    /// Return this entity with the given field assigned.
    pub fn with(mut self, field: impl Into<String>, value: impl FieldUpdate) -> Self {
        self.set(field, value);
        self
    }

    /// Return this entity with the given `id`.
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The kind of this entity.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The identifier of this entity, if it has one.
    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    /// Return the value of `field`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Assign `value` to `field`.
    ///
    /// If `value` is [`DELETE`], this removes the field and marks it for removal.
    pub fn set(&mut self, field: impl Into<String>, value: impl FieldUpdate) {
        let field = field.into();
        match value.into_op() {
            FieldOp::Set(value) => {
                self.deleted.remove(&field);
                self.fields.insert(field, value);
            }
            FieldOp::Delete => {
                self.fields.shift_remove(&field);
                self.deleted.insert(field);
            }
        }
    }

    /// Remove `field` and return its value.
    pub fn pop(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Return whether this entity has a value for `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Return whether `field` is marked for removal.
    pub fn is_deleted(&self, field: &str) -> bool {
        self.deleted.contains(field)
    }

    /// Return whether `field` is either assigned or marked for removal.
    pub fn touches(&self, field: &str) -> bool {
        self.contains(field) || self.is_deleted(field)
    }

    /// The fields which are marked for removal.
    pub fn deleted(&self) -> impl Iterator<Item = &str> {
        self.deleted.iter().map(String::as_str)
    }

    /// Iterate over the non-protected fields of this entity in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(field, _)| !is_protected(field))
            .map(|(field, value)| (field.as_str(), value))
    }

    /// All fields of this entity, including protected fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume this entity and return all of its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Return whether this entity has no non-protected fields.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Return whether merging this entity into a record could change it.
    pub fn has_changes(&self) -> bool {
        !self.fields.is_empty() || !self.deleted.is_empty()
    }

    /// Merge `other` into this entity.
    ///
    /// Each field of `other` overwrites the field of this entity with the same name, and each
    /// field which `other` marks for removal is removed from this entity.
    pub fn update(&mut self, other: &Entity) {
        other.apply_to(&mut self.fields);
        for field in other.fields.keys() {
            self.deleted.remove(field);
        }
    }

    /// Merge this entity as an update into the stored `fields` of a record.
    ///
    /// This returns whether `fields` changed.
    pub(crate) fn apply_to(&self, fields: &mut Map<String, Value>) -> bool {
        let mut changed = false;

        for (field, value) in &self.fields {
            if fields.get(field) != Some(value) {
                fields.insert(field.clone(), value.clone());
                changed = true;
            }
        }

        for field in &self.deleted {
            if fields.shift_remove(field).is_some() {
                changed = true;
            }
        }

        changed
    }

    /// Return the externally visible projection of this entity.
    ///
    /// Protected fields are removed unless they are listed in `whitelist`.
    pub fn public(&self, whitelist: &[&str]) -> Entity {
        let fields = self
            .fields
            .iter()
            .filter(|(field, _)| !is_protected(field) || whitelist.contains(&field.as_str()))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        Entity {
            kind: self.kind,
            id: self.id.clone(),
            fields,
            deleted: BTreeSet::new(),
        }
    }

    /// The non-protected fields which are not part of the schema of this entity's kind.
    pub fn extension_fields(&self) -> Vec<&str> {
        self.iter()
            .map(|(field, _)| field)
            .filter(|field| !self.kind.is_known(field))
            .collect()
    }

    fn visible_fields(&self) -> BTreeMap<&str, &Value> {
        self.iter().collect()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.visible_fields() == other.visible_fields()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::entity::{MASTER, VAULT};

    use super::*;

    #[test]
    fn protected_fields_are_underscored_upper_case() {
        assert!(is_protected("_UID"));
        assert!(is_protected("_PROTECTED_FIELDS"));
        assert!(!is_protected("_salt"));
        assert!(!is_protected("UID"));
        assert!(!is_protected("pw"));
    }

    #[test]
    fn iteration_skips_protected_fields() {
        let entity = Entity::new(VAULT)
            .with("site", "x.com")
            .with(UID_FIELD, 7)
            .with("pw", "q1");

        let fields: Vec<_> = entity.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["site", "pw"]);
        assert!(entity.contains(UID_FIELD));
    }

    #[test]
    fn update_overwrites_and_deletes() {
        let mut record = Entity::new(VAULT)
            .with("site", "x.com")
            .with("pw", "q1")
            .with("label", "mail");
        let update = Entity::new(VAULT)
            .with("pw", DELETE)
            .with("label", "work")
            .with("email", "a@x.com");

        record.update(&update);

        assert_eq!(record.get("pw"), None);
        assert_eq!(record.get("label"), Some(&json!("work")));
        assert_eq!(record.get("email"), Some(&json!("a@x.com")));
        assert_eq!(record.get("site"), Some(&json!("x.com")));
    }

    #[test]
    fn setting_a_deleted_field_clears_the_mark() {
        let mut update = Entity::new(VAULT);
        update.set("pw", DELETE);
        assert!(update.is_deleted("pw"));

        update.set("pw", "q2");
        assert!(!update.is_deleted("pw"));
        assert_eq!(update.get("pw"), Some(&json!("q2")));
    }

    #[test]
    fn applying_an_identical_update_reports_no_change() {
        let mut fields = Map::new();
        fields.insert(String::from("pw"), json!("q1"));

        let same = Entity::new(VAULT).with("pw", "q1");
        assert!(!same.apply_to(&mut fields));

        let absent = Entity::new(VAULT).with("site", DELETE);
        assert!(!absent.apply_to(&mut fields));

        let different = Entity::new(VAULT).with("pw", "q2");
        assert!(different.apply_to(&mut fields));
    }

    #[test]
    fn equality_ignores_protected_fields_and_order() {
        let first = Entity::new(MASTER)
            .with_id(1u64)
            .with("user", "alice")
            .with("pw", "p1")
            .with(UID_FIELD, 3);
        let second = Entity::new(MASTER)
            .with_id(1u64)
            .with("pw", "p1")
            .with("user", "alice");

        assert_eq!(first, second);
        assert_ne!(first, second.clone().with_id(2u64));
        assert_ne!(first, second.with("pw", "p2").with_id(1u64));
    }

    #[test]
    fn public_projection_respects_whitelist() {
        let entity = Entity::new(VAULT)
            .with_id(4u64)
            .with("site", "x.com")
            .with(UID_FIELD, 7)
            .with(PROTECTED_FIELDS_FIELD, json!(["pw"]));

        let public = entity.public(&[]);
        assert!(!public.contains(UID_FIELD));
        assert!(!public.contains(PROTECTED_FIELDS_FIELD));
        assert_eq!(public.id(), Some(&RecordId::Int(4)));

        let whitelisted = entity.public(&[UID_FIELD]);
        assert!(whitelisted.contains(UID_FIELD));
        assert!(!whitelisted.contains(PROTECTED_FIELDS_FIELD));
    }

    #[test]
    fn unknown_fields_are_extensions() {
        let entity = Entity::new(MASTER)
            .with("user", "alice")
            .with("hint", "cat")
            .with(UID_FIELD, 1);

        assert_eq!(entity.extension_fields(), vec!["hint"]);
    }

    #[test]
    fn empty_entities_have_only_protected_fields() {
        assert!(Entity::new(VAULT).is_empty());
        assert!(Entity::new(VAULT).with(UID_FIELD, 7).is_empty());
        assert!(!Entity::new(VAULT).with("site", "x.com").is_empty());
    }
}
