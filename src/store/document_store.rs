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

#![cfg(feature = "store-document")]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use super::common::{read_json, write_json};
use crate::entity::{Entity, EntityKind, IdKind, RecordId};
use crate::query::Query;
use crate::store::{OpenRepo, Repository};

/// The records of a single table, keyed by id.
type Table = BTreeMap<u64, Map<String, Value>>;

/// The configuration for opening a [`DocumentStore`].
///
/// [`DocumentStore`]: crate::store::DocumentStore
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(docsrs, doc(cfg(feature = "store-document")))]
pub struct DocumentConfig {
    /// The path of the JSON document.
    pub path: PathBuf,

    /// The name of the table in the document.
    ///
    /// This defaults to the table tag of the entity kind.
    #[serde(default)]
    pub table: Option<String>,
}

impl DocumentConfig {
    /// Create a config for the document at `path` using the default table name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DocumentConfig {
            path: path.into(),
            table: None,
        }
    }
}

impl OpenRepo for DocumentConfig {
    type Repo = DocumentStore;

    fn open(&self, kind: EntityKind) -> crate::Result<Self::Repo> {
        let root = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let store = DocumentStore {
            kind,
            path: self.path.clone(),
            root,
            table: self
                .table
                .clone()
                .unwrap_or_else(|| kind.table().to_string()),
        };

        // Create the document if it doesn't exist, or verify that it is readable.
        match store.load()? {
            Some(_) => (),
            None => write_json(&store.path, &Map::new())?,
        }

        Ok(store)
    }
}

/// A `Repository` which stores records in a table of a single JSON document.
///
/// The document is a JSON object keyed by table name. Each table is an object which maps
/// stringified integer ids to the fields of a record. Tables other than the one this repository
/// uses are preserved as they are.
///
/// Records are identified by sequential integers starting at 1. Every operation reads the
/// document, and every operation which changes a record atomically replaces it.
///
/// You can use [`DocumentConfig`] to open a repository of this type.
///
/// [`DocumentConfig`]: crate::store::DocumentConfig
#[derive(Debug)]
#[cfg_attr(docsrs, doc(cfg(feature = "store-document")))]
pub struct DocumentStore {
    kind: EntityKind,
    path: PathBuf,
    root: PathBuf,
    table: String,
}

impl DocumentStore {
    /// The name of the table this repository uses.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Read the whole document, or `None` if it does not exist.
    fn load(&self) -> crate::Result<Option<Map<String, Value>>> {
        match read_json::<Value>(&self.path)? {
            Some(Value::Object(document)) => Ok(Some(document)),
            Some(_) => Err(crate::Error::Corrupt),
            None => Ok(None),
        }
    }

    /// Read the document and parse the table this repository uses.
    fn load_table(&self) -> crate::Result<(Map<String, Value>, Table)> {
        let document = self.load()?.unwrap_or_default();
        let mut table = Table::new();

        match document.get(&self.table) {
            Some(Value::Object(records)) => {
                for (key, fields) in records {
                    let id = key.parse::<u64>().map_err(|_| crate::Error::Corrupt)?;
                    match fields {
                        Value::Object(fields) => table.insert(id, fields.clone()),
                        _ => return Err(crate::Error::Corrupt),
                    };
                }
            }
            Some(_) => return Err(crate::Error::Corrupt),
            None => (),
        }

        Ok((document, table))
    }

    /// Replace the table this repository uses and write the document.
    fn save_table(&self, mut document: Map<String, Value>, table: Table) -> crate::Result<()> {
        let records = table
            .into_iter()
            .map(|(id, fields)| (id.to_string(), Value::Object(fields)))
            .collect::<Map<_, _>>();
        document.insert(self.table.clone(), Value::Object(records));
        write_json(&self.path, &document)
    }

    fn int_id(id: &RecordId) -> crate::Result<u64> {
        id.as_int().ok_or(crate::Error::IdType {
            expected: IdKind::Int,
        })
    }

    fn entity(&self, id: u64, fields: Map<String, Value>) -> Entity {
        Entity::from_fields(self.kind, Some(RecordId::Int(id)), fields)
    }

    /// Merge `update` into every record for which `select` returns `true`.
    ///
    /// The document is written at most once.
    fn update_where(
        &mut self,
        mut select: impl FnMut(u64, &Map<String, Value>) -> bool,
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        let (document, mut table) = self.load_table()?;
        let mut updated = Vec::new();
        let mut changed = false;

        for (id, fields) in table.iter_mut() {
            if select(*id, fields) {
                changed |= update.apply_to(fields);
                updated.push(RecordId::Int(*id));
            }
        }

        if changed {
            self.save_table(document, table)?;
        }

        Ok(updated)
    }

    /// Remove every record for which `select` returns `true`.
    ///
    /// The document is written at most once.
    fn remove_where(
        &mut self,
        mut select: impl FnMut(u64, &Map<String, Value>) -> bool,
    ) -> crate::Result<Vec<RecordId>> {
        let (document, mut table) = self.load_table()?;
        let selected = table
            .iter()
            .filter(|(id, fields)| select(**id, *fields))
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();

        for id in &selected {
            table.remove(id);
        }

        if !selected.is_empty() {
            self.save_table(document, table)?;
        }

        Ok(selected.into_iter().map(RecordId::Int).collect())
    }
}

/// Convert `ids` to integers, failing on the first key.
fn int_ids(ids: &[RecordId]) -> crate::Result<Vec<u64>> {
    ids.iter().map(DocumentStore::int_id).collect()
}

impl Repository for DocumentStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn id_kind(&self) -> IdKind {
        IdKind::Int
    }

    fn storage_root(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn create(&mut self, entity: &Entity) -> crate::Result<RecordId> {
        let (document, mut table) = self.load_table()?;

        let id = match entity.id() {
            Some(id) => {
                let id = Self::int_id(id)?;
                if table.contains_key(&id) {
                    return Err(crate::Error::AlreadyExists);
                }
                id
            }
            None => match table.keys().next_back() {
                Some(last) => last.checked_add(1).ok_or(crate::Error::IdsExhausted)?,
                None => 1,
            },
        };

        table.insert(id, entity.fields().clone());
        self.save_table(document, table)?;

        Ok(RecordId::Int(id))
    }

    fn find_by_id(&self, id: &RecordId) -> crate::Result<Option<Entity>> {
        let id = Self::int_id(id)?;
        let (_, mut table) = self.load_table()?;
        Ok(table.remove(&id).map(|fields| self.entity(id, fields)))
    }

    fn find_all(&self) -> crate::Result<Vec<Entity>> {
        let (_, table) = self.load_table()?;
        Ok(table
            .into_iter()
            .map(|(id, fields)| self.entity(id, fields))
            .collect())
    }

    fn update_by_id(&mut self, id: &RecordId, update: &Entity) -> crate::Result<Option<RecordId>> {
        let int_id = Self::int_id(id)?;
        Ok(self
            .update_where(|candidate, _| candidate == int_id, update)?
            .into_iter()
            .next())
    }

    fn remove_by_id(&mut self, id: &RecordId) -> crate::Result<Option<RecordId>> {
        let int_id = Self::int_id(id)?;
        Ok(self
            .remove_where(|candidate, _| candidate == int_id)?
            .into_iter()
            .next())
    }

    fn remove_all(&mut self) -> crate::Result<Vec<RecordId>> {
        self.remove_where(|_, _| true)
    }

    fn find_by_crit(&self, criteria: &Entity) -> crate::Result<Vec<Entity>> {
        let query = Query::all(criteria);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let (_, table) = self.load_table()?;
        Ok(table
            .into_iter()
            .filter(|(_, fields)| query.matches_fields(fields))
            .map(|(id, fields)| self.entity(id, fields))
            .collect())
    }

    fn update_by_ids(
        &mut self,
        ids: &[RecordId],
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        let ids = int_ids(ids)?;
        self.update_where(|id, _| ids.contains(&id), update)
    }

    fn update_by_crit(&mut self, criteria: &Entity, update: &Entity) -> crate::Result<Vec<RecordId>> {
        let query = Query::all(criteria);
        self.update_where(|_, fields| query.matches_fields(fields), update)
    }

    fn update(
        &mut self,
        ids: &[RecordId],
        criteria: &Entity,
        update: &Entity,
    ) -> crate::Result<Vec<RecordId>> {
        let ids = int_ids(ids)?;
        let query = Query::all(criteria);
        self.update_where(
            |id, fields| ids.contains(&id) && query.matches_fields(fields),
            update,
        )
    }

    fn remove_by_ids(&mut self, ids: &[RecordId]) -> crate::Result<Vec<RecordId>> {
        let ids = int_ids(ids)?;
        self.remove_where(|id, _| ids.contains(&id))
    }

    fn remove_by_crit(&mut self, criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        let query = Query::all(criteria);
        self.remove_where(|_, fields| query.matches_fields(fields))
    }

    fn remove(&mut self, ids: &[RecordId], criteria: &Entity) -> crate::Result<Vec<RecordId>> {
        let ids = int_ids(ids)?;
        let query = Query::all(criteria);
        self.remove_where(|id, fields| ids.contains(&id) && query.matches_fields(fields))
    }
}
