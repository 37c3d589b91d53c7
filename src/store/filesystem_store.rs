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

#![cfg(feature = "store-filesystem")]

use std::fs::{create_dir_all, read_dir, remove_dir, remove_file, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use relative_path::{Component, RelativePath, RelativePathBuf};
use serde::Deserialize;
use serde_json::{Map, Value};
use walkdir::{DirEntry, WalkDir};

use super::common::{read_json, write_json};
use crate::entity::{Entity, EntityKind, IdKind, RecordId};
use crate::store::{OpenRepo, Repository};

/// The extension of record files.
const RECORD_EXTENSION: &str = ".json";

/// The size of the buffer used to overwrite files before they are removed.
const WIPE_BUFFER_SIZE: usize = 4096;

/// Normalize a record id into a path relative to the root directory.
///
/// A trailing `.json` extension is stripped and `.` components are resolved. Absolute paths,
/// paths which escape the root, paths with hidden components and paths which still end in `.json`
/// after stripping are rejected.
fn normalize_id(id: &RecordId) -> crate::Result<RelativePathBuf> {
    let key = id.as_key().ok_or(crate::Error::IdType {
        expected: IdKind::Key,
    })?;
    let key = key.strip_suffix(RECORD_EXTENSION).unwrap_or(key);

    if key.starts_with('/') || key.starts_with('\\') || Path::new(key).has_root() {
        return Err(crate::Error::InvalidPath);
    }

    let normalized = RelativePath::new(key).normalize();
    let mut is_empty = true;
    for component in normalized.components() {
        match component {
            Component::Normal(name) if !name.starts_with('.') => is_empty = false,
            _ => return Err(crate::Error::InvalidPath),
        }
    }

    if is_empty || normalized.as_str().ends_with(RECORD_EXTENSION) {
        return Err(crate::Error::InvalidPath);
    }

    Ok(normalized)
}

/// Return whether `entry` is hidden and should be skipped when scanning.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(true, |name| name.starts_with('.'))
}

/// Overwrite the file at `path` with zeros, sync it, and then remove it.
fn wipe_file(path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    let mut remaining = file.metadata()?.len();
    let zeros = [0u8; WIPE_BUFFER_SIZE];

    while remaining > 0 {
        let size = remaining.min(WIPE_BUFFER_SIZE as u64) as usize;
        file.write_all(&zeros[..size])?;
        remaining -= size as u64;
    }

    file.sync_all()?;
    drop(file);
    remove_file(path)
}

/// The configuration for opening a [`FilesystemStore`].
///
/// [`FilesystemStore`]: crate::store::FilesystemStore
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(docsrs, doc(cfg(feature = "store-filesystem")))]
pub struct FilesystemConfig {
    /// The directory which holds the record files.
    pub root: PathBuf,

    /// Whether `create` may replace an existing record file.
    #[serde(default)]
    pub overwrite: bool,

    /// Whether removed record files are overwritten with zeros before they are unlinked.
    #[serde(default)]
    pub secure_delete: bool,
}

impl FilesystemConfig {
    /// Create a config for the directory at `root` with the default options.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FilesystemConfig {
            root: root.into(),
            overwrite: false,
            secure_delete: false,
        }
    }
}

impl OpenRepo for FilesystemConfig {
    type Repo = FilesystemStore;

    fn open(&self, kind: EntityKind) -> crate::Result<Self::Repo> {
        create_dir_all(&self.root)?;

        Ok(FilesystemStore {
            kind,
            root: self.root.clone(),
            overwrite: self.overwrite,
            secure_delete: self.secure_delete,
        })
    }
}

/// A `Repository` which stores each record as a JSON file in a directory.
///
/// Records are identified by their path relative to the root directory without the `.json`
/// extension, so the record `sites/mail` is stored at `<root>/sites/mail.json`. Ids must be
/// supplied by the caller; `create` fails with `Error::RequiresId` otherwise.
///
/// Queries scan every record file under the root directory. Hidden files and directories, like a
/// `.git` directory, are ignored.
///
/// You can use [`FilesystemConfig`] to open a repository of this type.
///
/// [`FilesystemConfig`]: crate::store::FilesystemConfig
#[derive(Debug)]
#[cfg_attr(docsrs, doc(cfg(feature = "store-filesystem")))]
pub struct FilesystemStore {
    kind: EntityKind,
    root: PathBuf,
    overwrite: bool,
    secure_delete: bool,
}

impl FilesystemStore {
    /// Return the path of the file which stores the record with the given normalized `id`.
    fn record_path(&self, id: &RelativePath) -> PathBuf {
        RelativePathBuf::from(format!("{}{}", id, RECORD_EXTENSION)).to_path(&self.root)
    }

    /// Read the fields of the record stored at `path`.
    fn read_record(&self, path: &Path) -> crate::Result<Option<Map<String, Value>>> {
        match read_json::<Value>(path)? {
            Some(Value::Object(fields)) => Ok(Some(fields)),
            Some(_) => Err(crate::Error::Corrupt),
            None => Ok(None),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.secure_delete {
            wipe_file(path)
        } else {
            remove_file(path)
        }
    }

    /// Return the normalized ids and paths of every record file.
    fn scan(&self) -> crate::Result<Vec<(RelativePathBuf, PathBuf)>> {
        let mut records = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|error| crate::Error::Store(anyhow::Error::from(error)))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|error| crate::Error::Store(anyhow::Error::from(error)))?;
            let relative_path = RelativePathBuf::from_path(relative_path)
                .map_err(|error| crate::Error::Store(anyhow::Error::from(error)))?;

            match relative_path.as_str().strip_suffix(RECORD_EXTENSION) {
                Some(id) if !id.ends_with(RECORD_EXTENSION) => {
                    records.push((RelativePathBuf::from(id), entry.into_path()))
                }
                _ => continue,
            }
        }

        Ok(records)
    }

    /// Remove every empty directory under the root directory.
    fn remove_empty_directories(&self) -> crate::Result<()> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|error| crate::Error::Store(anyhow::Error::from(error)))?;
            if entry.file_type().is_dir() && read_dir(entry.path())?.next().is_none() {
                remove_dir(entry.path())?;
            }
        }

        Ok(())
    }
}

impl Repository for FilesystemStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn id_kind(&self) -> IdKind {
        IdKind::Key
    }

    fn storage_root(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn create(&mut self, entity: &Entity) -> crate::Result<RecordId> {
        let id = normalize_id(entity.id().ok_or(crate::Error::RequiresId)?)?;
        let path = self.record_path(&id);

        if path.exists() && !self.overwrite {
            return Err(crate::Error::AlreadyExists);
        }

        write_json(&path, entity.fields())?;

        Ok(RecordId::Key(id.into_string()))
    }

    fn find_by_id(&self, id: &RecordId) -> crate::Result<Option<Entity>> {
        let id = normalize_id(id)?;
        let path = self.record_path(&id);
        Ok(self.read_record(&path)?.map(|fields| {
            Entity::from_fields(self.kind, Some(RecordId::Key(id.into_string())), fields)
        }))
    }

    fn find_all(&self) -> crate::Result<Vec<Entity>> {
        let mut entities = Vec::new();
        for (id, path) in self.scan()? {
            if let Some(fields) = self.read_record(&path)? {
                entities.push(Entity::from_fields(
                    self.kind,
                    Some(RecordId::Key(id.into_string())),
                    fields,
                ));
            }
        }
        Ok(entities)
    }

    fn update_by_id(&mut self, id: &RecordId, update: &Entity) -> crate::Result<Option<RecordId>> {
        let id = normalize_id(id)?;
        let path = self.record_path(&id);

        let mut fields = match self.read_record(&path)? {
            Some(fields) => fields,
            None => return Ok(None),
        };

        if update.apply_to(&mut fields) {
            write_json(&path, &fields)?;
        }

        Ok(Some(RecordId::Key(id.into_string())))
    }

    fn remove_by_id(&mut self, id: &RecordId) -> crate::Result<Option<RecordId>> {
        let id = normalize_id(id)?;
        let path = self.record_path(&id);

        if !path.is_file() {
            return Ok(None);
        }

        self.remove_file(&path)?;
        Ok(Some(RecordId::Key(id.into_string())))
    }

    fn remove_all(&mut self) -> crate::Result<Vec<RecordId>> {
        let mut removed = Vec::new();
        for (id, path) in self.scan()? {
            self.remove_file(&path)?;
            removed.push(RecordId::Key(id.into_string()));
        }
        self.remove_empty_directories()?;
        Ok(removed)
    }
}
