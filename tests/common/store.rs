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

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::process::Command;

use rstest::fixture;
use tempfile::TempDir;

use vault_store::entity::{Entity, EntityKind, VAULT};
use vault_store::git::GitConfig;
use vault_store::store::{
    DocumentConfig, DocumentStore, FilesystemConfig, FilesystemStore, MemoryConfig, OpenRepo,
    Repository,
};
use vault_store::RecordId;

/// A value which is tied to the lifetime of a temporary directory.
pub struct WithTempDir<T> {
    directory: TempDir,
    value: T,
}

impl<T> WithTempDir<T> {
    /// The path of the temporary directory.
    pub fn path(&self) -> &Path {
        self.directory.path()
    }

    /// Transform the value while keeping the temporary directory alive.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WithTempDir<U> {
        WithTempDir {
            directory: self.directory,
            value: f(self.value),
        }
    }
}

impl<T> Deref for WithTempDir<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for WithTempDir<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

/// Return whether a `git` executable is available.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run `git` in `directory` and return its trimmed standard output.
pub fn git(directory: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(directory)
        .output()
        .unwrap();
    assert!(output.status.success(), "git {:?} failed", args);
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// A storage backend to run a test against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Document,
    Filesystem,
    GitFilesystem,
}

impl Backend {
    /// Open an empty repository of this backend for the given `kind`.
    ///
    /// This returns `None` if the backend is not available in this environment.
    pub fn open(self, kind: EntityKind) -> Option<WithTempDir<Box<dyn Repository>>> {
        let directory = tempfile::tempdir().unwrap();
        let repo: Box<dyn Repository> = match self {
            Backend::Memory => Box::new(MemoryConfig::new().open(kind).unwrap()),
            Backend::Document => Box::new(
                DocumentConfig::new(directory.path().join("db.json"))
                    .open(kind)
                    .unwrap(),
            ),
            Backend::Filesystem => Box::new(
                FilesystemConfig::new(directory.path().join("records"))
                    .open(kind)
                    .unwrap(),
            ),
            Backend::GitFilesystem => {
                if !git_available() {
                    return None;
                }
                let store = FilesystemConfig::new(directory.path().join("records"))
                    .open(kind)
                    .unwrap();
                Box::new(GitConfig::default().wrap(store).unwrap())
            }
        };

        Some(WithTempDir {
            directory,
            value: repo,
        })
    }
}

/// Create `entity` in `repo`, generating a key if the backend requires one.
pub fn create(repo: &mut impl Repository, entity: &Entity) -> vault_store::Result<RecordId> {
    match repo.create(entity) {
        Err(vault_store::Error::RequiresId) => {
            repo.create(&entity.clone().with_id(RecordId::new_key()))
        }
        result => result,
    }
}

/// A document store of vault entries at `<temp>/db.json`.
#[fixture]
pub fn document_store() -> WithTempDir<DocumentStore> {
    let directory = tempfile::tempdir().unwrap();
    let store = DocumentConfig::new(directory.path().join("db.json"))
        .open(VAULT)
        .unwrap();
    WithTempDir {
        directory,
        value: store,
    }
}

/// A filesystem store of vault entries at `<temp>/records`.
#[fixture]
pub fn filesystem_store() -> WithTempDir<FilesystemStore> {
    let directory = tempfile::tempdir().unwrap();
    let store = FilesystemConfig::new(directory.path().join("records"))
        .open(VAULT)
        .unwrap();
    WithTempDir {
        directory,
        value: store,
    }
}
