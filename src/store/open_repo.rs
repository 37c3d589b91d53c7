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

use serde::Deserialize;

use crate::entity::EntityKind;
#[cfg(feature = "git-versioning")]
use crate::git::GitConfig;
#[cfg(feature = "store-document")]
use crate::store::DocumentConfig;
#[cfg(feature = "store-filesystem")]
use crate::store::FilesystemConfig;
use crate::store::{MemoryConfig, Repository};

/// A value which can be used to open a `Repository`.
pub trait OpenRepo {
    /// The type of `Repository` which this value can be used to open.
    type Repo: Repository + 'static;

    /// Open or create a repository of type `Repo` for entities of the given `kind`.
    ///
    /// This opens the storage, creating it if it does not already exist.
    ///
    /// # Errors
    /// - `Error::Corrupt`: The storage exists but does not have the expected shape.
    /// - `Error::Git`: A git command failed while preparing a versioned repository.
    /// - `Error::Store`: An error occurred with the storage backend.
    /// - `Error::Io`: An I/O error occurred.
    fn open(&self, kind: EntityKind) -> crate::Result<Self::Repo>;
}

/// A selection of a storage backend and its connection parameters.
///
/// This is useful for choosing a backend at runtime, for example from a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Open a `MemoryStore`.
    Memory,

    /// Open a `DocumentStore`.
    #[cfg(feature = "store-document")]
    Document(DocumentConfig),

    /// Open a `FilesystemStore`.
    #[cfg(feature = "store-filesystem")]
    Filesystem(FilesystemConfig),
}

impl OpenRepo for StoreConfig {
    type Repo = Box<dyn Repository>;

    fn open(&self, kind: EntityKind) -> crate::Result<Self::Repo> {
        Ok(match self {
            StoreConfig::Memory => Box::new(MemoryConfig::new().open(kind)?),
            #[cfg(feature = "store-document")]
            StoreConfig::Document(config) => Box::new(config.open(kind)?),
            #[cfg(feature = "store-filesystem")]
            StoreConfig::Filesystem(config) => Box::new(config.open(kind)?),
        })
    }
}

/// The configuration for opening a repository with an optional git-versioning layer.
///
/// # Examples
/// ```
/// use vault_store::entity::VAULT;
/// use vault_store::store::{OpenRepo, RepoConfig, Repository, StoreConfig};
///
/// let config = RepoConfig::new(StoreConfig::Memory);
/// let repo = config.open(VAULT).unwrap();
/// assert!(repo.find_all().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RepoConfig {
    /// The storage backend.
    pub store: StoreConfig,

    /// The git configuration, if every mutation should be committed.
    #[cfg(feature = "git-versioning")]
    #[serde(default)]
    pub git: Option<GitConfig>,
}

impl RepoConfig {
    /// Create a config for an unversioned repository using the given `store`.
    pub fn new(store: StoreConfig) -> Self {
        RepoConfig {
            store,
            #[cfg(feature = "git-versioning")]
            git: None,
        }
    }

    #[cfg(feature = "git-versioning")]
    fn versioned(&self, repo: Box<dyn Repository>) -> crate::Result<Box<dyn Repository>> {
        match &self.git {
            Some(git) => Ok(Box::new(git.wrap(repo)?)),
            None => Ok(repo),
        }
    }

    #[cfg(not(feature = "git-versioning"))]
    fn versioned(&self, repo: Box<dyn Repository>) -> crate::Result<Box<dyn Repository>> {
        Ok(repo)
    }
}

impl OpenRepo for RepoConfig {
    type Repo = Box<dyn Repository>;

    fn open(&self, kind: EntityKind) -> crate::Result<Self::Repo> {
        let repo = self.store.open(kind)?;
        self.versioned(repo)
    }
}
