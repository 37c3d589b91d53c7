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

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::versioned::GitVersioned;
use crate::store::Repository;

/// The default author name of commits.
pub const DEFAULT_NAME: &str = "db-agent";

/// The default author email of commits.
pub const DEFAULT_EMAIL: &str = "db.agent@mail.com";

/// The default branch of a new git repository.
pub const DEFAULT_BRANCH: &str = "main";

/// The default name of a remote.
pub const DEFAULT_REMOTE: &str = "origin";

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_email() -> String {
    DEFAULT_EMAIL.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

/// Credentials for pushing to a remote over HTTP.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(docsrs, doc(cfg(feature = "git-versioning")))]
pub struct RemoteAuth {
    /// The user name.
    pub username: String,

    /// The access token.
    pub token: SecretString,
}

/// A git remote which every commit is pushed to.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(docsrs, doc(cfg(feature = "git-versioning")))]
pub struct RemoteConfig {
    /// The name of the remote.
    #[serde(default = "default_remote")]
    pub name: String,

    /// The URL of the remote.
    pub url: String,

    /// The credentials to embed in the URL, if any.
    #[serde(default)]
    pub auth: Option<RemoteAuth>,
}

impl RemoteConfig {
    /// Create a config for an unauthenticated remote named `origin`.
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            name: default_remote(),
            url: url.into(),
            auth: None,
        }
    }

    /// The URL to register with git.
    ///
    /// When credentials are given, `username:token@` is inserted after the `scheme://` prefix.
    /// URLs without a scheme are returned unchanged.
    pub(super) fn authenticated_url(&self) -> String {
        match (&self.auth, self.url.split_once("://")) {
            (Some(auth), Some((scheme, rest))) => format!(
                "{}://{}:{}@{}",
                scheme,
                auth.username,
                auth.token.expose_secret(),
                rest
            ),
            _ => self.url.clone(),
        }
    }
}

/// The configuration of a git-versioning layer.
///
/// # Examples
/// ```no_run
/// use vault_store::entity::VAULT;
/// use vault_store::git::{GitConfig, RemoteConfig};
/// use vault_store::store::{FilesystemConfig, OpenRepo};
///
/// let store = FilesystemConfig::new("/var/lib/vault").open(VAULT).unwrap();
///
/// let mut config = GitConfig::default();
/// config.remotes.push(RemoteConfig::new("https://example.com/vault.git"));
/// let repo = config.wrap(store).unwrap();
/// ```
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(docsrs, doc(cfg(feature = "git-versioning")))]
pub struct GitConfig {
    /// The root of the git working tree.
    ///
    /// This defaults to the storage root of the wrapped repository.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// The author name of commits.
    #[serde(default = "default_name")]
    pub name: String,

    /// The author email of commits.
    #[serde(default = "default_email")]
    pub email: String,

    /// The branch of a newly initialized git repository.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// The remotes to register and push to.
    #[serde(default)]
    pub remotes: Vec<RemoteConfig>,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            path: None,
            name: default_name(),
            email: default_email(),
            branch: default_branch(),
            remotes: Vec::new(),
        }
    }
}

impl GitConfig {
    /// Wrap `repo` so that each of its mutations is committed and pushed.
    ///
    /// This initializes a git repository at the working tree root if there is none and registers
    /// the configured remotes which are not registered yet.
    ///
    /// # Errors
    /// - `Error::InvalidPath`: No path is configured and `repo` has no storage root.
    /// - `Error::Git`: A git command failed.
    /// - `Error::Io`: An I/O error occurred.
    pub fn wrap<R: Repository>(&self, repo: R) -> crate::Result<GitVersioned<R>> {
        GitVersioned::new(repo, self)
    }
}
