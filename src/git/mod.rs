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

//! A git-versioning layer for repositories.
//!
//! [`GitVersioned`] wraps any [`Repository`] whose records live in a directory and records every
//! mutation as a git commit. Commits are pushed to the configured remotes on a best-effort basis:
//! local durability is guaranteed, remote replication is not. A crash between a commit and its
//! push leaves the local branch ahead of the remote until the next successful push.
//!
//! This layer runs the `git` executable, which must be on the `PATH`.
//!
//! [`GitVersioned`]: crate::git::GitVersioned
//! [`Repository`]: crate::store::Repository

pub use self::config::{
    GitConfig, RemoteAuth, RemoteConfig, DEFAULT_BRANCH, DEFAULT_EMAIL, DEFAULT_NAME,
    DEFAULT_REMOTE,
};
pub use self::versioned::GitVersioned;

mod command;
mod config;
mod versioned;
