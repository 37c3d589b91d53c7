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

//! `vault-store` is the record-persistence core of a personal password vault.
//!
//! This crate provides a single CRUD contract, [`Repository`], over a number of interchangeable
//! storage backends. Records are [`Entity`] values: ordered field maps tagged with an entity kind
//! and an optional identifier. Every backend supports the same criteria-based queries, partial
//! updates with explicit field deletion, and bulk operations, and every backend reconciles its own
//! identifier model behind the same [`RecordId`] type.
//!
//! The following backends are provided out of the box:
//! - `MemoryStore` stores records in memory and assigns sequential integer ids.
//! - `DocumentStore` stores a table of records in a single JSON document and assigns sequential
//! integer ids.
//! - `FilesystemStore` stores one JSON file per record and uses relative paths as ids.
//!
//! Any backend can be wrapped in a `GitVersioned` repository, which commits every mutation to a
//! git repository rooted at the backend's storage root and pushes it to the configured remotes.
//!
//! On top of the repository contract, the [`support`] module enforces the business rules of a
//! password vault: one master password per user, non-empty vault entries, and owner-scoped
//! access to vault entries.
//!
//! # Examples
//! ```
//! use vault_store::entity::{Entity, MASTER};
//! use vault_store::store::{MemoryConfig, OpenRepo, Repository};
//! use vault_store::support::{MasterKey, MasterSupport};
//!
//! fn main() -> vault_store::Result<()> {
//!     let repo = MemoryConfig::new().open(MASTER)?;
//!     let mut masters = MasterSupport::new(repo);
//!
//!     let entity = Entity::new(MASTER)
//!         .with("user", "alice")
//!         .with("token", "t1")
//!         .with("pw", "p1")
//!         .with("salt", "s1");
//!     let id = masters.create_master_password(entity)?;
//!
//!     let master = masters.read_master_password(MasterKey::Id(id))?;
//!     assert_eq!(master.get("pw"), Some(&"p1".into()));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//! Some functionality is gated behind cargo features, all of which are enabled by default:
//!
//! Type | Cargo Feature
//! --- | ---
//! `DocumentStore` | `store-document`
//! `FilesystemStore` | `store-filesystem`
//! `GitVersioned` | `git-versioning`

pub use serde_json;
pub use uuid;

pub use entity::{Entity, EntityKind, IdKind, RecordId};
pub use error::{Error, ErrorClass, Result};
pub use query::{Logic, Query};
pub use store::Repository;

pub mod entity;
mod error;
#[cfg(feature = "git-versioning")]
pub mod git;
pub mod query;
pub mod store;
pub mod support;
