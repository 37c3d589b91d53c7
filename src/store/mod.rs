//! Storage backends for records.
//!
//! This module provides the storage backends of a vault. Every backend implements the
//! [`Repository`] trait, which is the uniform CRUD contract used by the rest of the crate. Backends
//! differ in how they persist records and in the kind of ids they use, but queries, partial updates
//! and bulk operations behave the same way for all of them.
//!
//! For each backend, there is a corresponding type which provides the necessary configuration to
//! open it. These config types implement [`OpenRepo`]. When the backend is chosen at runtime, use
//! [`RepoConfig`], which opens a boxed repository and optionally wraps it in a git-versioning
//! layer.
//!
//! Backends assume a single writer at a time. Callers which share a repository between threads or
//! processes need to provide their own mutual exclusion.
//!
//! [`Repository`]: crate::store::Repository
//! [`OpenRepo`]: crate::store::OpenRepo
//! [`RepoConfig`]: crate::store::RepoConfig

#[cfg(feature = "store-document")]
pub use self::document_store::{DocumentConfig, DocumentStore};
#[cfg(feature = "store-filesystem")]
pub use self::filesystem_store::{FilesystemConfig, FilesystemStore};
pub use self::memory_store::{MemoryConfig, MemoryStore};
pub use self::open_repo::{OpenRepo, RepoConfig, StoreConfig};
pub use self::repository::Repository;

mod common;
mod document_store;
mod filesystem_store;
mod memory_store;
mod open_repo;
mod repository;
