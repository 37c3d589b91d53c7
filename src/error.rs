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

use std::io;
use std::result;

use thiserror::Error as DeriveError;

use crate::entity::IdKind;

/// The error type for operations with a repository.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// The backend needs a caller-supplied id and none was given.
    ///
    /// This is recoverable by generating an id and retrying.
    #[error("The backend requires a caller-supplied record id.")]
    RequiresId,

    /// A master password already exists for the given user.
    #[error("A master password already exists for user `{0}`.")]
    MasterPasswordExists(String),

    /// More than one master password exists for the given user.
    ///
    /// This indicates that the storage is corrupt.
    #[error("Found {count} master passwords for user `{user}`.")]
    MultipleMasterPasswords { user: String, count: usize },

    /// The given user or user id does not exist.
    #[error("User `{0}` does not exist.")]
    UserNotExists(String),

    /// The requested record does not exist or is not visible to the caller.
    #[error("The requested record was not found.")]
    RecordNotFound,

    /// An empty record was about to be inserted.
    #[error("Cannot insert an empty record.")]
    EmptyRecordInsertion,

    /// A query was made without any id or criteria.
    #[error("A query needs at least one id or criterion.")]
    EmptyQuery,

    /// An update attempted to change an immutable field.
    #[error("The field `{0}` can not be updated.")]
    InvalidUpdate(String),

    /// An update attempted to change the owner of a record.
    #[error("The owner field `{0}` can not be updated.")]
    OwnerMutation(String),

    /// An id does not match the id kind of the backend.
    #[error("Expected a record id of kind {expected:?}.")]
    IdType { expected: IdKind },

    /// A required field is missing from an entity.
    #[error("The required field `{0}` is missing.")]
    MissingField(String),

    /// A resource already exists.
    #[error("A resource already exists.")]
    AlreadyExists,

    /// No more sequential record ids can be assigned.
    #[error("No more record ids can be assigned.")]
    IdsExhausted,

    /// The provided record path is invalid.
    #[error("The provided record path is invalid.")]
    InvalidPath,

    /// The stored data does not have the expected shape.
    #[error("The stored data is corrupt.")]
    Corrupt,

    /// A value could not be serialized.
    #[error("A value could not be serialized.")]
    Serialize(#[source] serde_json::Error),

    /// A value could not be deserialized.
    #[error("A value could not be deserialized.")]
    Deserialize(#[source] serde_json::Error),

    /// A git command failed.
    #[error("`git {command}` failed: {message}")]
    Git { command: String, message: String },

    /// An error occurred with the storage backend.
    #[error("{0}")]
    Store(#[from] anyhow::Error),

    /// An I/O error occurred.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// A coarse classification of an [`Error`] for callers which surface errors to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The target of a lookup or mutation does not exist.
    NotFound,

    /// The operation conflicts with stored state.
    Conflict,

    /// The caller's input is malformed or violates an invariant.
    Client,

    /// The storage failed or is corrupt.
    Internal,
}

impl Error {
    /// Return how this error should be surfaced to a client.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::UserNotExists(_) | Error::RecordNotFound => ErrorClass::NotFound,
            Error::MasterPasswordExists(_) | Error::AlreadyExists | Error::IdsExhausted => {
                ErrorClass::Conflict
            }
            Error::EmptyRecordInsertion
            | Error::EmptyQuery
            | Error::InvalidUpdate(_)
            | Error::OwnerMutation(_)
            | Error::IdType { .. }
            | Error::MissingField(_)
            | Error::InvalidPath
            | Error::RequiresId => ErrorClass::Client,
            Error::MultipleMasterPasswords { .. }
            | Error::Corrupt
            | Error::Serialize(_)
            | Error::Deserialize(_)
            | Error::Git { .. }
            | Error::Store(_)
            | Error::Io(_) => ErrorClass::Internal,
        }
    }
}

/// The result type for operations with a repository.
pub type Result<T> = result::Result<T, Error>;
