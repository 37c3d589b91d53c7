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

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The kind of identifier a backend uses for its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// Sequential integers assigned by the backend.
    Int,

    /// Path-like string keys, usually supplied by the caller.
    Key,
}

/// The identifier of a record in a repository.
///
/// UUIDs are carried as `Key` values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(u64),
    Key(String),
}

impl RecordId {
    /// Generate a new random key.
    pub fn new_key() -> Self {
        RecordId::Key(Uuid::new_v4().as_hyphenated().to_string())
    }

    /// The kind of this identifier.
    pub fn kind(&self) -> IdKind {
        match self {
            RecordId::Int(_) => IdKind::Int,
            RecordId::Key(_) => IdKind::Key,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            RecordId::Int(id) => Some(*id),
            RecordId::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            RecordId::Int(_) => None,
            RecordId::Key(key) => Some(key),
        }
    }

    /// Convert this identifier to the JSON value it is stored as in a field.
    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(id) => Value::from(*id),
            RecordId::Key(key) => Value::from(key.as_str()),
        }
    }

    /// Parse an identifier stored in a field.
    ///
    /// This returns `None` if `value` is not a non-negative integer or a string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_u64().map(RecordId::Int),
            Value::String(key) => Some(RecordId::Key(key.clone())),
            _ => None,
        }
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Key(key) => write!(f, "{}", key),
        }
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(key: &str) -> Self {
        RecordId::Key(key.to_string())
    }
}

impl From<String> for RecordId {
    fn from(key: String) -> Self {
        RecordId::Key(key)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        RecordId::Key(uuid.as_hyphenated().to_string())
    }
}
