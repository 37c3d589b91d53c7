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

#![cfg(any(feature = "store-document", feature = "store-filesystem"))]

use std::fs::{create_dir_all, File};
use std::io::{BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

/// Read the JSON file at `path` as a `T`.
///
/// This returns `Ok(None)` if the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> crate::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file)).map_err(crate::Error::Deserialize)?;
    Ok(Some(value))
}

/// Atomically replace the file at `path` with `value` serialized as JSON.
///
/// The data is written to a hidden staging file in the same directory which is then renamed over
/// `path`, so readers see either the old or the new contents.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> crate::Result<()> {
    let directory = match path.parent().ok_or(crate::Error::InvalidPath)? {
        parent if parent.as_os_str().is_empty() => Path::new("."),
        parent => parent,
    };
    create_dir_all(directory)?;

    let data = serde_json::to_vec_pretty(value).map_err(crate::Error::Serialize)?;

    let mut staging_file = NamedTempFile::new_in(directory)?;
    staging_file.write_all(&data)?;
    staging_file.as_file().sync_all()?;
    staging_file
        .persist(path)
        .map_err(|error| crate::Error::Io(error.error))?;

    Ok(())
}
