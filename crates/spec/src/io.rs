// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Small file access layer shared by every persistent format.
//!
//! Writes go through a temp-then-rename dance so a crash leaves either the
//! previous content or the completed write, never a torn file.

use std::path::Path;

use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Error;

/// Read a file that must exist, mapping absence to [`Error::Missing`]
pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>, Error> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::Missing(path.to_path_buf()));
    }

    Ok(fs::read(path)?)
}

/// Read a file when present
pub fn find(path: impl AsRef<Path>) -> Result<Option<Vec<u8>>, Error> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(None);
    }

    Ok(Some(fs::read(path)?))
}

/// Atomically replace `path` with `bytes`
pub fn write(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), Error> {
    let path = path.as_ref();
    let partial = path.with_extension("part");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&partial, bytes)?;
    fs::rename(&partial, path)?;

    Ok(())
}

pub fn read_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, Error> {
    Ok(serde_yaml::from_slice(&read(path)?)?)
}

pub fn write_yaml<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Error> {
    write(path, serde_yaml::to_string(value)?.as_bytes())
}

/// Load + mutate + atomically store
pub fn modify<T>(path: impl AsRef<Path>, f: impl FnOnce(&mut T)) -> Result<T, Error>
where
    T: Serialize + DeserializeOwned,
{
    let path = path.as_ref();
    let mut value: T = read_yaml(path)?;

    f(&mut value);
    write_yaml(path, &value)?;

    Ok(value)
}
