// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{io, Error};

/// The `to_install` manifest.
///
/// Produced by a package build as `<name>.install` in its build tree and
/// archived per release under `to_install/`; the installer consumes it to
/// place artifacts and the remover to take them away again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToInstall {
    /// Relative path descriptors copied below `lib/<name>/`
    #[serde(default)]
    pub lib: Vec<String>,
    /// Single-file moves into the program directory
    #[serde(default)]
    pub bin: Vec<Move>,
    /// Moves to absolute destinations outside the managed tree.
    /// Each one is confirmed interactively before being honored.
    #[serde(default)]
    pub misc: Vec<Move>,
}

impl ToInstall {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_yaml::from_slice(bytes)?)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_slice(&io::read(path)?)
    }

    pub fn find(path: impl AsRef<Path>) -> Result<Option<Self>, Error> {
        io::find(path)?.map(|bytes| Self::from_slice(&bytes)).transpose()
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        io::write_yaml(path, self)
    }
}

/// A source to destination movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub src: String,
    pub dst: String,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.src, self.dst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lwt-2.3.1");

        let manifest = ToInstall {
            lib: vec!["_build/lib/*.cma".into()],
            bin: vec![Move {
                src: "_build/main.byte".into(),
                dst: "lwt-top".into(),
            }],
            misc: vec![],
        };

        manifest.write(&path).unwrap();
        assert_eq!(ToInstall::read(&path).unwrap(), manifest);
    }

    #[test]
    fn absent_manifest() {
        assert!(ToInstall::find("/nonexistent/manifest").unwrap().is_none());
        assert!(matches!(
            ToInstall::read("/nonexistent/manifest"),
            Err(Error::Missing(_))
        ));
    }
}
