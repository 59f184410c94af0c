// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Client-owned persistent state: the `config` file and the `installed` set.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{io, Error, Name, Version};

/// Protocol revision spoken by this client
pub const API_VERSION: u32 = 1;

/// The root `config` file: remote list in priority order plus the
/// toolchain the install tree was built against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api_version: u32,
    pub remotes: Vec<String>,
    pub compiler_version: String,
}

impl Config {
    pub fn new(remotes: Vec<String>, compiler_version: impl ToString) -> Self {
        Self {
            api_version: API_VERSION,
            remotes,
            compiler_version: compiler_version.to_string(),
        }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, Error> {
        io::read_yaml(path)
    }

    pub fn find(path: impl AsRef<Path>) -> Result<Option<Self>, Error> {
        io::find(path)?
            .map(|bytes| Ok(serde_yaml::from_slice(&bytes)?))
            .transpose()
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        io::write_yaml(path, self)
    }
}

/// The `installed` mapping, one version at most per package name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installed(BTreeMap<Name, Version>);

impl Installed {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, Error> {
        io::read_yaml(path)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        io::write_yaml(path, self)
    }

    pub fn get(&self, name: &Name) -> Option<&Version> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: Name, version: Version) {
        self.0.insert(name, version);
    }

    pub fn remove(&mut self, name: &Name) -> Option<Version> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Version)> {
        self.0.iter()
    }
}

impl FromIterator<(Name, Version)> for Installed {
    fn from_iter<I: IntoIterator<Item = (Name, Version)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::HeadState;

    #[test]
    fn config_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");

        let config = Config::new(vec!["opam://a.example:9999".into()], "4.14.2");
        config.write(&path).unwrap();
        let first = fs_err::read(&path).unwrap();

        // add + remove a remote, expect byte equality with the original
        let mut touched = config.clone();
        touched.remotes.insert(0, "opam://b.example:9999".into());
        touched.write(&path).unwrap();
        touched.remotes.remove(0);
        touched.write(&path).unwrap();

        assert_eq!(fs_err::read(&path).unwrap(), first);
    }

    #[test]
    fn installed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed");

        let mut installed = Installed::default();
        installed.insert("lwt".parse().unwrap(), Version::Release("2.3.1".into()));
        installed.insert("dose".parse().unwrap(), Version::Head(HeadState::Behind));

        installed.write(&path).unwrap();
        let read = Installed::read(&path).unwrap();

        assert_eq!(read, installed);
        assert_eq!(
            read.get(&"dose".parse().unwrap()),
            Some(&Version::Head(HeadState::Behind))
        );
    }
}
