// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Version;

/// The name of a package.
///
/// A non-empty token that may not contain the `-` version separator, so a
/// rendered [`NV`] splits back unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Name {
    type Err = InvalidNV;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.contains('-') {
            return Err(InvalidNV(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for Name {
    type Error = InvalidNV;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of one package release, rendered `name-version`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NV {
    pub name: Name,
    pub version: Version,
}

impl NV {
    pub fn new(name: Name, version: Version) -> Self {
        Self { name, version }
    }
}

impl fmt::Display for NV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

impl FromStr for NV {
    type Err = InvalidNV;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = s.split_once('-').ok_or_else(|| InvalidNV(s.to_owned()))?;

        Ok(Self {
            name: name.parse()?,
            version: version
                .parse()
                .map_err(|_| InvalidNV(s.to_owned()))?,
        })
    }
}

impl TryFrom<String> for NV {
    type Error = InvalidNV;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NV> for String {
    fn from(nv: NV) -> Self {
        nv.to_string()
    }
}

/// A string which does not parse as `name-version`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid package identifier {0:?}")]
pub struct InvalidNV(pub String);

#[cfg(test)]
mod test {
    use super::*;
    use crate::HeadState;

    #[test]
    fn parse_nv() {
        let nv: NV = "lwt-2.3.1".parse().unwrap();
        assert_eq!(nv.name.as_str(), "lwt");
        assert_eq!(nv.version, Version::Release("2.3.1".into()));
        assert_eq!(nv.to_string(), "lwt-2.3.1");

        let head: NV = "dose-HEAD".parse().unwrap();
        assert_eq!(head.version, Version::Head(HeadState::UpToDate));
    }

    #[test]
    fn reject_malformed() {
        assert!("".parse::<NV>().is_err());
        assert!("noversion".parse::<NV>().is_err());
        assert!("-1.0".parse::<NV>().is_err());
        assert!("name-".parse::<NV>().is_err());
    }
}
