// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! On-disk formats shared between the lichen client and its package sources:
//! the package spec file, the `to_install` manifest, the installed set and
//! the client configuration, plus the name / version / NV algebra they rely on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::install::{Move, ToInstall};
pub use self::nv::{InvalidNV, Name, NV};
pub use self::state::{Config, Installed};
pub use self::version::{HeadState, Version};

pub mod install;
pub mod io;
pub mod nv;
pub mod state;
pub mod version;

/// File extension of a package spec
pub const EXTENSION: &str = "spec";

/// The declarative description of a package: dependencies, source
/// locations, build script and link metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    pub name: Name,
    pub version: Version,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub depends: Vec<Depend>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub patches: Vec<String>,
    #[serde(default)]
    pub libraries: Vec<String>,
    // One option string feeding both the bytecode and native link lines
    #[serde(default)]
    pub link_options: String,
    #[serde(default)]
    pub build: Vec<String>,
}

impl Spec {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_yaml::from_slice(bytes)?)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_slice(&io::read(path)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_yaml::to_string(self)?.into_bytes())
    }

    /// Identity of the release this spec describes
    pub fn nv(&self) -> NV {
        NV {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    /// First line of the description, used by the overview listing
    pub fn synopsis(&self) -> &str {
        self.description.lines().next().unwrap_or_default().trim_end()
    }

    /// Name of the source tarball this release is published under
    pub fn archive_name(&self) -> String {
        format!("{}.tar.gz", self.nv())
    }
}

/// A dependency on another package, optionally version constrained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depend {
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

/// A version constraint, `op` applied against the candidate version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub op: Relop,
    pub version: String,
}

impl Constraint {
    /// Pin to an exact version
    pub fn exactly(version: impl ToString) -> Self {
        Self {
            op: Relop::Eq,
            version: version.to_string(),
        }
    }

    pub fn satisfied_by(&self, candidate: &Version) -> bool {
        use std::cmp::Ordering;

        let Ok(wanted) = self.version.parse::<Version>() else {
            return false;
        };
        match (self.op, candidate.cmp(&wanted)) {
            (Relop::Eq, Ordering::Equal) => true,
            (Relop::Ge, Ordering::Equal | Ordering::Greater) => true,
            (Relop::Gt, Ordering::Greater) => true,
            (Relop::Le, Ordering::Equal | Ordering::Less) => true,
            (Relop::Lt, Ordering::Less) => true,
            _ => false,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Relop {
    #[serde(rename = "=")]
    #[strum(serialize = "=")]
    Eq,
    #[serde(rename = ">=")]
    #[strum(serialize = ">=")]
    Ge,
    #[serde(rename = ">")]
    #[strum(serialize = ">")]
    Gt,
    #[serde(rename = "<=")]
    #[strum(serialize = "<=")]
    Le,
    #[serde(rename = "<")]
    #[strum(serialize = "<")]
    Lt,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing file {0:?}")]
    Missing(PathBuf),
    #[error("io")]
    Io(#[from] std::io::Error),
    #[error("yaml")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spec_round_trip() {
        let spec = Spec {
            name: "lwt".parse().unwrap(),
            version: Version::Release("2.3.1".into()),
            description: "Lightweight threads\nLonger prose.".into(),
            depends: vec![Depend {
                name: "react".parse().unwrap(),
                constraint: Some(Constraint::exactly("0.9.3")),
            }],
            urls: vec!["http://ocsigen.org/download/lwt-2.3.1.tar.gz".into()],
            patches: vec![],
            libraries: vec!["lwt".into()],
            link_options: "-linkall".into(),
            build: vec!["./configure".into(), "make".into()],
        };

        let bytes = spec.to_vec().unwrap();
        let parsed = Spec::from_slice(&bytes).unwrap();

        assert_eq!(parsed, spec);
        assert_eq!(parsed.synopsis(), "Lightweight threads");
        assert_eq!(parsed.archive_name(), "lwt-2.3.1.tar.gz");
    }

    #[test]
    fn constraints() {
        let v = Version::Release("1.2.0".into());

        assert!(Constraint::exactly("1.2.0").satisfied_by(&v));
        assert!(!Constraint::exactly("1.2").satisfied_by(&v));
        assert!(Constraint {
            op: Relop::Ge,
            version: "1.1.9".into()
        }
        .satisfied_by(&v));
        assert!(Constraint {
            op: Relop::Lt,
            version: "1.10".into()
        }
        .satisfied_by(&v));
    }
}
