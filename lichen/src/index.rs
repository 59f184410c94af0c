// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Read side of the local package index.
//!
//! The index is the flat set of `<name>-<version>.spec` files under
//! `index/`, populated by remote updates and local publishes. Identity is
//! taken from the file name; the spec body is only parsed when needed.

use std::io;

use fs_err as fs;
use itertools::Itertools;
use thiserror::Error;

use spec::{Installed, Name, Spec, NV};

use crate::Installation;

/// Every release known to the index, sorted by name then version
pub fn entries(installation: &Installation) -> Result<Vec<NV>, Error> {
    let dir = installation.index_dir();

    if !dir.exists() {
        return Ok(Vec::new());
    }

    Ok(fs::read_dir(dir)?
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let stem = path.file_stem()?.to_str()?;

            (path.extension()?.to_str()? == spec::EXTENSION).then_some(())?;
            stem.parse::<NV>().ok()
        })
        .sorted()
        .collect())
}

/// All releases of one package
pub fn versions(installation: &Installation, name: &Name) -> Result<Vec<NV>, Error> {
    Ok(entries(installation)?
        .into_iter()
        .filter(|nv| &nv.name == name)
        .collect())
}

/// Load the spec of a known release
pub fn spec(installation: &Installation, nv: &NV) -> Result<Spec, Error> {
    let path = installation.spec_path(nv);

    Spec::read(&path).map_err(|error| match error {
        spec::Error::Missing(_) => Error::UnknownPackage(nv.name.clone()),
        other => Error::Spec(other),
    })
}

/// The solver universe: every known release tagged with whether it is the
/// installed version of its package.
///
/// A git-tracked package appears in the index as its `HEAD` spec; when the
/// installed entry carries a different head sub-state (behind, unknown) it
/// is surfaced as a package of its own, so the solver sees both the stale
/// installation and the fresh candidate.
pub fn universe(
    installation: &Installation,
    installed: &Installed,
) -> Result<Vec<solver::Package>, Error> {
    let mut packages = Vec::new();

    for nv in entries(installation)? {
        let body = spec(installation, &nv)?;
        let current = installed.get(&nv.name);

        if let Some(version) = current {
            if version != &nv.version && version.is_head() && nv.version.is_head() {
                packages.push(solver::Package {
                    installed: true,
                    nv: NV::new(nv.name.clone(), version.clone()),
                    depends: body.depends.clone(),
                });
            }
        }

        packages.push(solver::Package {
            installed: current == Some(&nv.version),
            nv,
            depends: body.depends,
        });
    }

    Ok(packages)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown package {0}")]
    UnknownPackage(Name),
    #[error("io")]
    Io(#[from] io::Error),
    #[error("spec")]
    Spec(#[from] spec::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scan_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let installation = Installation::open(dir.path());
        installation.bootstrap().unwrap();

        for name in ["lwt-2.3.1.spec", "lwt-2.4.0.spec", "react-0.9.3.spec"] {
            fs::write(installation.index_dir().join(name), b"").unwrap();
        }
        fs::write(installation.index_dir().join("README"), b"").unwrap();
        fs::write(installation.index_dir().join("broken.spec"), b"").unwrap();

        let found = entries(&installation).unwrap();
        let rendered: Vec<String> = found.iter().map(ToString::to_string).collect();

        assert_eq!(rendered, ["lwt-2.3.1", "lwt-2.4.0", "react-0.9.3"]);

        let lwt = versions(&installation, &"lwt".parse().unwrap()).unwrap();
        assert_eq!(lwt.len(), 2);
    }
}
