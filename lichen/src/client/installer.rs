// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Manifest driven placement and removal of build artifacts.
//!
//! `lib` entries land below `lib/<name>/`, `bin` entries become single
//! programs in `bin/`, and `misc` entries leave the managed tree entirely,
//! so each one is confirmed with the user in both directions.

use std::path::{Path, PathBuf};

use fs_err as fs;
use thiserror::Error;

use spec::{Name, ToInstall};

use crate::{util, Installation};

use super::confirm;

/// Place the artifacts listed by `manifest` from `build_dir` into the tree
pub fn install(
    installation: &Installation,
    build_dir: &Path,
    name: &Name,
    manifest: &ToInstall,
    yes: bool,
) -> Result<(), Error> {
    let lib_dir = installation.lib_dir(name);

    for descriptor in &manifest.lib {
        util::ensure_dir_exists(&lib_dir)?;

        for source in expand(build_dir, descriptor)? {
            let Some(file_name) = source.file_name() else {
                continue;
            };
            util::copy_recursive(&source, &lib_dir.join(file_name))?;
        }
    }

    for movement in &manifest.bin {
        let sources = expand(build_dir, &movement.src)?;

        // exactly one plain file may feed a program
        let source = match sources.as_slice() {
            [only] if only.is_file() => only,
            _ => return Err(Error::InvalidBinPattern(movement.src.clone())),
        };

        if !is_simple_name(&movement.dst) {
            return Err(Error::InvalidProgramName(movement.dst.clone()));
        }

        util::ensure_dir_exists(&installation.bin_dir())?;
        fs::copy(source, installation.bin_dir().join(&movement.dst))?;
    }

    for movement in &manifest.misc {
        println!("Copy {movement}.");

        if !confirm("Continue ?", yes)? {
            continue;
        }

        let dest = PathBuf::from(&movement.dst);
        util::ensure_dir_exists(&dest)?;

        for source in expand(build_dir, &movement.src)? {
            let Some(file_name) = source.file_name() else {
                continue;
            };
            util::copy_recursive(&source, &dest.join(file_name))?;
        }
    }

    Ok(())
}

/// Inverse of [`install`]: tear the artifacts of `manifest` back out
pub fn remove(
    installation: &Installation,
    name: &Name,
    manifest: &ToInstall,
    yes: bool,
) -> Result<(), Error> {
    let lib_dir = installation.lib_dir(name);
    if lib_dir.exists() {
        fs::remove_dir_all(&lib_dir)?;
    }

    for movement in &manifest.bin {
        let target = installation.bin_dir().join(&movement.dst);
        if target.exists() {
            fs::remove_file(&target)?;
        }
    }

    for movement in &manifest.misc {
        let target = Path::new(&movement.dst);
        if !target.exists() {
            continue;
        }

        let question =
            format!("The complete directory '{}' will be removed. Continue ?", movement.dst);
        if !confirm(&question, yes)? {
            continue;
        }

        if target.is_dir() {
            fs::remove_dir_all(target)?;
        } else {
            fs::remove_file(target)?;
        }
    }

    Ok(())
}

/// Expand a path descriptor relative to `base`
fn expand(base: &Path, descriptor: &str) -> Result<Vec<PathBuf>, Error> {
    let pattern = base.join(descriptor);

    let mut matches = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        matches.push(entry.map_err(|error| Error::Io(error.into_error()))?);
    }

    Ok(matches)
}

fn is_simple_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("program source must name exactly one file: {0}")]
    InvalidBinPattern(String),
    #[error("invalid program name {0:?}")]
    InvalidProgramName(String),
    #[error("pattern")]
    Pattern(#[from] glob::PatternError),
    #[error("io")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use spec::Move;

    fn fixture() -> (tempfile::TempDir, Installation, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let installation = Installation::open(dir.path().join("root"));
        installation.bootstrap().unwrap();

        let build_dir = dir.path().join("build");
        fs::create_dir_all(build_dir.join("_build")).unwrap();
        fs::write(build_dir.join("_build/lwt.cma"), b"bytecode").unwrap();
        fs::write(build_dir.join("_build/lwt.cmxa"), b"native").unwrap();
        fs::write(build_dir.join("_build/top.byte"), b"#!").unwrap();

        (dir, installation, build_dir)
    }

    #[test]
    fn round_trip_restores_tree() {
        let (_dir, installation, build_dir) = fixture();
        let name: Name = "lwt".parse().unwrap();

        let manifest = ToInstall {
            lib: vec!["_build/*.cm*".into()],
            bin: vec![Move {
                src: "_build/top.byte".into(),
                dst: "lwt-top".into(),
            }],
            misc: vec![],
        };

        install(&installation, &build_dir, &name, &manifest, true).unwrap();

        assert!(installation.lib_dir(&name).join("lwt.cma").exists());
        assert!(installation.lib_dir(&name).join("lwt.cmxa").exists());
        assert!(installation.bin_dir().join("lwt-top").exists());

        remove(&installation, &name, &manifest, true).unwrap();

        assert!(!installation.lib_dir(&name).exists());
        assert!(!installation.bin_dir().join("lwt-top").exists());
        // the shared program directory itself stays
        assert!(installation.bin_dir().exists());
    }

    #[test]
    fn ambiguous_bin_pattern_is_rejected() {
        let (_dir, installation, build_dir) = fixture();
        let name: Name = "lwt".parse().unwrap();

        let manifest = ToInstall {
            lib: vec![],
            bin: vec![Move {
                src: "_build/*".into(),
                dst: "lwt-top".into(),
            }],
            misc: vec![],
        };

        assert!(matches!(
            install(&installation, &build_dir, &name, &manifest, true),
            Err(Error::InvalidBinPattern(_))
        ));
    }

    #[test]
    fn program_name_must_be_plain() {
        let (_dir, installation, build_dir) = fixture();
        let name: Name = "lwt".parse().unwrap();

        let manifest = ToInstall {
            lib: vec![],
            bin: vec![Move {
                src: "_build/top.byte".into(),
                dst: "../escape".into(),
            }],
            misc: vec![],
        };

        assert!(matches!(
            install(&installation, &build_dir, &name, &manifest, true),
            Err(Error::InvalidProgramName(_))
        ));
    }
}
