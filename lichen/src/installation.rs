// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use fs_err as fs;
use log::trace;
use nix::fcntl::{flock, FlockArg};
use thiserror::Error;

use spec::{Name, NV};

/// Handle on the client root directory.
///
/// Everything the client persists lives below this root; the layout is
/// re-derived from disk on demand so the handle itself carries no package
/// state.
#[derive(Debug, Clone)]
pub struct Installation {
    pub root: PathBuf,
}

impl Installation {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();

        trace!("Root dir: {root:?}");

        Self { root }
    }

    /// Create the directory skeleton below the root
    pub fn bootstrap(&self) -> std::io::Result<()> {
        for dir in [
            self.index_dir(),
            self.build_root(),
            self.lib_root(),
            self.bin_dir(),
            self.keys_dir(),
            self.to_install_dir(),
            self.archives_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }

        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn installed_path(&self) -> PathBuf {
        self.root.join("installed")
    }

    /// Per-release spec files; also the clone target for git remotes
    pub fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn spec_path(&self, nv: &NV) -> PathBuf {
        self.index_dir().join(format!("{nv}.{}", spec::EXTENSION))
    }

    pub fn build_root(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Transient extraction + build area owned by an in-flight action
    pub fn build_dir(&self, nv: &NV) -> PathBuf {
        self.build_root().join(nv.to_string())
    }

    pub fn lib_root(&self) -> PathBuf {
        self.root.join("lib")
    }

    pub fn lib_dir(&self, name: &Name) -> PathBuf {
        self.lib_root().join(name.as_str())
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.root.join("keys")
    }

    pub fn key_path(&self, name: &Name) -> PathBuf {
        self.keys_dir().join(name.as_str())
    }

    pub fn to_install_dir(&self) -> PathBuf {
        self.root.join("to_install")
    }

    pub fn to_install_path(&self, nv: &NV) -> PathBuf {
        self.to_install_dir().join(nv.to_string())
    }

    /// Local archive mirror & cache
    pub fn archives_dir(&self) -> PathBuf {
        self.root.join("archives")
    }

    pub fn archive_path(&self, nv: &NV) -> PathBuf {
        self.archives_dir().join(format!("{nv}.tar.gz"))
    }

    /// Take the coarse advisory lock guarding mutating commands
    pub fn lock(&self) -> Result<Lock, LockError> {
        fs::create_dir_all(&self.root).map_err(LockError::Io)?;

        let file = std::fs::File::create(self.root.join("lock")).map_err(LockError::Io)?;

        flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock)
            .map_err(|_| LockError::Busy(self.root.clone()))?;

        Ok(Lock(file))
    }
}

/// Held for the duration of a mutating command; the underlying
/// flock releases when this drops
pub struct Lock(#[allow(dead_code)] std::fs::File);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another instance is already operating on {0:?}")]
    Busy(PathBuf),
    #[error("io")]
    Io(#[source] std::io::Error),
}

/// Resolve the root directory from an explicit flag or the environment
pub fn resolve_root(flag: Option<&Path>) -> Result<PathBuf, RootError> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }

    std::env::var_os(crate::environment::ROOT_ENV)
        .map(PathBuf::from)
        .ok_or(RootError)
}

#[derive(Debug, Error)]
#[error("no root directory: pass --directory or set {}", crate::environment::ROOT_ENV)]
pub struct RootError;
