// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! The remote server contract and its concrete backends.
//!
//! Every package source answers the same five operations: `list`,
//! `get_spec`, `get_archive`, `new_archive` and `update_archive`. The
//! opam scheme speaks HTTP/JSON, the git scheme works against the spec
//! repository cloned at `index/`, and the local backend is the in-process
//! mirror over the client root used by the publisher and the test suite.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use derive_more::{Display, From, Into};
use fs_err as fs;
use sha2::{Digest, Sha256};
use thiserror::Error;

use spec::NV;

use crate::remote::{Remote, Scheme};
use crate::Installation;

pub mod git;
pub mod local;
pub mod opam;

/// Opaque token permitting re-publication of a package
#[derive(Debug, Clone, PartialEq, Eq, Display, From, Into)]
pub struct Key(String);

impl Key {
    /// Mint a fresh key for a first publication
    pub fn generate(nv: &NV) -> Self {
        let clock = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(nv.to_string().as_bytes());
        hasher.update(clock.as_nanos().to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    pub fn load(path: &Path) -> std::io::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(path)?;
        Ok(Some(Self(raw.trim().to_owned())))
    }

    pub fn store(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.0.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tagged dispatch over the configured remote schemes
pub enum Backend {
    Opam(opam::Server),
    Git(git::Server),
    Local(local::Server),
}

impl Backend {
    pub fn new(remote: &Remote, installation: &Installation) -> Self {
        match remote.scheme() {
            Scheme::Opam => Backend::Opam(opam::Server::new(remote)),
            Scheme::Git => Backend::Git(git::Server::new(remote.clone(), installation.clone())),
        }
    }

    /// The in-process mirror over the client root
    pub fn local(installation: &Installation) -> Self {
        Backend::Local(local::Server::new(installation.clone()))
    }

    /// Every release the source offers
    pub async fn list(&self) -> Result<Vec<NV>, Error> {
        match self {
            Backend::Opam(server) => Ok(server.list().await?),
            Backend::Git(server) => Ok(server.list()?),
            Backend::Local(server) => Ok(server.list()?),
        }
    }

    pub async fn get_spec(&self, nv: &NV) -> Result<Vec<u8>, Error> {
        match self {
            Backend::Opam(server) => Ok(server.get_spec(nv).await?),
            Backend::Git(server) => Ok(server.get_spec(nv)?),
            Backend::Local(server) => Ok(server.get_spec(nv)?),
        }
    }

    /// Source tarball for a release, when the source can serve one
    pub async fn get_archive(&self, nv: &NV) -> Result<Option<Bytes>, Error> {
        match self {
            Backend::Opam(server) => Ok(server.get_archive(nv).await?),
            Backend::Git(_) => Ok(None),
            Backend::Local(server) => Ok(server.get_archive(nv)?),
        }
    }

    /// First publication of a release; answers the key for later updates
    pub async fn new_archive(
        &self,
        nv: &NV,
        spec: &[u8],
        archive: Option<&[u8]>,
    ) -> Result<Key, Error> {
        match self {
            Backend::Opam(server) => Ok(server.new_archive(nv, spec, archive).await?),
            Backend::Git(_) => Err(Error::PublishUnsupported),
            Backend::Local(server) => Ok(server.new_archive(nv, spec, archive)?),
        }
    }

    /// Re-publication of a release under an existing key
    pub async fn update_archive(
        &self,
        nv: &NV,
        spec: &[u8],
        archive: Option<&[u8]>,
        key: &Key,
    ) -> Result<(), Error> {
        match self {
            Backend::Opam(server) => Ok(server.update_archive(nv, spec, archive, key).await?),
            Backend::Git(_) => Err(Error::PublishUnsupported),
            Backend::Local(server) => Ok(server.update_archive(nv, spec, archive, key)?),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("git remotes cannot be published to")]
    PublishUnsupported,
    #[error("opam remote")]
    Opam(#[from] opam::Error),
    #[error("git remote")]
    Git(#[from] git::Error),
    #[error("local mirror")]
    Local(#[from] local::Error),
}
