// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! In-process mirror over the client root.
//!
//! The publisher always pushes here alongside the configured remotes, which
//! is how locally published packages appear in the index. Since the mirror
//! shares the root, its key store and the client's credential store are the
//! same `keys/` directory.

use bytes::Bytes;
use thiserror::Error;

use spec::NV;

use crate::{index, Installation};

use super::Key;

pub struct Server {
    installation: Installation,
}

impl Server {
    pub fn new(installation: Installation) -> Self {
        Self { installation }
    }

    pub fn list(&self) -> Result<Vec<NV>, Error> {
        Ok(index::entries(&self.installation)?)
    }

    pub fn get_spec(&self, nv: &NV) -> Result<Vec<u8>, Error> {
        Ok(spec::io::read(self.installation.spec_path(nv))?)
    }

    pub fn get_archive(&self, nv: &NV) -> Result<Option<Bytes>, Error> {
        let path = self.installation.archive_path(nv);

        if !path.exists() {
            return Ok(None);
        }

        Ok(Some(Bytes::from(fs_err::read(path)?)))
    }

    pub fn new_archive(
        &self,
        nv: &NV,
        spec_bytes: &[u8],
        archive: Option<&[u8]>,
    ) -> Result<Key, Error> {
        self.put(nv, spec_bytes, archive)?;

        let path = self.installation.key_path(&nv.name);

        // A repeated first publication keeps the existing credential
        if let Some(existing) = Key::load(&path)? {
            return Ok(existing);
        }

        let key = Key::generate(nv);
        key.store(&path)?;

        Ok(key)
    }

    pub fn update_archive(
        &self,
        nv: &NV,
        spec_bytes: &[u8],
        archive: Option<&[u8]>,
        key: &Key,
    ) -> Result<(), Error> {
        let known = Key::load(&self.installation.key_path(&nv.name))?;

        if known.as_ref() != Some(key) {
            return Err(Error::WrongKey(nv.name.to_string()));
        }

        self.put(nv, spec_bytes, archive)
    }

    fn put(&self, nv: &NV, spec_bytes: &[u8], archive: Option<&[u8]>) -> Result<(), Error> {
        spec::io::write(self.installation.spec_path(nv), spec_bytes)?;

        if let Some(bytes) = archive {
            spec::io::write(self.installation.archive_path(nv), bytes)?;
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("wrong key for {0}")]
    WrongKey(String),
    #[error("index")]
    Index(#[from] index::Error),
    #[error("spec")]
    Spec(#[from] spec::Error),
    #[error("io")]
    Io(#[from] std::io::Error),
}
