// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! The client snapshot and the operations that reshape it.
//!
//! A [`Client`] holds the remote list and the root handle; every other piece
//! of state is re-read from disk when needed. Mutating operations rewrite
//! the `installed` and `config` files atomically so an interrupt preserves
//! either the old or the completed state.

use std::io;
use std::path::{Path, PathBuf};

use log::{trace, warn};
use thiserror::Error;
use tui::Stylize;

use spec::{Config, HeadState, Installed, Name, Version, NV};

use crate::remote::{self, Remote, Scheme};
use crate::server::{git, Backend};
use crate::{index, installation, Installation};

pub mod apply;
pub mod fetch;
pub mod installer;
pub mod publish;
pub mod transaction;

/// A Client is a connection to one lichen root directory
pub struct Client {
    pub installation: Installation,
    pub remotes: Vec<Remote>,
    config: Config,
}

impl Client {
    /// Open an initialized root. Performs no network I/O.
    pub fn open(root: impl Into<PathBuf>) -> Result<Client, Error> {
        let installation = Installation::open(root);

        let config =
            Config::find(installation.config_path())?.ok_or(Error::ConfigMissing)?;

        let remotes = config
            .remotes
            .iter()
            .map(|raw| Remote::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Client {
            installation,
            remotes,
            config,
        })
    }

    /// Create a fresh root with the given remotes, then populate the index
    /// from them
    pub async fn init(root: impl Into<PathBuf>, remotes: Vec<Remote>) -> Result<Client, Error> {
        let installation = Installation::open(root);

        if installation.config_path().exists() {
            return Err(Error::AlreadyInitialized);
        }

        installation.bootstrap()?;

        let config = Config::new(
            remotes.iter().map(ToString::to_string).collect(),
            compiler_version(),
        );
        config.write(installation.config_path())?;
        Installed::default().write(installation.installed_path())?;

        let client = Client {
            installation,
            remotes,
            config,
        };

        client.update().await?;

        Ok(client)
    }

    pub fn installed(&self) -> Result<Installed, Error> {
        Ok(Installed::read(self.installation.installed_path())?)
    }

    pub(crate) fn persist_installed(&self, installed: &Installed) -> Result<(), Error> {
        Ok(installed.write(self.installation.installed_path())?)
    }

    pub fn backend(&self, remote: &Remote) -> Backend {
        Backend::new(remote, &self.installation)
    }

    /// Refresh the index from every remote, in configured order.
    ///
    /// Failure policy is uniform best-effort: a broken remote is reported
    /// and the remaining remotes are still visited. Idempotent when no
    /// remote changed.
    pub async fn update(&self) -> Result<(), Error> {
        for remote in &self.remotes {
            if let Err(error) = self.update_remote(remote).await {
                warn!("update of {remote} failed: {error}");
                eprintln!("{remote}: {error}");
            }
        }

        Ok(())
    }

    async fn update_remote(&self, remote: &Remote) -> Result<(), Error> {
        trace!("updating from {remote}");

        match remote.scheme() {
            Scheme::Opam => self.update_opam(remote).await,
            Scheme::Git => self.update_git(remote).await,
        }
    }

    /// Fetch the remote listing and pull in every spec the index lacks
    async fn update_opam(&self, remote: &Remote) -> Result<(), Error> {
        let backend = self.backend(remote);

        for nv in backend.list().await? {
            let path = self.installation.spec_path(&nv);

            if path.exists() {
                continue;
            }

            let bytes = backend.get_spec(&nv).await?;
            spec::io::write(&path, &bytes)?;

            announce_new(&nv);
        }

        Ok(())
    }

    /// Clone on first contact, afterwards inspect the incoming changes
    /// before pulling them
    async fn update_git(&self, remote: &Remote) -> Result<(), Error> {
        let server = git::Server::new(remote.clone(), self.installation.clone());

        if !server.is_cloned() {
            let known = index::entries(&self.installation)?;

            server.clone_repo().await?;

            for nv in server.list()? {
                if !known.contains(&nv) {
                    announce_new(&nv);
                }
            }

            return Ok(());
        }

        let updates = server.updates().await?;
        server.pull().await?;

        let mut installed = self.installed()?;
        let mut stale = false;

        for path in &updates {
            if let Some(nv) = spec_stem(path) {
                announce_new(&nv);
            }

            // New commits touching a git-tracked package leave the
            // installed copy behind its remote
            if let Some(name) = affected_name(path) {
                if installed.get(&name) == Some(&Version::Head(HeadState::UpToDate)) {
                    installed.insert(name, Version::Head(HeadState::Behind));
                    stale = true;
                }
            }
        }

        if stale {
            self.persist_installed(&installed)?;
        }

        Ok(())
    }

    /// Prepend a remote, rejecting one that matches a configured source
    pub fn add_remote(&mut self, remote: Remote) -> Result<(), Error> {
        if self.remotes.iter().any(|known| known.matches(&remote)) {
            return Err(Error::DuplicateRemote(remote.to_string()));
        }

        self.remotes.insert(0, remote);
        self.persist_remotes()
    }

    /// Drop every remote matching `input` by rendered form or hostname.
    /// Matching nothing is not an error.
    pub fn remove_remote(&mut self, input: &str) -> Result<(), Error> {
        self.remotes.retain(|remote| !remote.matches_str(input));
        self.persist_remotes()
    }

    fn persist_remotes(&mut self) -> Result<(), Error> {
        self.config.remotes = self.remotes.iter().map(ToString::to_string).collect();
        Ok(self.config.write(self.installation.config_path())?)
    }
}

fn announce_new(nv: &NV) {
    println!("{} {nv}", "New package".green());
}

/// `<name>-<version>.spec` paths reported by a remote update
fn spec_stem(path: &str) -> Option<NV> {
    let path = Path::new(path);

    (path.extension()?.to_str()? == spec::EXTENSION).then_some(())?;
    path.file_stem()?.to_str()?.parse().ok()
}

/// The package a changed repository path belongs to: its spec file, or any
/// file below a directory carrying the package name
fn affected_name(path: &str) -> Option<Name> {
    if let Some(nv) = spec_stem(path) {
        return Some(nv.name);
    }

    path.split('/').next()?.parse().ok()
}

/// Toolchain recorded into a fresh config
fn compiler_version() -> String {
    std::process::Command::new("ocamlc")
        .arg("-vnum")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_owned())
        .unwrap_or_else(|| String::from("none"))
}

/// Prompt helper honoring the global `--yes-all` flag
pub fn confirm(question: &str, yes: bool) -> io::Result<bool> {
    if yes {
        return Ok(true);
    }

    tui::ask_yes_no(question)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no configuration found, initialize this root first")]
    ConfigMissing,
    #[error("already initialized")]
    AlreadyInitialized,
    #[error("remote {0} is already configured")]
    DuplicateRemote(String),
    #[error("remote")]
    Remote(#[from] remote::Error),
    #[error("server")]
    Server(#[from] crate::server::Error),
    #[error("git remote")]
    Git(#[from] git::Error),
    #[error("index")]
    Index(#[from] index::Error),
    #[error("state file")]
    State(#[from] spec::Error),
    #[error("lock")]
    Lock(#[from] installation::LockError),
    #[error("io")]
    Io(#[from] io::Error),
}
