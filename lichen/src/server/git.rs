// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! git scheme backend.
//!
//! The remote is a repository of spec files, tracked as a clone rooted at
//! `index/`. Updates come from comparing the fetched head against the local
//! one; the backend never serves archives, those always come from a spec's
//! declared source locations.

use std::path::{Path, PathBuf};

use thiserror::Error;

use spec::NV;

use crate::remote::Remote;
use crate::{index, Installation};

pub struct Server {
    remote: Remote,
    installation: Installation,
}

impl Server {
    pub fn new(remote: Remote, installation: Installation) -> Self {
        Self {
            remote,
            installation,
        }
    }

    fn clone_dir(&self) -> PathBuf {
        self.installation.index_dir()
    }

    pub fn is_cloned(&self) -> bool {
        self.clone_dir().join(".git").exists()
    }

    /// Clone the spec repository to `index/`
    pub async fn clone_repo(&self) -> Result<(), Error> {
        let target = self.clone_dir();
        let url = self.remote.git_url();

        run(&["clone", "--", &url, &target.display().to_string()], None)
            .await
            .map_err(|_| Error::UnknownGitRepo(url))?;

        Ok(())
    }

    /// Fetch, then report paths that changed between the local and the
    /// fetched head. The answer is what a subsequent [`Self::pull`] applies.
    pub async fn updates(&self) -> Result<Vec<String>, Error> {
        let cwd = self.clone_dir();

        run(&["fetch", "origin"], Some(&cwd)).await?;
        let diff = output(&["diff", "--name-only", "HEAD", "FETCH_HEAD"], Some(&cwd)).await?;

        Ok(diff.lines().map(str::to_owned).collect())
    }

    pub async fn pull(&self) -> Result<(), Error> {
        run(&["pull"], Some(&self.clone_dir())).await
    }

    pub fn list(&self) -> Result<Vec<NV>, Error> {
        Ok(index::entries(&self.installation)?)
    }

    pub fn get_spec(&self, nv: &NV) -> Result<Vec<u8>, Error> {
        Ok(spec::io::read(self.installation.spec_path(nv)).map_err(index::Error::Spec)?)
    }
}

/// Clone an arbitrary git source location into `dest`; spec `urls` entries
/// may name repositories instead of tarballs
pub async fn clone_into(location: &str, dest: &Path) -> Result<(), Error> {
    let url = location.strip_prefix("git+").unwrap_or(location);

    run(&["clone", "--", url, &dest.display().to_string()], None)
        .await
        .map_err(|_| Error::UnknownGitRepo(url.to_owned()))
}

async fn run(args: &[&str], cwd: Option<&Path>) -> Result<(), Error> {
    output(args, cwd).await.map(|_| ())
}

async fn output(args: &[&str], cwd: Option<&Path>) -> Result<String, Error> {
    use tokio::process;

    let mut command = process::Command::new("git");

    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.args(args).output().await?;

    if !output.status.success() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        return Err(Error::GitFailed(args.join(" ")));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown git repository {0}")]
    UnknownGitRepo(String),
    #[error("git {0} failed")]
    GitFailed(String),
    #[error("index")]
    Index(#[from] index::Error),
    #[error("io")]
    Io(#[from] std::io::Error),
}
