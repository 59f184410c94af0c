// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Execution of an accepted solution.
//!
//! Batches run in solver order, actions within a batch likewise. Each
//! completed action persists the `installed` map before the next one
//! starts, so an abort mid-solution leaves every finished action applied
//! and nothing half done.

use std::path::Path;

use thiserror::Error;
use tui::Stylize;

use solver::{Action, Solution};
use spec::{Spec, ToInstall, NV};

use crate::{index, util};

use super::{fetch, installer, Client};

pub fn apply(client: &Client, solution: &Solution, yes: bool) -> Result<(), Error> {
    crate::runtime::block_on(apply_async(client, solution, yes))
}

pub async fn apply_async(client: &Client, solution: &Solution, yes: bool) -> Result<(), Error> {
    for batch in &solution.0 {
        for action in batch {
            match action {
                Action::Delete(nv) => delete(client, nv, yes)?,
                Action::Change { from, to } => change(client, from.as_ref(), to, yes).await?,
                Action::Recompile(nv) => change(client, Some(nv), nv, yes).await?,
            }
        }
    }

    Ok(())
}

/// Remove `nv` from the tree. A mapping onto any other version means the
/// release was already superseded and the delete quietly stands down.
fn delete(client: &Client, nv: &NV, yes: bool) -> Result<(), Error> {
    let mut installed = client.installed()?;

    if installed.get(&nv.name) != Some(&nv.version) {
        return Ok(());
    }

    let manifest =
        ToInstall::find(client.installation.to_install_path(nv))?.unwrap_or_default();

    installer::remove(&client.installation, &nv.name, &manifest, yes)?;

    installed.remove(&nv.name);
    client.persist_installed(&installed)?;

    println!("{} {nv}", "Removed".red());

    Ok(())
}

/// Build and install `to`, taking down `from` first when it was installed
async fn change(client: &Client, from: Option<&NV>, to: &NV, yes: bool) -> Result<(), Error> {
    if let Some(old) = from {
        delete(client, old, yes)?;
    }

    let body = index::spec(&client.installation, to)?;

    let build_dir = client.installation.build_dir(to);
    util::recreate_dir(&build_dir)?;

    fetch::obtain(client, &body, to, &build_dir).await?;

    build(&body, &build_dir).await?;

    // The build leaves its manifest in the tree; archive it per release
    // before consuming it
    let manifest = ToInstall::read(build_dir.join(format!("{}.install", to.name)))?;
    manifest.write(client.installation.to_install_path(to))?;

    installer::install(&client.installation, &build_dir, &to.name, &manifest, yes)?;

    let mut installed = client.installed()?;
    installed.insert(to.name.clone(), to.version.clone());
    client.persist_installed(&installed)?;

    println!("{} {to}", "Installed".green());

    Ok(())
}

/// Run the spec's build script line by line inside the build tree
async fn build(body: &Spec, build_dir: &Path) -> Result<(), Error> {
    use tokio::process;

    for line in &body.build {
        println!("{} {line}", "Running".yellow());

        let status = process::Command::new("sh")
            .arg("-c")
            .arg(line)
            .current_dir(build_dir)
            .status()
            .await?;

        if !status.success() {
            return Err(Error::BuildFailed(status.code().unwrap_or(-1)));
        }
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("build script failed with exit code {0}")]
    BuildFailed(i32),
    #[error("client")]
    Client(#[from] super::Error),
    #[error("fetch")]
    Fetch(#[from] fetch::Error),
    #[error("installer")]
    Installer(#[from] installer::Error),
    #[error("index")]
    Index(#[from] index::Error),
    #[error("state file")]
    State(#[from] spec::Error),
    #[error("io")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive;
    use crate::client::transaction;
    use solver::Request;
    use spec::Version;

    /// Stage a root with one locally archived package ready to install
    async fn fixture(build_lines: Vec<String>) -> (tempfile::TempDir, Client, NV) {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::init(dir.path().join("root"), Vec::new()).await.unwrap();

        let nv: NV = "lwt-2.3.1".parse().unwrap();

        let body = Spec {
            name: nv.name.clone(),
            version: nv.version.clone(),
            description: "Lightweight threads".into(),
            depends: vec![],
            urls: vec![],
            patches: vec![],
            libraries: vec!["lwt".into()],
            link_options: String::new(),
            build: build_lines,
        };
        spec::io::write(client.installation.spec_path(&nv), &body.to_vec().unwrap()).unwrap();

        // source tree with a pre-baked install manifest
        let tree = dir.path().join("tree");
        fs_err::create_dir_all(&tree).unwrap();
        fs_err::write(tree.join("lwt.cma"), b"bytecode").unwrap();
        ToInstall {
            lib: vec!["lwt.cma".into()],
            bin: vec![],
            misc: vec![],
        }
        .write(tree.join("lwt.install"))
        .unwrap();

        archive::create(&tree, "lwt-2.3.1", &client.installation.archive_path(&nv)).unwrap();

        (dir, client, nv)
    }

    #[tokio::test]
    async fn install_then_remove_restores_tree() {
        let (_dir, client, nv) = fixture(vec![]).await;

        let request = Request {
            wish_install: vec![transaction::install_wish(&client, "lwt").unwrap()],
            ..Default::default()
        };
        let solution = transaction::select(&client, &request, true).unwrap().unwrap();

        apply_async(&client, &solution, true).await.unwrap();

        let installed = client.installed().unwrap();
        assert_eq!(
            installed.get(&nv.name),
            Some(&Version::Release("2.3.1".into()))
        );
        assert!(client.installation.lib_dir(&nv.name).join("lwt.cma").exists());
        assert!(client.installation.to_install_path(&nv).exists());

        // removal returns lib/ and installed to their pre-install state
        let request = Request {
            wish_remove: vec![transaction::remove_wish(&client, "lwt").unwrap()],
            ..Default::default()
        };
        let solution = transaction::select(&client, &request, true).unwrap().unwrap();

        apply_async(&client, &solution, true).await.unwrap();

        assert!(client.installed().unwrap().is_empty());
        assert!(!client.installation.lib_dir(&nv.name).exists());
    }

    #[tokio::test]
    async fn failing_build_leaves_state_alone() {
        let (_dir, client, nv) = fixture(vec!["exit 3".into()]).await;

        let request = Request {
            wish_install: vec![transaction::install_wish(&client, "lwt").unwrap()],
            ..Default::default()
        };
        let solution = transaction::select(&client, &request, true).unwrap().unwrap();

        assert!(matches!(
            apply_async(&client, &solution, true).await,
            Err(Error::BuildFailed(3))
        ));

        assert!(client.installed().unwrap().is_empty());
        assert!(!client.installation.lib_dir(&nv.name).exists());
    }

    #[tokio::test]
    async fn delete_of_superseded_version_is_a_noop() {
        let (_dir, client, nv) = fixture(vec![]).await;

        let mut installed = client.installed().unwrap();
        installed.insert(nv.name.clone(), Version::Release("9.9".into()));
        client.persist_installed(&installed).unwrap();

        delete(&client, &nv, true).unwrap();

        // the newer mapping survives untouched
        assert_eq!(
            client.installed().unwrap().get(&nv.name),
            Some(&Version::Release("9.9".into()))
        );
    }
}
