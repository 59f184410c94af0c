// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Publication of a local spec + archive to the configured remotes.
//!
//! Git remotes are never pushed to. The in-process mirror over the client
//! root is always included, which is how a published package becomes
//! visible in the local index. The first publication of a name mints the
//! re-publication key kept under `keys/<name>`; later uploads replay it.

use std::path::{Path, PathBuf};

use fs_err as fs;
use thiserror::Error;
use tui::Stylize;

use spec::Spec;

use crate::archive;
use crate::remote::{Remote, Scheme};
use crate::server::{self, Backend, Key};

use super::{confirm, fetch, Client};

pub async fn upload(client: &Client, input: &str, yes: bool) -> Result<(), Error> {
    let path = spec_file(input);
    let body = Spec::read(&path)?;
    let nv = body.nv();

    let spec_bytes = fs::read(&path)?;
    let archive_bytes = locate_archive(&body).await?;

    // Only opam scheme remotes take publications
    let mut targets: Vec<&Remote> = client
        .remotes
        .iter()
        .filter(|remote| remote.scheme() != Scheme::Git)
        .collect();

    if targets.len() > 1 {
        let mut chosen = Vec::new();
        for remote in targets {
            if confirm(&format!("Upload to {} ?", remote.hostname()), yes)? {
                chosen.push(remote);
            }
        }
        targets = chosen;
    }

    let key_path = client.installation.key_path(&nv.name);
    let mirror = Backend::local(&client.installation);

    match Key::load(&key_path)? {
        // First publication: collect keys, insist they agree, store the
        // first one, then let the mirror pick it up
        None => {
            let mut keys: Vec<Key> = Vec::new();

            for remote in &targets {
                let backend = client.backend(remote);
                keys.push(
                    backend
                        .new_archive(&nv, &spec_bytes, archive_bytes.as_deref())
                        .await?,
                );
            }

            if keys.windows(2).any(|pair| pair[0] != pair[1]) {
                return Err(Error::KeyMismatch(nv.name.to_string()));
            }

            if let Some(first) = keys.first() {
                first.store(&key_path)?;
            }

            mirror
                .new_archive(&nv, &spec_bytes, archive_bytes.as_deref())
                .await?;
        }
        // Re-publication under the existing key, no rotation
        Some(key) => {
            for remote in &targets {
                client
                    .backend(remote)
                    .update_archive(&nv, &spec_bytes, archive_bytes.as_deref(), &key)
                    .await?;
            }

            mirror
                .update_archive(&nv, &spec_bytes, archive_bytes.as_deref(), &key)
                .await?;
        }
    }

    println!("{} {nv}", "Published".green());

    Ok(())
}

fn spec_file(input: &str) -> PathBuf {
    if input.ends_with(&format!(".{}", spec::EXTENSION)) {
        PathBuf::from(input)
    } else {
        PathBuf::from(format!("{input}.{}", spec::EXTENSION))
    }
}

/// Find or synthesize the release tarball.
///
/// A `<name>-<version>.tar.gz` next to the spec wins. Otherwise the spec's
/// own locations decide: with urls and only local patches the tarball is
/// rebuilt from them; with urls and purely external patches the servers are
/// left to source it; without urls there is nothing to publish from.
async fn locate_archive(body: &Spec) -> Result<Option<Vec<u8>>, Error> {
    let archive_name = body.archive_name();
    let local = Path::new(&archive_name);

    if local.exists() {
        return Ok(Some(fs::read(local)?));
    }

    if body.urls.is_empty() {
        return Err(Error::NoLocation(archive_name));
    }

    let local_patches = body.patches.iter().filter(|p| fetch::is_local(p)).count();

    if local_patches != 0 && local_patches != body.patches.len() {
        return Err(Error::MixedPatchesUnsupported);
    }

    if local_patches != body.patches.len() {
        // purely external patches: publish spec-only
        return Ok(None);
    }

    let staging = tempfile::tempdir()?;
    let tree = staging.path().join("tree");

    fetch::populate_from_links(body, &tree).await?;

    let tarball = staging.path().join(&archive_name);
    archive::create(&tree, &body.nv().to_string(), &tarball)?;

    Ok(Some(fs::read(&tarball)?))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no location specified for {0}")]
    NoLocation(String),
    #[error("remotes returned different keys for {0}")]
    KeyMismatch(String),
    #[error("mixing local and external patches is unsupported")]
    MixedPatchesUnsupported,
    #[error("server")]
    Server(#[from] server::Error),
    #[error("fetch")]
    Fetch(#[from] fetch::Error),
    #[error("state file")]
    State(#[from] spec::Error),
    #[error("io")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use spec::Version;

    fn body(urls: Vec<String>, patches: Vec<String>) -> Spec {
        Spec {
            name: "lwt".parse().unwrap(),
            version: Version::Release("2.3.1".into()),
            description: String::new(),
            depends: vec![],
            urls,
            patches,
            libraries: vec![],
            link_options: String::new(),
            build: vec![],
        }
    }

    #[tokio::test]
    async fn missing_archive_without_urls_is_refused() {
        // no remote may be contacted either; locate_archive fails before
        // publication starts
        assert!(matches!(
            locate_archive(&body(vec![], vec![])).await,
            Err(Error::NoLocation(name)) if name == "lwt-2.3.1.tar.gz"
        ));
    }

    #[tokio::test]
    async fn mixed_patches_are_refused() {
        let spec = body(
            vec!["http://host/lwt-2.3.1.tar.gz".into()],
            vec!["local.patch".into(), "http://host/remote.patch".into()],
        );

        assert!(matches!(
            locate_archive(&spec).await,
            Err(Error::MixedPatchesUnsupported)
        ));
    }

    #[tokio::test]
    async fn external_patches_publish_spec_only() {
        let spec = body(
            vec!["http://host/lwt-2.3.1.tar.gz".into()],
            vec!["http://host/remote.patch".into()],
        );

        assert!(locate_archive(&spec).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn publish_key_is_stable_across_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::init(dir.path().join("root"), Vec::new()).await.unwrap();

        // spec + tree to synthesize the tarball from
        let tree = dir.path().join("tree");
        fs_err::create_dir_all(&tree).unwrap();
        fs_err::write(tree.join("Makefile"), b"all:\n").unwrap();
        let tarball = dir.path().join("src.tar.gz");
        archive::create(&tree, "lwt-2.3.1", &tarball).unwrap();

        let spec = body(vec![tarball.display().to_string()], vec![]);
        let spec_path = dir.path().join("lwt.spec");
        fs_err::write(&spec_path, spec.to_vec().unwrap()).unwrap();

        let prior = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let first = upload(&client, "lwt.spec", true).await;
        let key_path = client.installation.key_path(&"lwt".parse().unwrap());
        let minted = fs_err::read(&key_path).unwrap();

        let second = upload(&client, "lwt.spec", true).await;
        let kept = fs_err::read(&key_path).unwrap();
        std::env::set_current_dir(prior).unwrap();

        first.unwrap();
        second.unwrap();
        assert_eq!(minted, kept);

        // the publication landed in the local index + archive mirror
        let nv: spec::NV = "lwt-2.3.1".parse().unwrap();
        assert!(client.installation.spec_path(&nv).exists());
        assert!(client.installation.archive_path(&nv).exists());
    }
}
