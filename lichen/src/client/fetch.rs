// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Source acquisition for a release about to be built.
//!
//! The configured remotes are probed in order for a ready-made tarball;
//! the first payload wins and is kept in the local archive cache. When no
//! remote can serve one, the spec's own `urls` + `patches` descriptor is
//! the fallback: sources are fetched one by one and patches applied on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use log::warn;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tui::{ProgressBar, ProgressStyle, Stylize};
use url::Url;

use spec::{Spec, NV};

use crate::server::git;
use crate::{archive, request, util};

use super::Client;

/// Populate `dest` with the source tree of `nv`
pub async fn obtain(client: &Client, body: &Spec, nv: &NV, dest: &Path) -> Result<(), Error> {
    // First remote returning a payload wins
    for remote in &client.remotes {
        match client.backend(remote).get_archive(nv).await {
            Ok(Some(bytes)) => {
                // keep a copy in the archive cache before unpacking
                spec::io::write(client.installation.archive_path(nv), &bytes)?;

                let staging = tempfile::tempdir()?;
                archive::extract_bytes(&bytes, staging.path())?;
                util::move_contents(staging.path(), dest)?;

                return Ok(());
            }
            Ok(None) => {}
            Err(error) => warn!("archive probe of {remote} failed: {error}"),
        }
    }

    // A previously cached or locally published tarball
    let cached = client.installation.archive_path(nv);
    if cached.exists() {
        let staging = tempfile::tempdir()?;
        archive::extract(&cached, staging.path())?;
        util::move_contents(staging.path(), dest)?;

        return Ok(());
    }

    populate_from_links(body, dest).await
}

/// Realize a spec's `urls` + `patches` descriptor below `dest`: the leading
/// url provides the source tree, further urls land as plain files, patches
/// apply on top in declared order
pub async fn populate_from_links(body: &Spec, dest: &Path) -> Result<(), Error> {
    let mut urls = body.urls.iter();

    let Some(primary) = urls.next() else {
        return Err(Error::NoLocation(body.archive_name()));
    };

    fetch_tree(primary, dest).await?;

    for extra in urls {
        fetch_file(extra, dest).await?;
    }

    for patch in &body.patches {
        let file = fetch_file(patch, dest).await?;
        apply_patch(dest, &file).await?;
    }

    Ok(())
}

/// A location with no transport, or a `file://` one, is local to this host
pub fn is_local(location: &str) -> bool {
    location.starts_with("file://") || !location.contains("://")
}

fn local_path(location: &str) -> PathBuf {
    PathBuf::from(location.strip_prefix("file://").unwrap_or(location))
}

fn is_git(location: &str) -> bool {
    location.starts_with("git://")
        || location.starts_with("git+")
        || location.ends_with(".git")
}

/// Materialize the source tree a location describes
async fn fetch_tree(location: &str, dest: &Path) -> Result<(), Error> {
    if is_git(location) {
        return git::clone_into(location, dest)
            .await
            .map_err(Error::Git);
    }

    let staging = tempfile::tempdir()?;

    let file = if is_local(location) {
        local_path(location)
    } else {
        let target = staging.path().join(file_name_of(location));
        download(location, &target).await?;
        target
    };

    if archive::is_tarball(location) {
        let unpacked = staging.path().join("unpacked");
        archive::extract(&file, &unpacked)?;
        util::move_contents(&unpacked, dest)?;
    } else {
        util::ensure_dir_exists(dest)?;
        util::copy_recursive(&file, &dest.join(file_name_of(location)))?;
    }

    Ok(())
}

/// Fetch a location as a single file below `dest`, answering its path
async fn fetch_file(location: &str, dest: &Path) -> Result<PathBuf, Error> {
    util::ensure_dir_exists(dest)?;

    let target = dest.join(file_name_of(location));

    if is_local(location) {
        util::copy_recursive(&local_path(location), &target)?;
    } else {
        download(location, &target).await?;
    }

    Ok(target)
}

async fn download(location: &str, target: &Path) -> Result<(), Error> {
    let url = Url::parse(location).map_err(|_| Error::BadLocation(location.to_owned()))?;

    let pb = ProgressBar::new(u64::MAX)
        .with_message(format!("{} {location}", "Downloading".blue()))
        .with_style(
            ProgressStyle::with_template(" {spinner} {wide_msg} {binary_bytes_per_sec:>.dim} ")
                .unwrap()
                .tick_chars("--=≡■≡=--"),
        );
    pb.enable_steady_tick(Duration::from_millis(150));

    let partial = target.with_extension("part");
    let mut stream = request::get(url).await?.bytes_stream();
    let mut out = tokio::fs::File::create(&partial).await?;

    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        pb.inc(bytes.len() as u64);
        out.write_all(&bytes).await?;
    }

    out.flush().await?;
    tokio::fs::rename(&partial, target).await?;

    pb.finish_and_clear();

    Ok(())
}

async fn apply_patch(dir: &Path, file: &Path) -> Result<(), Error> {
    use tokio::process;

    let output = process::Command::new("patch")
        .arg("-p1")
        .arg("-i")
        .arg(file)
        .current_dir(dir)
        .output()
        .await?;

    if !output.status.success() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        return Err(Error::PatchFailed(file.display().to_string()));
    }

    Ok(())
}

fn file_name_of(location: &str) -> String {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(location)
        .to_owned()
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no location specified for {0}")]
    NoLocation(String),
    #[error("unusable source location {0:?}")]
    BadLocation(String),
    #[error("patch {0} did not apply")]
    PatchFailed(String),
    #[error("git source")]
    Git(#[source] git::Error),
    #[error("request")]
    Request(#[from] reqwest::Error),
    #[error("state file")]
    State(#[from] spec::Error),
    #[error("io")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn locality() {
        assert!(is_local("patches/intro.patch"));
        assert!(is_local("file:///srv/mirror/lwt-2.3.1.tar.gz"));
        assert!(!is_local("http://ocsigen.org/download/lwt-2.3.1.tar.gz"));
    }

    #[test]
    fn file_names() {
        assert_eq!(
            file_name_of("http://host/download/lwt-2.3.1.tar.gz"),
            "lwt-2.3.1.tar.gz"
        );
        assert_eq!(file_name_of("local.patch"), "local.patch");
    }

    #[tokio::test]
    async fn links_without_urls_are_refused() {
        let body = Spec {
            name: "lwt".parse().unwrap(),
            version: spec::Version::Release("2.3.1".into()),
            description: String::new(),
            depends: vec![],
            urls: vec![],
            patches: vec![],
            libraries: vec![],
            link_options: String::new(),
            build: vec![],
        };

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            populate_from_links(&body, dir.path()).await,
            Err(Error::NoLocation(name)) if name == "lwt-2.3.1.tar.gz"
        ));
    }

    #[tokio::test]
    async fn local_links_populate_a_tree() {
        let dir = tempfile::tempdir().unwrap();

        // a local tarball + an extra plain file
        let tree = dir.path().join("tree");
        fs_err::create_dir_all(&tree).unwrap();
        fs_err::write(tree.join("Makefile"), b"all:\n").unwrap();

        let tarball = dir.path().join("pkg-1.0.tar.gz");
        archive::create(&tree, "pkg-1.0", &tarball).unwrap();

        let extra = dir.path().join("extra.ml");
        fs_err::write(&extra, b"let x = 1\n").unwrap();

        let body = Spec {
            name: "pkg".parse().unwrap(),
            version: spec::Version::Release("1.0".into()),
            description: String::new(),
            depends: vec![],
            urls: vec![
                tarball.display().to_string(),
                extra.display().to_string(),
            ],
            patches: vec![],
            libraries: vec![],
            link_options: String::new(),
            build: vec![],
        };

        let dest = dir.path().join("build");
        populate_from_links(&body, &dest).await.unwrap();

        assert!(dest.join("Makefile").exists());
        assert!(dest.join("extra.ml").exists());
    }
}
