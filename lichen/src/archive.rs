// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! gzip compressed tarball packing & unpacking

use std::io;
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use fs_err as fs;
use tar::{Archive, Builder};

/// Unpack a `.tar.gz` file below `dest`
pub fn extract(tarball: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;

    let file = fs::File::open(tarball)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.unpack(dest)?;

    Ok(())
}

/// Unpack an in-memory `.tar.gz` payload below `dest`
pub fn extract_bytes(bytes: &[u8], dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;

    let mut archive = Archive::new(GzDecoder::new(bytes));
    archive.set_preserve_permissions(true);
    archive.unpack(dest)?;

    Ok(())
}

/// Pack the contents of `dir` into a `.tar.gz` at `tarball`, every entry
/// prefixed with `top` so the unpacked tree gets a single root directory
pub fn create(dir: &Path, top: &str, tarball: &Path) -> io::Result<()> {
    if let Some(parent) = tarball.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(tarball)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    builder.append_dir_all(top, dir)?;
    builder.into_inner()?.finish()?;

    Ok(())
}

/// Whether a source location names a tarball this module can unpack
pub fn is_tarball(location: &str) -> bool {
    location.ends_with(".tar.gz") || location.ends_with(".tgz")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        let out = dir.path().join("out");
        let tarball = dir.path().join("pkg-1.0.tar.gz");

        fs::create_dir_all(tree.join("src")).unwrap();
        fs::write(tree.join("Makefile"), b"all:\n\ttrue\n").unwrap();
        fs::write(tree.join("src/main.ml"), b"let () = ()\n").unwrap();

        create(&tree, "pkg-1.0", &tarball).unwrap();
        extract(&tarball, &out).unwrap();

        assert_eq!(
            fs::read(out.join("pkg-1.0/Makefile")).unwrap(),
            b"all:\n\ttrue\n"
        );
        assert_eq!(
            fs::read(out.join("pkg-1.0/src/main.ml")).unwrap(),
            b"let () = ()\n"
        );
    }

    #[test]
    fn tarball_names() {
        assert!(is_tarball("lwt-2.3.1.tar.gz"));
        assert!(is_tarball("http://host/x.tgz"));
        assert!(!is_tarball("patch-intro.diff"));
    }
}
