// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::io;
use std::os::unix::fs::symlink;
use std::path::Path;

use fs_err as fs;

pub fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn recreate_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Copy `source` into `dest`, directories recursively, symlinks preserved
pub fn copy_recursive(source: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(source)?;

    if meta.is_dir() {
        ensure_dir_exists(dest)?;
        for entry in fs::read_dir(source)?.flatten() {
            let path = entry.path();
            if let Some(file_name) = path.file_name() {
                copy_recursive(&path, &dest.join(file_name))?;
            }
        }
    } else if meta.is_symlink() {
        symlink(fs::read_link(source)?, dest)?;
    } else {
        fs::copy(source, dest)?;
    }

    Ok(())
}

/// Move the contents of `source` into `dest`, unwrapping a lone top-level
/// directory so `foo-1.0/` tarballs land at the destination root
pub fn move_contents(source: &Path, dest: &Path) -> io::Result<()> {
    ensure_dir_exists(dest)?;

    let entries: Vec<_> = fs::read_dir(source)?.flatten().collect();

    let source = match entries.as_slice() {
        [only] if only.metadata().map(|m| m.is_dir()).unwrap_or_default() => only.path(),
        _ => source.to_path_buf(),
    };

    for entry in fs::read_dir(source)?.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().map(ToOwned::to_owned) else {
            continue;
        };

        let target = dest.join(&file_name);
        if fs::rename(&path, &target).is_err() {
            // cross-device fallback
            copy_recursive(&path, &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lone_directory_is_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        let extracted = dir.path().join("extracted");
        let build = dir.path().join("build");

        fs::create_dir_all(extracted.join("pkg-1.0/sub")).unwrap();
        fs::write(extracted.join("pkg-1.0/Makefile"), b"all:\n").unwrap();
        fs::write(extracted.join("pkg-1.0/sub/file"), b"x").unwrap();

        move_contents(&extracted, &build).unwrap();

        assert!(build.join("Makefile").exists());
        assert!(build.join("sub/file").exists());
        assert!(!build.join("pkg-1.0").exists());
    }

    #[test]
    fn flat_contents_move_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let extracted = dir.path().join("extracted");
        let build = dir.path().join("build");

        fs::create_dir_all(&extracted).unwrap();
        fs::write(extracted.join("a"), b"a").unwrap();
        fs::write(extracted.join("b"), b"b").unwrap();

        move_contents(&extracted, &build).unwrap();

        assert!(build.join("a").exists());
        assert!(build.join("b").exists());
    }
}
