//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Directory payloads as deterministic tar archives.
//!
//! The walk is sorted by file name at every level, so the same tree always
//! produces the same archive bytes and therefore the same plaintext digest.
//! Permissions, mtimes, and symlink handling follow the tar defaults.

use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::{IoError, Result};

/// Pack a directory's contents into an in-memory tar archive.
///
/// Entry names are relative to `dir`; the directory itself is not an entry.
pub fn pack_dir(dir: &Path) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            IoError::Archive(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("walk entry lost its underlying error")
            }))
        })?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .expect("walkdir yields paths under its root");

        if entry.file_type().is_dir() {
            builder
                .append_dir(rel, entry.path())
                .map_err(IoError::Archive)?;
        } else {
            builder
                .append_path_with_name(entry.path(), rel)
                .map_err(IoError::Archive)?;
        }
    }

    let bytes = builder.into_inner().map_err(IoError::Archive)?;
    debug!("packed directory {} into {} bytes", dir.display(), bytes.len());
    Ok(bytes)
}

/// Unpack archive bytes produced by [`pack_dir`] into `out_dir`.
pub fn unpack_dir(bytes: &[u8], out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).map_err(|e| IoError::Write {
        path: out_dir.to_path_buf(),
        source: e,
    })?;
    tar::Archive::new(bytes)
        .unpack(out_dir)
        .map_err(IoError::Archive)?;
    Ok(())
}
