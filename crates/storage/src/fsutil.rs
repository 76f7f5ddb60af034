// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable file helpers: fsync of parent directories and atomic replace

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Flush a directory entry so renames and creations inside it survive a crash
pub fn sync_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `bytes` so readers see either the old or the new file
///
/// Writes a sibling temp file, fsyncs it, renames over the target and
/// fsyncs the directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = temp_path_for(path);
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    sync_parent_dir(path)
}

/// Atomically replace `path` with a copy of `src`
pub fn copy_atomic(src: &Path, path: &Path) -> io::Result<u64> {
    let temp_path = temp_path_for(path);
    let copied = fs::copy(src, &temp_path)?;
    File::open(&temp_path)?.sync_all()?;
    fs::rename(&temp_path, path)?;
    sync_parent_dir(path)?;
    Ok(copied)
}

/// Size of a file in bytes, zero when it does not exist
pub fn file_size(path: &Path) -> io::Result<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}
