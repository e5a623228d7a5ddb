// SPDX-License-Identifier: MIT

//! Atomic file writes with rotating backups.
//!
//! `spec.md` §4.7 step 4 calls out the source's direct-write hard-failure
//! window and directs the rewrite to close it with temp-file + rename.
//! Backup rotation before each overwrite is grounded on the teacher's
//! `rotate_bak_path` idiom (`daemon/src/storage/snapshot.rs`).

use crate::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path for `path`, rotating older backups
/// out. Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

/// Write `bytes` to `path` atomically: write to a sibling temp file, `fsync`,
/// rename the existing file (if any) to a rotated backup, then rename the
/// temp file into place. The rename is atomic on the same filesystem, so a
/// crash mid-write never leaves `path` truncated or partially written.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| StorageError::Write { path: path.to_path_buf(), source: e })?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("mirrord")
    ));

    let mut tmp = fs::File::create(&tmp_path)
        .map_err(|e| StorageError::Write { path: tmp_path.clone(), source: e })?;
    tmp.write_all(bytes).map_err(|e| StorageError::Write { path: tmp_path.clone(), source: e })?;
    tmp.sync_all().map_err(|e| StorageError::Write { path: tmp_path.clone(), source: e })?;
    drop(tmp);

    if path.exists() {
        let bak_path = rotate_bak_path(path);
        let _ = fs::rename(path, bak_path);
    }

    fs::rename(&tmp_path, path).map_err(|e| StorageError::Write { path: path.to_path_buf(), source: e })?;
    Ok(())
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
