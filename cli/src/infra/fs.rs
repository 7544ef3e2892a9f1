//! Filesystem infrastructure — implements `LocalFs` and `FileHasher`.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::application::ports::{FileEntry, FileHasher, LocalFs};
use crate::domain::hex_encode;

/// Production filesystem implementation of `LocalFs` and `FileHasher`.
pub struct OsFs;

impl FileHasher for OsFs {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        sha256_file(path)
    }
}

impl LocalFs for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("removing file {}", path.display()))
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        walk(dir, &mut entries)?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

/// Collect regular files below `dir`. Symlinks are neither followed nor
/// reported.
fn walk(dir: &Path, out: &mut Vec<FileEntry>) -> Result<()> {
    let read = std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    for entry in read {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let path = entry.path();
        let meta = match std::fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if meta.is_dir() {
            walk(&path, out)?;
        } else if meta.is_file() {
            let modified = meta
                .modified()
                .with_context(|| format!("reading mtime of {}", path.display()))?;
            out.push(FileEntry {
                path,
                len: meta.len(),
                modified,
            });
        }
    }
    Ok(())
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large installers into
/// memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}
