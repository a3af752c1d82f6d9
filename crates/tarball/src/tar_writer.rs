//! Tar assembler (C3, §4.2).
//!
//! Writes an ordered sequence of entries into a tar archive in memory.
//! Every entry — regardless of where its bytes came from — gets the
//! fixed timestamp, uid, and gid required by §3's reproducibility
//! invariant; only the file mode varies by source.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tar::{Builder, EntryType, Header};

/// 2000-01-01T00:00:00Z, expressed as seconds since the Unix epoch —
/// the fixed mtime/ctime/atime every written entry carries (§3).
pub const FIXED_TIMESTAMP: u64 = 946_684_800;

const DEFAULT_FILE_MODE: u32 = 0o644;
const DIRECTORY_MODE: u32 = 0o755;

/// Where an entry's bytes come from.
pub enum EntrySource {
    /// Literal in-memory content; written with a synthesized 0o644 mode.
    Bytes(Vec<u8>),
    /// Read from a filesystem path; mode, type (regular/symlink/dir)
    /// come from the filesystem, but mtime/uid/gid are still forced.
    Path(PathBuf),
}

/// One entry to place in the archive, at the given archive-relative name.
pub struct TarEntry {
    pub name: String,
    pub source: EntrySource,
}

impl TarEntry {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::Bytes(bytes),
        }
    }

    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::Path(path.into()),
        }
    }

    /// `(name, name)` relative to the current working directory.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: name.clone(),
            source: EntrySource::Path(PathBuf::from(name)),
        }
    }
}

/// Build a tar archive from an ordered list of entries, returning the
/// raw bytes. Directories are only written when empty (§4.2 policy);
/// non-empty directories are silently skipped since their contents are
/// assumed to already be present in `entries`.
pub fn build_tar(entries: &[TarEntry]) -> io::Result<Vec<u8>> {
    let mut builder = Builder::new(Vec::new());

    for entry in entries {
        append_entry(&mut builder, entry)?;
    }

    builder.into_inner()
}

fn append_entry<W: io::Write>(builder: &mut Builder<W>, entry: &TarEntry) -> io::Result<()> {
    match &entry.source {
        EntrySource::Bytes(data) => {
            let mut header = base_header(EntryType::Regular, data.len() as u64, DEFAULT_FILE_MODE);
            header.set_cksum();
            builder.append_data(&mut header, &entry.name, data.as_slice())
        }
        EntrySource::Path(path) => append_from_path(builder, &entry.name, path),
    }
}

fn append_from_path<W: io::Write>(
    builder: &mut Builder<W>,
    name: &str,
    path: &Path,
) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;

    if meta.file_type().is_symlink() {
        let target = fs::read_link(path)?;
        let mut header = base_header(EntryType::Symlink, 0, mode_of(&meta));
        return builder.append_link(&mut header, name, target);
    }

    if meta.is_dir() {
        let mut entries = fs::read_dir(path)?;
        if entries.next().is_some() {
            // Non-empty directory: its files are assumed to be in the
            // caller's entry list already.
            return Ok(());
        }
        let mut header = base_header(EntryType::Directory, 0, DIRECTORY_MODE);
        header.set_cksum();
        return builder.append_data(&mut header, name, io::empty());
    }

    let data = fs::read(path)?;
    let mut header = base_header(EntryType::Regular, data.len() as u64, mode_of(&meta));
    header.set_cksum();
    builder.append_data(&mut header, name, data.as_slice())
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn mode_of(_meta: &fs::Metadata) -> u32 {
    DEFAULT_FILE_MODE
}

fn base_header(entry_type: EntryType, size: u64, mode: u32) -> Header {
    let mut header = Header::new_ustar();
    header.set_entry_type(entry_type);
    header.set_size(size);
    header.set_mode(mode);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(FIXED_TIMESTAMP);
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_entries(tar_bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = tar::Archive::new(tar_bytes);
        let mut out = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().to_string();
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).unwrap();
            out.push((path, buf));
        }
        out
    }

    #[test]
    fn writes_bytes_entries_with_fixed_mtime() {
        let entries = vec![TarEntry::from_bytes("VERSION", b"3".to_vec())];
        let tar_bytes = build_tar(&entries).unwrap();
        let mut archive = tar::Archive::new(tar_bytes.as_slice());
        let mut iter = archive.entries().unwrap();
        let entry = iter.next().unwrap().unwrap();
        assert_eq!(entry.header().mtime().unwrap(), FIXED_TIMESTAMP);
        assert_eq!(entry.header().uid().unwrap(), 0);
        assert_eq!(entry.header().gid().unwrap(), 0);
    }

    #[test]
    fn preserves_entry_order() {
        let entries = vec![
            TarEntry::from_bytes("VERSION", b"3".to_vec()),
            TarEntry::from_bytes("CHECKSUM", b"AB".to_vec()),
        ];
        let tar_bytes = build_tar(&entries).unwrap();
        let names: Vec<_> = read_entries(&tar_bytes).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["VERSION", "CHECKSUM"]);
    }

    #[test]
    fn round_trips_content() {
        let entries = vec![TarEntry::from_bytes("src/foo.erl", b"-module(foo).".to_vec())];
        let tar_bytes = build_tar(&entries).unwrap();
        let files = read_entries(&tar_bytes);
        assert_eq!(files, vec![("src/foo.erl".to_string(), b"-module(foo).".to_vec())]);
    }

    #[test]
    fn is_reproducible_for_equal_input() {
        let entries = || vec![TarEntry::from_bytes("a", b"x".to_vec())];
        assert_eq!(build_tar(&entries()).unwrap(), build_tar(&entries()).unwrap());
    }
}
