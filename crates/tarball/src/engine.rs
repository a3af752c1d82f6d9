//! Tarball engine (C5, §4.4): `create`, `create_docs`, `unpack`.
//!
//! This is the pure, in-memory half of the crate — no network, no
//! tracing. `unpack`'s on-disk destination variant is the one place
//! that touches the filesystem, and it delegates that to
//! [`crate::hardened`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hexpm_domain::error::{Error, Result, TarballError};
use hexpm_metadata::{Metadata, Value};

use crate::codec::{self, Checksum};
use crate::gzip;
use crate::hardened;
use crate::tar_writer::{self, TarEntry};

/// Outer tarball size cap (§3 invariants).
pub const MAX_OUTER_BYTES: u64 = 8 * 1024 * 1024;
/// Uncompressed inner payload size cap (§3 invariants).
pub const MAX_INNER_BYTES: u64 = 64 * 1024 * 1024;

const VERSION: &[u8] = b"3";

/// Where `unpack` should materialize the inner payload.
pub enum Destination<'a> {
    /// Keep everything in memory; `UnpackOutput::contents` is populated.
    Memory,
    /// Extract to a directory on disk; `UnpackOutput::contents` is `None`.
    Disk(&'a Path),
}

pub struct CreateOutput {
    pub tarball: Vec<u8>,
    pub inner_checksum: Checksum,
    pub outer_checksum: Checksum,
}

pub struct UnpackOutput {
    pub inner_checksum: Checksum,
    pub outer_checksum: Checksum,
    pub metadata: Metadata,
    pub contents: Option<BTreeMap<String, Vec<u8>>>,
}

/// `create(metadata, files) -> {tarball, inner_checksum, outer_checksum}`
/// (§4.4).
pub fn create(metadata: &Metadata, files: &[TarEntry]) -> Result<CreateOutput> {
    let metadata_bytes = hexpm_metadata::encode(metadata).into_bytes();

    let inner_tar = tar_writer::build_tar(files)?;
    if inner_tar.len() as u64 > MAX_INNER_BYTES {
        return Err(TarballError::TooBig.into());
    }
    let inner_gz = gzip::gzip(&inner_tar);

    let inner_checksum = inner_checksum_of(&metadata_bytes, &inner_gz);

    let outer_entries = vec![
        TarEntry::from_bytes("VERSION", VERSION.to_vec()),
        TarEntry::from_bytes("CHECKSUM", codec::encode_hex_upper(&inner_checksum).into_bytes()),
        TarEntry::from_bytes("metadata.config", metadata_bytes),
        TarEntry::from_bytes("contents.tar.gz", inner_gz),
    ];
    let tarball = tar_writer::build_tar(&outer_entries)?;

    if tarball.len() as u64 > MAX_OUTER_BYTES {
        return Err(TarballError::TooBig.into());
    }

    let outer_checksum = codec::sha256(&tarball);
    Ok(CreateOutput {
        tarball,
        inner_checksum,
        outer_checksum,
    })
}

/// `create_docs(files)`: the same pipeline minus the outer wrapper —
/// just a reproducible gzipped tar, with the same inner size cap.
pub fn create_docs(files: &[TarEntry]) -> Result<Vec<u8>> {
    let tar = tar_writer::build_tar(files)?;
    if tar.len() as u64 > MAX_INNER_BYTES {
        return Err(TarballError::TooBig.into());
    }
    Ok(gzip::gzip(&tar))
}

fn inner_checksum_of(metadata_bytes: &[u8], inner_gz: &[u8]) -> Checksum {
    let mut buf = Vec::with_capacity(VERSION.len() + metadata_bytes.len() + inner_gz.len());
    buf.extend_from_slice(VERSION);
    buf.extend_from_slice(metadata_bytes);
    buf.extend_from_slice(inner_gz);
    codec::sha256(&buf)
}

const REQUIRED_MEMBERS: [&str; 4] = ["VERSION", "CHECKSUM", "metadata.config", "contents.tar.gz"];

/// `unpack(tarball, destination)` (§4.4). Validation short-circuits: the
/// first failing gate is the returned error.
pub fn unpack(tarball: &[u8], destination: Destination<'_>) -> Result<UnpackOutput> {
    if tarball.len() as u64 > MAX_OUTER_BYTES {
        return Err(TarballError::TooBig.into());
    }

    let members = read_outer_members(tarball)?;
    if members.is_empty() {
        return Err(TarballError::Empty.into());
    }

    let outer_checksum = codec::sha256(tarball);

    check_files(&members)?;
    let version_bytes = &members["VERSION"];
    check_version(version_bytes)?;

    let metadata_bytes = &members["metadata.config"];
    let contents_gz = &members["contents.tar.gz"];
    let inner_checksum = check_inner_checksum(&members["CHECKSUM"], version_bytes, metadata_bytes, contents_gz)?;

    let mut metadata = hexpm_metadata::decode(metadata_bytes).map_err(Error::from)?;
    hexpm_metadata::normalize(&mut metadata);

    reject_zip_bomb(contents_gz)?;
    let inner_tar = gzip::gunzip(contents_gz)
        .map_err(|e| Error::InnerTarball(format!("gunzip failed: {e}")))?;
    if inner_tar.len() as u64 > MAX_INNER_BYTES {
        return Err(TarballError::TooBig.into());
    }

    let contents = match destination {
        Destination::Memory => Some(extract_in_memory(&inner_tar)?),
        Destination::Disk(dir) => {
            hardened::extract_hardened(&inner_tar, dir)?;
            write_raw_metadata(dir, metadata_bytes)?;
            touch_now(dir)?;
            None
        }
    };

    Ok(UnpackOutput {
        inner_checksum,
        outer_checksum,
        metadata,
        contents,
    })
}

fn read_outer_members(tarball: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    use std::io::Read;

    let mut archive = tar::Archive::new(tarball);
    let mut members = BTreeMap::new();
    let entries = archive
        .entries()
        .map_err(|e| TarballError::Other(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| TarballError::Other(e.to_string()))?;
        let name = entry
            .path()
            .map_err(|e| TarballError::Other(e.to_string()))?
            .to_string_lossy()
            .to_string();
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| TarballError::Other(e.to_string()))?;
        members.insert(name, buf);
    }
    Ok(members)
}

fn check_files(members: &BTreeMap<String, Vec<u8>>) -> Result<()> {
    let present: std::collections::BTreeSet<&str> = members.keys().map(String::as_str).collect();
    let required: std::collections::BTreeSet<&str> = REQUIRED_MEMBERS.into_iter().collect();

    let extra: Vec<String> = present.difference(&required).map(|s| s.to_string()).collect();
    if !extra.is_empty() {
        return Err(TarballError::InvalidFiles(extra).into());
    }

    let missing: Vec<String> = required.difference(&present).map(|s| s.to_string()).collect();
    if !missing.is_empty() {
        return Err(TarballError::MissingFiles(missing).into());
    }

    Ok(())
}

fn check_version(version_bytes: &[u8]) -> Result<()> {
    let version = String::from_utf8_lossy(version_bytes);
    if version.trim() != "3" {
        return Err(TarballError::BadVersion(version.trim().to_string()).into());
    }
    Ok(())
}

fn check_inner_checksum(
    checksum_field: &[u8],
    version_bytes: &[u8],
    metadata_bytes: &[u8],
    contents_gz: &[u8],
) -> Result<Checksum> {
    let expected = codec::decode_hex(checksum_field).ok_or(TarballError::InvalidInnerChecksum)?;
    let actual = inner_checksum_of_raw(version_bytes, metadata_bytes, contents_gz);
    if actual != expected {
        return Err(TarballError::InnerChecksumMismatch {
            expected: codec::encode_hex_upper(&expected),
            actual: codec::encode_hex_upper(&actual),
        }
        .into());
    }
    Ok(actual)
}

fn inner_checksum_of_raw(version_bytes: &[u8], metadata_bytes: &[u8], contents_gz: &[u8]) -> Checksum {
    let mut buf = Vec::with_capacity(version_bytes.len() + metadata_bytes.len() + contents_gz.len());
    buf.extend_from_slice(version_bytes);
    buf.extend_from_slice(metadata_bytes);
    buf.extend_from_slice(contents_gz);
    codec::sha256(&buf)
}

/// Read the declared uncompressed size from the gzip trailer (last 4
/// bytes, little-endian ISIZE) and reject before decompressing anything
/// that claims to exceed the inner size cap — a zip-bomb defense that
/// doesn't require inflating the payload first.
fn reject_zip_bomb(contents_gz: &[u8]) -> Result<()> {
    if contents_gz.len() < 8 {
        return Ok(()); // truncated stream; gunzip will fail with a clear error
    }
    let tail = &contents_gz[contents_gz.len() - 4..];
    let declared_size = u32::from_le_bytes(tail.try_into().unwrap()) as u64;
    if declared_size > MAX_INNER_BYTES {
        return Err(TarballError::TooBig.into());
    }
    Ok(())
}

fn extract_in_memory(inner_tar: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    use std::io::Read;

    let mut archive = tar::Archive::new(inner_tar);
    let mut out = BTreeMap::new();
    let entries = archive
        .entries()
        .map_err(|e| Error::InnerTarball(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| Error::InnerTarball(e.to_string()))?;
        if entry.header().entry_type() != tar::EntryType::Regular {
            continue;
        }
        let name = entry
            .path()
            .map_err(|e| Error::InnerTarball(e.to_string()))?
            .to_string_lossy()
            .to_string();
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| Error::InnerTarball(e.to_string()))?;
        out.insert(name, buf);
    }
    Ok(out)
}

fn write_raw_metadata(dir: &Path, metadata_bytes: &[u8]) -> Result<()> {
    let path: PathBuf = dir.join("hex_metadata.config");
    std::fs::write(path, metadata_bytes).map_err(Error::from)
}

/// Set the mtime of every extracted path to "now", ignoring failures —
/// a tar entry with a broken symlink target, for instance, shouldn't
/// fail the whole unpack (§4.4 step 8).
fn touch_now(dir: &Path) -> Result<()> {
    let now = std::time::SystemTime::now();
    for entry in walk(dir) {
        if let Ok(file) = std::fs::File::options().write(true).open(&entry) {
            let _ = file.set_modified(now);
        }
    }
    Ok(())
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(read) = std::fs::read_dir(&current) else {
            continue;
        };
        for entry in read.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}
