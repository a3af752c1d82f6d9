//! Shared error type for the hexpm client crates.
//!
//! The taxonomy mirrors the tagged-tuple error values of the registry
//! client this library is compatible with: each outer family
//! (`tarball`, `inner_tarball`, `metadata`, `checksum_mismatch`, ...) is
//! one [`Error`] variant, and the inner detail (which file was missing,
//! what the expected vs. actual checksum was) lives in a nested enum so
//! callers can match on either level.

/// Failures from the package tarball engine (outer + inner tar handling).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TarballError {
    #[error("tarball exceeds the size cap")]
    TooBig,

    #[error("tarball archive is empty")]
    Empty,

    #[error("tarball missing required files: {0:?}")]
    MissingFiles(Vec<String>),

    #[error("tarball contains unexpected files: {0:?}")]
    InvalidFiles(Vec<String>),

    #[error("unsupported tarball version: {0}")]
    BadVersion(String),

    #[error("CHECKSUM field is not a valid 32-byte digest")]
    InvalidInnerChecksum,

    #[error("inner checksum mismatch: expected {expected}, got {actual}")]
    InnerChecksumMismatch { expected: String, actual: String },

    #[error("tar reader error: {0}")]
    Other(String),
}

/// Failures while decoding the `metadata.config` term-literal format.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata did not parse into valid terms")]
    InvalidTerms,

    #[error("parsed metadata terms are not a key/value sequence")]
    NotKeyValue,

    #[error("metadata tokenizer error: {0}")]
    Other(String),
}

/// Failures from the HTTP transport seam (C9).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Io(String),

    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,
}

/// The crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("tarball: {0}")]
    Tarball(#[from] TarballError),

    #[error("inner_tarball: {0}")]
    InnerTarball(String),

    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("signature verification failed: {0}")]
    Signature(String),

    #[error("http: {0}")]
    Http(#[from] HttpError),

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
