//! Package tarball engine: reproducible gzip, tar assembly, and the
//! `create`/`unpack` pipeline that enforces the package format's byte
//! layout and dual checksums (C1-C3, C5).
//!
//! The pure half of this crate (everything except [`engine::Destination::Disk`])
//! never touches the network or the filesystem, which is what makes
//! property-style round-trip testing of `create`/`unpack` practical.

pub mod codec;
pub mod engine;
pub mod gzip;
mod hardened;
pub mod tar_writer;

pub use codec::Checksum;
pub use engine::{create, create_docs, unpack, CreateOutput, Destination, UnpackOutput};
pub use tar_writer::{EntrySource, TarEntry};
