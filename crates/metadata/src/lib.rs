//! Term-literal metadata encoder/decoder and normalization (C4).
//!
//! `metadata.config` inside a package tarball is a small Erlang term
//! document: one `{key, value}` pair per line. This crate is the only
//! place that understands that grammar — the tarball engine and the
//! REST client both depend on it rather than re-implementing their own
//! reader.

pub mod decode;
pub mod encode;
pub mod normalize;
pub mod value;

pub use decode::decode;
pub use encode::encode;
pub use normalize::normalize;
pub use value::{Metadata, Value};
