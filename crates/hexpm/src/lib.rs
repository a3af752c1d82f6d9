//! Hex-compatible package registry client.
//!
//! Two entry points cover the whole surface:
//!
//! - [`tarball`] — build and unpack the package tarball format, entirely
//!   in memory, no network.
//! - [`registry`] / [`rest`] — talk to a repository over an
//!   [`hexpm_transport::HttpTransport`], using a shared
//!   [`HexClientConfig`].
//!
//! Nothing in this crate holds instance state beyond what a caller
//! passes in explicitly (§5 "no global state").

pub use hexpm_domain::{ConfigError, ConfigSeverity, Error, HexClientConfig, Result, TraceEvent};
pub use hexpm_metadata as metadata;
pub use hexpm_protocol as protocol;
pub use hexpm_registry as registry;
pub use hexpm_rest as rest;
pub use hexpm_tarball as tarball;
pub use hexpm_transport as transport;

pub use hexpm_tarball::{create, create_docs, unpack, CreateOutput, Destination, UnpackOutput};
pub use hexpm_transport::{HttpTransport, Method};
