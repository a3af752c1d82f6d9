//! Shared types used by the hexpm client crates: the error taxonomy,
//! client configuration, and structured trace events.

pub mod config;
pub mod error;
pub mod trace;

pub use config::{ConfigError, ConfigSeverity, HexClientConfig};
pub use error::{Error, HttpError, MetadataError, Result, TarballError};
pub use trace::TraceEvent;
