//! REST client (C8): URL and header assembly over the HTTP transport
//! seam, with typed helpers mirroring the registry's own endpoints.

pub mod client;

pub use client::{CallOptions, RestClient, RestResponse};
