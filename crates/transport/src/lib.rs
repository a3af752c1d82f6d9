//! HTTP interface seam (C9, §4.8).
//!
//! A single `request` operation abstracts over whatever actually moves
//! the bytes. Two realizations ship: [`ReqwestTransport`] for
//! production use, and [`FixtureTransport`] for tests — the Registry
//! Reader and REST client never perform real network I/O in their own
//! test suites.

mod fixture;
mod reqwest_transport;

pub use fixture::{FixtureRoute, FixtureTransport};
pub use reqwest_transport::ReqwestTransport;

use std::collections::BTreeMap;

use hexpm_domain::error::Result;

/// HTTP method a transport call can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// The response half of the seam: status, headers, and raw body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// `request(method, uri, headers, body) -> Result<HttpResponse>` (§4.8).
///
/// Implementations are expected to be `Send + Sync` so a single client
/// handle can be shared across callers — the library itself holds no
/// instance state (§5).
pub trait HttpTransport: Send + Sync {
    fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &BTreeMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse>;
}
