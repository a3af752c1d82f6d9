//! The production HTTP realization, over a pooled `reqwest::blocking::Client`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use hexpm_domain::error::{Error, HttpError, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{HttpResponse, HttpTransport, Method};

/// Created once and reused — the underlying client maintains its own
/// connection pool, matching the workspace's own REST client pattern of
/// a long-lived client handle.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the given per-request timeout (C13 §10.3).
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Io(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &BTreeMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse> {
        let reqwest_method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::Io(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::Io(format!("invalid header value for {name}: {e}")))?;
            header_map.insert(name, value);
        }

        let mut request = self.client.request(reqwest_method, uri).headers(header_map);
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        let start = Instant::now();
        let response = request.send().map_err(from_reqwest)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let status = response.status().as_u16();
        let mut response_headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.to_string(), value.to_string());
            }
        }
        let body = response.bytes().map_err(from_reqwest)?.to_vec();

        tracing::info!(
            method = method.as_str(),
            uri,
            status,
            duration_ms,
            "hexpm_http_dispatch"
        );

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        HttpError::Timeout.into()
    } else {
        HttpError::Io(e.to_string()).into()
    }
}
