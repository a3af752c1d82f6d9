//! REST client (C8, §4.7).
//!
//! Builds `{api_uri}{path}` URLs, assembles headers (`authorization`,
//! `if-none-match`, `content-type`, then caller-supplied headers merged
//! last), and dispatches through the HTTP transport seam. Response
//! bodies are decoded from the server's term-format payload the same
//! way `metadata.config` is (C4) — an empty or undecodable body simply
//! yields an empty mapping rather than an error, since not every status
//! code carries a body worth decoding.

use std::collections::BTreeMap;

use hexpm_domain::error::Result;
use hexpm_domain::HexClientConfig;
use hexpm_metadata::Metadata;
use hexpm_transport::{HttpTransport, Method};

/// One REST call's outcome: status, response headers, and the decoded
/// term-format body (empty mapping if the body was empty or not a
/// term sequence).
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Metadata,
    pub raw_body: Vec<u8>,
}

/// Per-call transient values layered over the persistent [`HexClientConfig`],
/// mirroring §3's split between static config and per-call parameters.
#[derive(Debug, Clone, Default)]
pub struct CallOptions<'a> {
    pub etag: Option<&'a str>,
    pub api_key: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub extra_headers: BTreeMap<String, String>,
}

pub struct RestClient<'a> {
    config: &'a HexClientConfig,
    transport: &'a dyn HttpTransport,
}

impl<'a> RestClient<'a> {
    pub fn new(config: &'a HexClientConfig, transport: &'a dyn HttpTransport) -> Self {
        Self { config, transport }
    }

    pub fn get(&self, path: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.dispatch(Method::Get, path, None, opts)
    }

    pub fn post(&self, path: &str, body: &[u8], opts: &CallOptions) -> Result<RestResponse> {
        self.dispatch(Method::Post, path, Some(body), opts)
    }

    pub fn delete(&self, path: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.dispatch(Method::Delete, path, None, opts)
    }

    // ── Typed helpers (§4.7) ────────────────────────────────────────

    pub fn get_package(&self, name: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.get(&format!("/packages/{name}"), opts)
    }

    pub fn get_release(&self, name: &str, version: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.get(&format!("/packages/{name}/releases/{version}"), opts)
    }

    pub fn get_user(&self, username: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.get(&format!("/users/{username}"), opts)
    }

    pub fn get_key(&self, name: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.get(&format!("/keys/{name}"), opts)
    }

    pub fn list_keys(&self, opts: &CallOptions) -> Result<RestResponse> {
        self.get("/keys", opts)
    }

    pub fn create_key(&self, body: &[u8], opts: &CallOptions) -> Result<RestResponse> {
        self.post("/keys", body, opts)
    }

    pub fn delete_key(&self, name: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.delete(&format!("/keys/{name}"), opts)
    }

    pub fn list_owners(&self, package: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.get(&format!("/packages/{package}/owners"), opts)
    }

    pub fn add_owner(&self, package: &str, email: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.post(
            &format!("/packages/{package}/owners/{email}"),
            &[],
            opts,
        )
    }

    pub fn remove_owner(&self, package: &str, email: &str, opts: &CallOptions) -> Result<RestResponse> {
        self.delete(&format!("/packages/{package}/owners/{email}"), opts)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
        opts: &CallOptions,
    ) -> Result<RestResponse> {
        let uri = join_url(&self.config.api_uri, path);
        let headers = self.build_headers(method, opts);

        let response = self.transport.request(method, &uri, &headers, body)?;

        let decoded = hexpm_metadata::decode(&response.body).unwrap_or_default();

        Ok(RestResponse {
            status: response.status,
            headers: response.headers,
            body: decoded,
            raw_body: response.body,
        })
    }

    fn build_headers(&self, method: Method, opts: &CallOptions) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();

        let api_key = opts.api_key.or(self.config.api_key.as_deref());
        if let Some(api_key) = api_key {
            headers.insert("authorization".to_string(), api_key.to_string());
        }

        if let Some(etag) = opts.etag {
            headers.insert("if-none-match".to_string(), etag.to_string());
        }

        if let Some(content_type) = opts.content_type {
            headers.insert("content-type".to_string(), content_type.to_string());
        } else if matches!(method, Method::Post) {
            headers.insert(
                "content-type".to_string(),
                "application/vnd.hex+erlang".to_string(),
            );
        }

        for (name, value) in &opts.extra_headers {
            headers.insert(name.to_lowercase(), value.clone());
        }

        headers
    }
}

/// Join `base` and `path` without producing a doubled or missing slash,
/// matching the workspace's own base-URL + endpoint-path assembly.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexpm_transport::{FixtureRoute, FixtureTransport};

    fn config() -> HexClientConfig {
        HexClientConfig {
            api_uri: "https://hex.example/api".to_string(),
            ..HexClientConfig::default()
        }
    }

    #[test]
    fn join_url_avoids_double_slash() {
        assert_eq!(
            join_url("https://hex.example/api/", "/packages/ecto"),
            "https://hex.example/api/packages/ecto"
        );
        assert_eq!(
            join_url("https://hex.example/api", "packages/ecto"),
            "https://hex.example/api/packages/ecto"
        );
    }

    #[test]
    fn authorization_header_set_only_when_key_present() {
        let transport = FixtureTransport::new().route(FixtureRoute::new(
            Method::Get,
            "https://hex.example/api/keys",
            200,
            Vec::new(),
        ));
        let cfg = config();
        let client = RestClient::new(&cfg, &transport);

        let opts = CallOptions::default();
        let headers = client.build_headers(Method::Get, &opts);
        assert!(!headers.contains_key("authorization"));

        let opts_with_key = CallOptions {
            api_key: Some("secret"),
            ..Default::default()
        };
        let headers = client.build_headers(Method::Get, &opts_with_key);
        assert_eq!(headers.get("authorization"), Some(&"secret".to_string()));
    }

    #[test]
    fn extra_headers_merge_last_and_lowercase_names() {
        let cfg = config();
        let transport = FixtureTransport::new();
        let client = RestClient::new(&cfg, &transport);

        let mut extra = BTreeMap::new();
        extra.insert("X-Custom".to_string(), "value".to_string());
        let opts = CallOptions {
            extra_headers: extra,
            ..Default::default()
        };
        let headers = client.build_headers(Method::Get, &opts);
        assert_eq!(headers.get("x-custom"), Some(&"value".to_string()));
    }

    #[test]
    fn get_package_not_found_surfaces_status_and_decoded_body() {
        let body = b"{<<\"message\">>,<<\"Page not found\">>}.\n{<<\"status\">>,404}.\n".to_vec();
        let transport = FixtureTransport::new().route(FixtureRoute::new(
            Method::Get,
            "https://hex.example/api/packages/nonexisting",
            404,
            body,
        ));
        let cfg = config();
        let client = RestClient::new(&cfg, &transport);

        let response = client.get_package("nonexisting", &CallOptions::default()).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(
            hexpm_metadata::value::get(&response.body, "message").and_then(|v| v.as_str()),
            Some("Page not found")
        );
    }
}
