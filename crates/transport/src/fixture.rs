//! The fixture HTTP realization used by tests (§6 "HTTP fixture
//! realization"). Canned responses are keyed on method + URI prefix;
//! `if-none-match: "dummy"` always yields a 304, and routes marked
//! `protected` yield 401 when no `authorization` header is present.
//! Anything with no matching route fails loudly rather than silently
//! returning an empty 200.

use std::collections::BTreeMap;

use hexpm_domain::error::{Error, HttpError, Result};

use crate::{HttpResponse, HttpTransport, Method};

/// One canned response, matched by method + URI prefix.
pub struct FixtureRoute {
    pub method: Method,
    pub uri_prefix: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// If true, requests without an `authorization` header get a 401
    /// instead of the canned response.
    pub protected: bool,
}

impl FixtureRoute {
    pub fn new(method: Method, uri_prefix: impl Into<String>, status: u16, body: Vec<u8>) -> Self {
        Self {
            method,
            uri_prefix: uri_prefix.into(),
            status,
            headers: BTreeMap::new(),
            body,
            protected: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }
}

#[derive(Default)]
pub struct FixtureTransport {
    routes: Vec<FixtureRoute>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, route: FixtureRoute) -> Self {
        self.routes.push(route);
        self
    }
}

impl HttpTransport for FixtureTransport {
    fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &BTreeMap<String, String>,
        _body: Option<&[u8]>,
    ) -> Result<HttpResponse> {
        let route = self
            .routes
            .iter()
            .find(|r| r.method == method && uri.starts_with(r.uri_prefix.as_str()))
            .ok_or_else(|| -> Error {
                HttpError::Io(format!("no fixture registered for {} {uri}", method.as_str())).into()
            })?;

        if route.protected && !has_header(headers, "authorization") {
            return Ok(HttpResponse {
                status: 401,
                headers: route.headers.clone(),
                body: Vec::new(),
            });
        }

        if let Some(etag) = get_header(headers, "if-none-match") {
            if etag.trim_matches('"') == "dummy" {
                return Ok(HttpResponse {
                    status: 304,
                    headers: route.headers.clone(),
                    body: Vec::new(),
                });
            }
        }

        Ok(HttpResponse {
            status: route.status,
            headers: route.headers.clone(),
            body: route.body.clone(),
        })
    }
}

fn get_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
    get_header(headers, name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_fixture() -> FixtureTransport {
        FixtureTransport::new().route(
            FixtureRoute::new(Method::Get, "/names", 200, b"canned-body".to_vec())
                .with_header("etag", "\"dummy\""),
        )
    }

    #[test]
    fn matches_by_method_and_prefix() {
        let transport = names_fixture();
        let resp = transport
            .request(Method::Get, "/names", &BTreeMap::new(), None)
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"canned-body");
    }

    #[test]
    fn unknown_route_fails_loudly() {
        let transport = names_fixture();
        let err = transport
            .request(Method::Get, "/unknown", &BTreeMap::new(), None)
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn dummy_etag_short_circuits_to_304() {
        let transport = names_fixture();
        let mut headers = BTreeMap::new();
        headers.insert("if-none-match".to_string(), "\"dummy\"".to_string());
        let resp = transport
            .request(Method::Get, "/names", &headers, None)
            .unwrap();
        assert_eq!(resp.status, 304);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn protected_route_requires_authorization() {
        let transport = FixtureTransport::new().route(
            FixtureRoute::new(Method::Get, "/packages/nonexisting", 404, Vec::new()).protected(),
        );
        let resp = transport
            .request(Method::Get, "/packages/nonexisting", &BTreeMap::new(), None)
            .unwrap();
        assert_eq!(resp.status, 401);
    }
}
