//! Registry Reader (C7, §4.6).
//!
//! Fetches the three signed-index resources (`names`, `versions`,
//! `package`) plus raw tarball bytes, gunzipping and verifying the
//! signed envelope along the way. A 304 from the server short-circuits
//! straight back to the caller without touching gunzip or the verifier
//! (testable property 11).

use std::collections::BTreeMap;
use std::time::Instant;

use hexpm_domain::error::Result;
use hexpm_domain::HexClientConfig;
use hexpm_protocol::{Names, Package, Versions};
use hexpm_tarball::gzip::gunzip;
use hexpm_transport::{HttpTransport, Method};
use prost::Message;

use crate::signed::read_signed;

/// Outcome of a Registry Reader call: HTTP status, response headers, and
/// an optional decoded value (absent on a 304 cache hit or non-200/304
/// status, per §4.6 steps 3-5).
pub struct RegistryResponse<T> {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub value: Option<T>,
}

pub struct RegistryReader<'a> {
    config: &'a HexClientConfig,
    transport: &'a dyn HttpTransport,
}

impl<'a> RegistryReader<'a> {
    pub fn new(config: &'a HexClientConfig, transport: &'a dyn HttpTransport) -> Self {
        Self { config, transport }
    }

    pub fn get_names(&self, etag: Option<&str>) -> Result<RegistryResponse<Names>> {
        self.fetch_signed("/names", etag, |payload| Names::decode(payload))
    }

    pub fn get_versions(&self, etag: Option<&str>) -> Result<RegistryResponse<Versions>> {
        self.fetch_signed("/versions", etag, |payload| Versions::decode(payload))
    }

    pub fn get_package(&self, name: &str, etag: Option<&str>) -> Result<RegistryResponse<Package>> {
        let path = format!("/packages/{name}");
        self.fetch_signed(&path, etag, |payload| Package::decode(payload))
    }

    /// Fetch the raw tarball bytes for a release. The outer tarball is
    /// not gzipped or signed; it is returned verbatim so the caller can
    /// hash it and compare against the registry-declared checksum.
    pub fn get_tarball(
        &self,
        name: &str,
        version: &str,
        etag: Option<&str>,
    ) -> Result<RegistryResponse<Vec<u8>>> {
        let path = format!("/tarballs/{name}-{version}.tar");
        let headers = self.build_headers(etag);
        let start = Instant::now();
        let uri = format!("{}{path}", self.config.repo_uri);
        let response = self.transport.request(Method::Get, &uri, &headers, None)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        hexpm_domain::TraceEvent::RegistryFetch {
            path: path.clone(),
            status: response.status,
            cache_hit: response.status == 304,
            duration_ms,
        }
        .emit();

        let value = if response.status == 200 {
            Some(response.body)
        } else {
            None
        };

        Ok(RegistryResponse {
            status: response.status,
            headers: response.headers,
            value,
        })
    }

    fn fetch_signed<T>(
        &self,
        path: &str,
        etag: Option<&str>,
        decode: impl FnOnce(&[u8]) -> std::result::Result<T, prost::DecodeError>,
    ) -> Result<RegistryResponse<T>> {
        let headers = self.build_headers(etag);
        let start = Instant::now();
        let uri = format!("{}{path}", self.config.repo_uri);
        let response = self.transport.request(Method::Get, &uri, &headers, None)?;
        let duration_ms = start.elapsed().as_millis() as u64;
        let cache_hit = response.status == 304;

        hexpm_domain::TraceEvent::RegistryFetch {
            path: path.to_string(),
            status: response.status,
            cache_hit,
            duration_ms,
        }
        .emit();

        if response.status != 200 {
            return Ok(RegistryResponse {
                status: response.status,
                headers: response.headers,
                value: None,
            });
        }

        let gunzipped = gunzip(&response.body)?;
        let payload = read_signed(
            &gunzipped,
            self.config.repo_public_key.as_deref(),
            self.config.verify,
        )?;
        let decoded = decode(&payload)
            .map_err(|e| hexpm_domain::error::Error::Signature(format!("malformed resource: {e}")))?;

        Ok(RegistryResponse {
            status: response.status,
            headers: response.headers,
            value: Some(decoded),
        })
    }

    fn build_headers(&self, etag: Option<&str>) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(etag) = etag {
            headers.insert("if-none-match".to_string(), etag.to_string());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexpm_protocol::{PackageName, SignedPayload};
    use hexpm_tarball::gzip::gzip;
    use hexpm_transport::{FixtureRoute, FixtureTransport};

    fn signed_names_body(verify: bool, private_key: Option<&rsa::RsaPrivateKey>) -> Vec<u8> {
        use rsa::Pkcs1v15Sign;
        use sha2::{Digest, Sha512};

        let names = Names {
            packages: vec![PackageName {
                name: "ecto".to_string(),
            }],
        };
        let payload = names.encode_to_vec();
        let signature = if verify {
            let key = private_key.expect("need a key to sign");
            let digest = Sha512::digest(&payload);
            key.sign(Pkcs1v15Sign::new::<Sha512>(), &digest).unwrap()
        } else {
            Vec::new()
        };
        let envelope = SignedPayload { payload, signature }.encode_to_vec();
        gzip(&envelope)
    }

    fn config_without_verify() -> HexClientConfig {
        HexClientConfig {
            repo_uri: "https://repo.example".to_string(),
            verify: false,
            ..HexClientConfig::default()
        }
    }

    #[test]
    fn get_names_decodes_a_signed_index_without_verification() {
        let body = signed_names_body(false, None);
        let transport = FixtureTransport::new().route(FixtureRoute::new(
            Method::Get,
            "https://repo.example/names",
            200,
            body,
        ));
        let config = config_without_verify();
        let reader = RegistryReader::new(&config, &transport);

        let response = reader.get_names(None).unwrap();
        assert_eq!(response.status, 200);
        let names = response.value.unwrap();
        assert_eq!(names.packages[0].name, "ecto");
    }

    #[test]
    fn etag_short_circuits_to_304_without_gunzip_or_verify() {
        let transport = FixtureTransport::new().route(FixtureRoute::new(
            Method::Get,
            "https://repo.example/names",
            304,
            b"not valid gzip, proves we never decoded it".to_vec(),
        ));
        let config = config_without_verify();
        let reader = RegistryReader::new(&config, &transport);

        let response = reader.get_names(Some("\"dummy\"")).unwrap();
        assert_eq!(response.status, 304);
        assert!(response.value.is_none());
    }

    #[test]
    fn get_tarball_returns_raw_bytes_verbatim() {
        let transport = FixtureTransport::new().route(FixtureRoute::new(
            Method::Get,
            "https://repo.example/tarballs/ecto-1.0.0.tar",
            200,
            b"raw tarball bytes".to_vec(),
        ));
        let config = config_without_verify();
        let reader = RegistryReader::new(&config, &transport);

        let response = reader.get_tarball("ecto", "1.0.0", None).unwrap();
        assert_eq!(response.value.unwrap(), b"raw tarball bytes");
    }

    #[test]
    fn non_200_non_304_status_surfaces_with_no_value() {
        let transport = FixtureTransport::new().route(FixtureRoute::new(
            Method::Get,
            "https://repo.example/packages/nonexisting",
            404,
            Vec::new(),
        ));
        let config = config_without_verify();
        let reader = RegistryReader::new(&config, &transport);

        let response = reader.get_package("nonexisting", None).unwrap();
        assert_eq!(response.status, 404);
        assert!(response.value.is_none());
    }
}
