//! Protobuf message shapes decoded from a signed registry index payload
//! (§3 "Signed Payload", "Registry Resources").
//!
//! These are hand-annotated with `prost`'s derive macro rather than
//! generated from `.proto` files — the schema is small and stable
//! enough that carrying the `.proto` + `prost-build`/`protoc` toolchain
//! dependency isn't worth it; the wire format is identical either way.

use prost::Message;

/// `{payload: bytes, signature: bytes}` — the outer envelope every
/// signed index document is wrapped in (§3, §6 "Wire: signed index").
#[derive(Clone, PartialEq, Message)]
pub struct SignedPayload {
    #[prost(bytes = "vec", tag = "1")]
    pub payload: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

/// The `/names` resource payload.
#[derive(Clone, PartialEq, Message)]
pub struct Names {
    #[prost(message, repeated, tag = "1")]
    pub packages: Vec<PackageName>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PackageName {
    #[prost(string, tag = "1")]
    pub name: String,
}

/// The `/versions` resource payload.
#[derive(Clone, PartialEq, Message)]
pub struct Versions {
    #[prost(message, repeated, tag = "1")]
    pub packages: Vec<PackageVersions>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PackageVersions {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, repeated, tag = "2")]
    pub versions: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub retired: Vec<String>,
}

/// The `/packages/{name}` resource payload.
#[derive(Clone, PartialEq, Message)]
pub struct Package {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub releases: Vec<Release>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Release {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(bytes = "vec", tag = "2")]
    pub checksum: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    pub dependencies: Vec<Dependency>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Dependency {
    #[prost(string, tag = "1")]
    pub package: String,
    #[prost(string, tag = "2")]
    pub requirement: String,
    #[prost(bool, tag = "3")]
    pub optional: bool,
    #[prost(string, optional, tag = "4")]
    pub app: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_payload_round_trips() {
        let msg = SignedPayload {
            payload: b"hello".to_vec(),
            signature: b"sig".to_vec(),
        };
        let encoded = msg.encode_to_vec();
        let decoded = SignedPayload::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn names_payload_round_trips() {
        let msg = Names {
            packages: vec![PackageName {
                name: "ecto".to_string(),
            }],
        };
        let encoded = msg.encode_to_vec();
        let decoded = Names::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded.packages[0].name, "ecto");
    }

    #[test]
    fn package_payload_round_trips_with_optional_app() {
        let msg = Package {
            name: "ecto".to_string(),
            releases: vec![Release {
                version: "1.0.0".to_string(),
                checksum: vec![0xAB; 32],
                dependencies: vec![Dependency {
                    package: "decimal".to_string(),
                    requirement: "~> 1.0".to_string(),
                    optional: false,
                    app: Some("decimal".to_string()),
                }],
            }],
        };
        let encoded = msg.encode_to_vec();
        let decoded = Package::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }
}
