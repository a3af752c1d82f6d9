//! Signed payload reader (C6, §4.5).
//!
//! A signed index document is a protobuf `SignedPayload{payload,
//! signature}` message; the signature is RSA-PKCS#1-v1.5 over SHA-512 of
//! `payload`, checked against the repository's public key.

use hexpm_domain::error::{Error, Result};
use hexpm_protocol::SignedPayload;
use prost::Message;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha512};

/// Decode a `SignedPayload` protobuf message and return its `payload`
/// bytes, verifying the signature against `public_key_pem` unless
/// `verify` is false (development/test bypass, §4.5).
pub fn read_signed(bytes: &[u8], public_key_pem: Option<&str>, verify: bool) -> Result<Vec<u8>> {
    let message = SignedPayload::decode(bytes)
        .map_err(|e| Error::Signature(format!("malformed signed payload: {e}")))?;

    if !verify {
        return Ok(message.payload);
    }

    let pem = public_key_pem
        .ok_or_else(|| Error::Config("verify is enabled but no repo_public_key is configured".into()))?;
    let public_key = RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| Error::Signature(format!("invalid public key: {e}")))?;

    let digest = Sha512::digest(&message.payload);
    let scheme = Pkcs1v15Sign::new::<Sha512>();
    let matched = public_key
        .verify(scheme, &digest, &message.signature)
        .is_ok();

    hexpm_domain::TraceEvent::SignatureVerified { matched }.emit();

    if !matched {
        return Err(Error::Signature("signature verification failed".into()));
    }

    Ok(message.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::RsaPrivateKey;

    fn keypair() -> (RsaPrivateKey, String) {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let pem = public_key
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        (private_key, pem)
    }

    fn sign(private_key: &RsaPrivateKey, payload: &[u8]) -> Vec<u8> {
        let digest = Sha512::digest(payload);
        let scheme = Pkcs1v15Sign::new::<Sha512>();
        private_key.sign(scheme, &digest).unwrap()
    }

    #[test]
    fn verifies_a_correctly_signed_payload() {
        let (private_key, pem) = keypair();
        let payload = b"hello, signed index".to_vec();
        let signature = sign(&private_key, &payload);
        let encoded = SignedPayload {
            payload: payload.clone(),
            signature,
        }
        .encode_to_vec();

        let decoded = read_signed(&encoded, Some(&pem), true).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn rejects_a_flipped_payload_byte() {
        let (private_key, pem) = keypair();
        let mut payload = b"hello, signed index".to_vec();
        let signature = sign(&private_key, &payload);
        payload[0] ^= 0xFF;
        let encoded = SignedPayload { payload, signature }.encode_to_vec();

        let err = read_signed(&encoded, Some(&pem), true).unwrap_err();
        assert!(matches!(err, Error::Signature(_)));
    }

    #[test]
    fn bypasses_verification_when_verify_is_false() {
        let payload = b"unchecked payload".to_vec();
        let encoded = SignedPayload {
            payload: payload.clone(),
            signature: vec![0u8; 256],
        }
        .encode_to_vec();

        let decoded = read_signed(&encoded, None, false).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn verify_without_a_public_key_is_a_config_error() {
        let payload = b"payload".to_vec();
        let encoded = SignedPayload {
            payload,
            signature: vec![0u8; 256],
        }
        .encode_to_vec();

        let err = read_signed(&encoded, None, true).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = read_signed(&[0xFF, 0xFE, 0xFD], None, false).unwrap_err();
        assert!(matches!(err, Error::Signature(_)));
    }
}
