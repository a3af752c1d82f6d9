//! Binary codec helpers (C1): base16 encode/decode and the canonical
//! checksum digest.

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest (§3 "Checksum").
pub type Checksum = [u8; 32];

/// Digest a byte buffer to a raw 32-byte checksum.
pub fn sha256(bytes: &[u8]) -> Checksum {
    let digest = Sha256::digest(bytes);
    digest.into()
}

/// Render a checksum as 64 uppercase hex characters, the form it takes
/// inside a tarball's `CHECKSUM` member and in user-facing output.
pub fn encode_hex_upper(checksum: &Checksum) -> String {
    hex::encode_upper(checksum)
}

/// Decode 64 ASCII hex characters back into a 32-byte checksum.
///
/// Returns `None` if the input isn't valid hex or doesn't decode to
/// exactly 32 bytes (§7 `invalid_inner_checksum`).
pub fn decode_hex(text: &[u8]) -> Option<Checksum> {
    let bytes = hex::decode(text).ok()?;
    bytes.try_into().ok()
}
