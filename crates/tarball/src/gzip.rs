//! Reproducible gzip (C2, §4.1).
//!
//! `flate2`'s `DeflateEncoder` already emits raw DEFLATE with no zlib or
//! gzip wrapper, so encoding is: raw-deflate the payload, then hand-frame
//! it with the fixed 10-byte gzip header and an 8-byte trailer of
//! little-endian CRC-32 and little-endian uncompressed size. This is the
//! only way to guarantee property 2 of §8 (byte-reproducibility) — the
//! `flate2::write::GzEncoder` wrapper embeds an mtime and OS byte we
//! can't suppress.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

/// The fixed gzip header every tarball we produce starts with: magic,
/// deflate method, zero flags, zero mtime, zero extra flags, zero OS.
pub const GZIP_HEADER: [u8; 10] = [0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Gzip a buffer with the reproducible framing described in §4.1.
///
/// Fails only if the deflate primitive itself errors, which in practice
/// only happens on I/O failure against the in-memory sink (never).
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .expect("deflate into an in-memory buffer cannot fail");
    let deflated = encoder
        .finish()
        .expect("deflate into an in-memory buffer cannot fail");

    let crc = crc32fast::hash(data);
    let isize = (data.len() as u32).to_le_bytes();

    let mut out = Vec::with_capacity(GZIP_HEADER.len() + deflated.len() + 8);
    out.extend_from_slice(&GZIP_HEADER);
    out.extend_from_slice(&deflated);
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&isize);
    out
}

/// Decode any conformant gzip stream — our own hand-framed output, or a
/// third party's (e.g. a signed-index HTTP response) — through the
/// general-purpose gzip reader.
pub fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_canonical() {
        let out = gzip(b"hello, reproducible world");
        assert_eq!(&out[..10], &GZIP_HEADER[..]);
    }

    #[test]
    fn round_trips_through_gunzip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(100);
        let compressed = gzip(&data);
        let decompressed = gunzip(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn is_reproducible_across_calls() {
        let data = b"reproducibility matters";
        assert_eq!(gzip(data), gzip(data));
    }

    #[test]
    fn empty_input_still_gunzips_cleanly() {
        let out = gzip(b"");
        assert_eq!(gunzip(&out).unwrap(), Vec::<u8>::new());
    }
}
