//! HKDF-SHA256 extract/expand (RFC 5869).
//!
//! The TLS 1.3 key schedule is built on exactly these two operations; the
//! TLS-specific `HKDF-Expand-Label` wrapper lives in the `tls` crate.

use crate::digest::OUT_LEN;
use crate::mac::{HmacSha256, hmac_sha256};

/// HKDF-Extract: `PRK = HMAC(salt, ikm)`. An empty salt means a string of
/// `OUT_LEN` zero bytes.
pub fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> [u8; OUT_LEN] {
    if salt.is_empty() {
        hmac_sha256(&[0u8; OUT_LEN], ikm)
    } else {
        hmac_sha256(salt, ikm)
    }
}

/// HKDF-Expand: derive `length` bytes of output keying material.
///
/// `length` must not exceed `255 * 32`; TLS never asks for more than a
/// digest worth.
pub fn hkdf_expand(prk: &[u8], info: &[u8], length: usize) -> Vec<u8> {
    assert!(length <= 255 * OUT_LEN, "HKDF-Expand output too long");

    let mut okm = Vec::with_capacity(length);
    let mut t: Vec<u8> = Vec::new();
    let mut counter: u8 = 1;
    while okm.len() < length {
        let mut mac = HmacSha256::new(prk);
        mac.update(&t);
        mac.update(info);
        mac.update(&[counter]);
        t = mac.finalize().to_vec();
        let take = (length - okm.len()).min(OUT_LEN);
        okm.extend_from_slice(&t[..take]);
        counter = counter.wrapping_add(1);
    }
    okm
}
