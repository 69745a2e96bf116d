//! Cryptographic primitives for the TLS client.
//!
//! Everything here is implemented from scratch; the crate has no external
//! dependencies. Only what TLS 1.3 with the two supported cipher suites
//! needs is present:
//!
//! - [`digest`] — SHA-256 (FIPS 180-4)
//! - [`mac`] — HMAC-SHA256 (RFC 2104)
//! - [`kdf`] — HKDF-SHA256 extract/expand (RFC 5869)
//! - [`aes`] — AES-128 block cipher (FIPS 197)
//! - [`gcm`] — AES-128-GCM AEAD (NIST SP 800-38D)
//! - [`chacha`] — ChaCha20, Poly1305 and the combined AEAD (RFC 8439)
//! - [`x25519`] — Curve25519 Diffie-Hellman (RFC 7748)
//! - [`constant_time`] — branch-free comparison

#![forbid(unsafe_code)]

pub mod aes;
pub mod chacha;
pub mod constant_time;
pub mod digest;
pub mod gcm;
pub mod kdf;
pub mod mac;
pub mod x25519;

pub use chacha::ChaCha20Poly1305;
pub use constant_time::ct_eq;
pub use digest::{Sha256, sha256};
pub use gcm::Aes128Gcm;
pub use kdf::{hkdf_expand, hkdf_extract};
pub use mac::hmac_sha256;
pub use x25519::{x25519, x25519_base};
