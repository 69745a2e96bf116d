//! Cipher-suite negotiation and AEAD dispatch.
//!
//! Both supported suites hash with SHA-256, so the key schedule is shared;
//! only the AEAD and its key length differ.

use crypto::{Aes128Gcm, ChaCha20Poly1305};

/// The cipher suites this client offers, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CipherSuite {
    Aes128GcmSha256 = 0x1301,
    ChaCha20Poly1305Sha256 = 0x1303,
}

impl CipherSuite {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x1301 => Some(Self::Aes128GcmSha256),
            0x1303 => Some(Self::ChaCha20Poly1305Sha256),
            _ => None,
        }
    }

    /// AEAD key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128GcmSha256 => 16,
            Self::ChaCha20Poly1305Sha256 => 32,
        }
    }

    /// All suites use a 96-bit record nonce.
    pub fn iv_len(self) -> usize {
        12
    }
}

/// A ready-to-use AEAD for one direction of traffic. The sealed form is
/// `ciphertext || 16-byte tag` for both variants.
pub enum Aead {
    Aes(Aes128Gcm),
    ChaCha(ChaCha20Poly1305),
}

impl Aead {
    /// Build the AEAD for `suite` from a derived traffic key.
    pub fn new(suite: CipherSuite, key: &[u8]) -> Self {
        match suite {
            CipherSuite::Aes128GcmSha256 => {
                Aead::Aes(Aes128Gcm::new(key.try_into().expect("AES-128 key length")))
            }
            CipherSuite::ChaCha20Poly1305Sha256 => Aead::ChaCha(ChaCha20Poly1305::new(
                key.try_into().expect("ChaCha20 key length"),
            )),
        }
    }

    pub fn seal(&self, nonce: &[u8; 12], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        match self {
            Aead::Aes(a) => a.seal(nonce, aad, plaintext),
            Aead::ChaCha(c) => c.seal(nonce, aad, plaintext),
        }
    }

    pub fn open(&self, nonce: &[u8; 12], aad: &[u8], sealed: &[u8]) -> Option<Vec<u8>> {
        match self {
            Aead::Aes(a) => a.open(nonce, aad, sealed),
            Aead::ChaCha(c) => c.open(nonce, aad, sealed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_codes() {
        assert_eq!(CipherSuite::from_u16(0x1301), Some(CipherSuite::Aes128GcmSha256));
        assert_eq!(
            CipherSuite::from_u16(0x1303),
            Some(CipherSuite::ChaCha20Poly1305Sha256)
        );
        // AES-256-GCM is not offered.
        assert_eq!(CipherSuite::from_u16(0x1302), None);
    }

    #[test]
    fn key_lengths() {
        assert_eq!(CipherSuite::Aes128GcmSha256.key_len(), 16);
        assert_eq!(CipherSuite::ChaCha20Poly1305Sha256.key_len(), 32);
    }

    #[test]
    fn both_variants_roundtrip() {
        for suite in [CipherSuite::Aes128GcmSha256, CipherSuite::ChaCha20Poly1305Sha256] {
            let key = vec![0x42u8; suite.key_len()];
            let aead = Aead::new(suite, &key);
            let sealed = aead.seal(&[1; 12], b"aad", b"record payload");
            assert_eq!(
                aead.open(&[1; 12], b"aad", &sealed).unwrap(),
                b"record payload"
            );
            assert!(aead.open(&[2; 12], b"aad", &sealed).is_none());
        }
    }
}
