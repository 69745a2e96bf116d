//! AES-128-GCM AEAD (NIST SP 800-38D).
//!
//! CTR-mode encryption with a GHASH authentication tag. The sealed form is
//! `ciphertext || tag`, which is exactly how a TLS record carries it.

use crate::aes::Aes128;
use crate::constant_time::ct_eq;

/// Tag length in bytes.
pub const TAG_LEN: usize = 16;

pub struct Aes128Gcm {
    cipher: Aes128,
    /// GHASH subkey `H = E_K(0^128)`.
    h: u128,
}

impl Aes128Gcm {
    pub fn new(key: &[u8; 16]) -> Self {
        let cipher = Aes128::new(key);
        let mut h = [0u8; 16];
        cipher.encrypt_block(&mut h);
        Self {
            cipher,
            h: u128::from_be_bytes(h),
        }
    }

    /// Encrypt and authenticate; returns `ciphertext || tag`.
    ///
    /// The nonce must be unique per message under the same key; TLS
    /// guarantees that through the sequence number.
    pub fn seal(&self, nonce: &[u8; 12], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let j0 = counter_block(nonce, 1);

        let mut out = Vec::with_capacity(plaintext.len() + TAG_LEN);
        out.extend_from_slice(plaintext);
        self.ctr_xor(&j0, 2, &mut out);

        let tag = self.tag(&j0, aad, &out);
        out.extend_from_slice(&tag);
        out
    }

    /// Verify and decrypt `ciphertext || tag`. Returns `None` on any
    /// authentication failure.
    pub fn open(&self, nonce: &[u8; 12], aad: &[u8], sealed: &[u8]) -> Option<Vec<u8>> {
        if sealed.len() < TAG_LEN {
            return None;
        }
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let j0 = counter_block(nonce, 1);
        let expected = self.tag(&j0, aad, ciphertext);
        if !ct_eq(&expected, tag) {
            return None;
        }

        let mut out = ciphertext.to_vec();
        self.ctr_xor(&j0, 2, &mut out);
        Some(out)
    }

    /// XOR the CTR keystream over `data`, starting at block counter `first`.
    fn ctr_xor(&self, j0: &[u8; 16], first: u32, data: &mut [u8]) {
        let mut counter = first;
        for chunk in data.chunks_mut(16) {
            let mut ks = counter_block(&j0[..12].try_into().unwrap(), counter);
            self.cipher.encrypt_block(&mut ks);
            for (b, k) in chunk.iter_mut().zip(ks.iter()) {
                *b ^= k;
            }
            counter = counter.wrapping_add(1);
        }
    }

    /// `tag = E_K(J0) ⊕ GHASH(H; AAD, C)`
    fn tag(&self, j0: &[u8; 16], aad: &[u8], ciphertext: &[u8]) -> [u8; 16] {
        let mut acc = 0u128;
        acc = self.ghash_blocks(acc, aad);
        acc = self.ghash_blocks(acc, ciphertext);

        let lengths = ((aad.len() as u128 * 8) << 64) | (ciphertext.len() as u128 * 8);
        acc = gf_mul(acc ^ lengths, self.h);

        let mut ek_j0 = *j0;
        self.cipher.encrypt_block(&mut ek_j0);
        (acc ^ u128::from_be_bytes(ek_j0)).to_be_bytes()
    }

    /// Fold zero-padded 16-byte blocks of `data` into the GHASH accumulator.
    fn ghash_blocks(&self, mut acc: u128, data: &[u8]) -> u128 {
        for chunk in data.chunks(16) {
            let mut block = [0u8; 16];
            block[..chunk.len()].copy_from_slice(chunk);
            acc = gf_mul(acc ^ u128::from_be_bytes(block), self.h);
        }
        acc
    }
}

/// `nonce || counter` as a 16-byte block (96-bit nonce form).
#[inline]
fn counter_block(nonce: &[u8; 12], counter: u32) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..12].copy_from_slice(nonce);
    block[12..].copy_from_slice(&counter.to_be_bytes());
    block
}

/// Multiplication in GF(2^128) with the GCM polynomial
/// `x^128 + x^7 + x^2 + x + 1` (bit-reflected representation, so the
/// reduction constant is `0xe1 << 120`).
fn gf_mul(x: u128, y: u128) -> u128 {
    const R: u128 = 0xe1 << 120;
    let mut z = 0u128;
    let mut v = x;
    for i in 0..128 {
        if (y >> (127 - i)) & 1 == 1 {
            z ^= v;
        }
        let lsb = v & 1;
        v >>= 1;
        if lsb == 1 {
            v ^= R;
        }
    }
    z
}
