//! ChaCha20, Poly1305 and the combined AEAD construction (RFC 8439).
//!
//! The second TLS 1.3 cipher suite. Sealed form is `ciphertext || tag`,
//! matching [`crate::gcm::Aes128Gcm`].

use crate::constant_time::ct_eq;

/// Tag length in bytes.
pub const TAG_LEN: usize = 16;

// ─────────────────────────────────────────────────────────────────────────────
// ChaCha20
// ─────────────────────────────────────────────────────────────────────────────

/// "expand 32-byte k"
const SIGMA: [u32; 4] = [0x61707865, 0x3320646e, 0x79622d32, 0x6b206574];

#[inline]
fn quarter_round(s: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    s[a] = s[a].wrapping_add(s[b]);
    s[d] = (s[d] ^ s[a]).rotate_left(16);
    s[c] = s[c].wrapping_add(s[d]);
    s[b] = (s[b] ^ s[c]).rotate_left(12);
    s[a] = s[a].wrapping_add(s[b]);
    s[d] = (s[d] ^ s[a]).rotate_left(8);
    s[c] = s[c].wrapping_add(s[d]);
    s[b] = (s[b] ^ s[c]).rotate_left(7);
}

/// Produce one 64-byte keystream block for (key, counter, nonce).
fn chacha20_block(key: &[u8; 32], counter: u32, nonce: &[u8; 12], out: &mut [u8; 64]) {
    let mut state = [0u32; 16];
    state[..4].copy_from_slice(&SIGMA);
    for (i, chunk) in key.chunks_exact(4).enumerate() {
        state[4 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    state[12] = counter;
    for (i, chunk) in nonce.chunks_exact(4).enumerate() {
        state[13 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }

    let mut working = state;
    for _ in 0..10 {
        // column rounds
        quarter_round(&mut working, 0, 4, 8, 12);
        quarter_round(&mut working, 1, 5, 9, 13);
        quarter_round(&mut working, 2, 6, 10, 14);
        quarter_round(&mut working, 3, 7, 11, 15);
        // diagonal rounds
        quarter_round(&mut working, 0, 5, 10, 15);
        quarter_round(&mut working, 1, 6, 11, 12);
        quarter_round(&mut working, 2, 7, 8, 13);
        quarter_round(&mut working, 3, 4, 9, 14);
    }

    for i in 0..16 {
        let word = working[i].wrapping_add(state[i]);
        out[4 * i..4 * i + 4].copy_from_slice(&word.to_le_bytes());
    }
}

/// XOR the ChaCha20 keystream over `data`, starting at block `counter`.
pub fn chacha20_xor(key: &[u8; 32], counter: u32, nonce: &[u8; 12], data: &mut [u8]) {
    let mut block = [0u8; 64];
    for (i, chunk) in data.chunks_mut(64).enumerate() {
        chacha20_block(key, counter.wrapping_add(i as u32), nonce, &mut block);
        for (b, k) in chunk.iter_mut().zip(block.iter()) {
            *b ^= k;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Poly1305
// ─────────────────────────────────────────────────────────────────────────────

const MASK26: u64 = (1 << 26) - 1;

/// One-shot Poly1305 over `msg` with a 32-byte one-time key.
///
/// 26-bit limb arithmetic; `r` is clamped per RFC 8439 §2.5.
pub fn poly1305(key: &[u8; 32], msg: &[u8]) -> [u8; 16] {
    let le32 = |b: &[u8], i: usize| -> u64 {
        u32::from_le_bytes(b[i..i + 4].try_into().unwrap()) as u64
    };

    let r0 = le32(key, 0) & 0x3ffffff;
    let r1 = (le32(key, 3) >> 2) & 0x3ffff03;
    let r2 = (le32(key, 6) >> 4) & 0x3ffc0ff;
    let r3 = (le32(key, 9) >> 6) & 0x3f03fff;
    let r4 = (le32(key, 12) >> 8) & 0x00fffff;

    let s1 = r1 * 5;
    let s2 = r2 * 5;
    let s3 = r3 * 5;
    let s4 = r4 * 5;

    let (mut h0, mut h1, mut h2, mut h3, mut h4) = (0u64, 0u64, 0u64, 0u64, 0u64);

    for chunk in msg.chunks(16) {
        // Pad the final short block with 0x01 then zeros; full blocks get
        // the high bit added above bit 128 instead.
        let mut block = [0u8; 17];
        block[..chunk.len()].copy_from_slice(chunk);
        let hibit: u64 = if chunk.len() == 16 {
            1 << 24
        } else {
            block[chunk.len()] = 1;
            0
        };

        h0 += le32(&block, 0) & 0x3ffffff;
        h1 += (le32(&block, 3) >> 2) & 0x3ffffff;
        h2 += (le32(&block, 6) >> 4) & 0x3ffffff;
        h3 += (le32(&block, 9) >> 6) & 0x3ffffff;
        h4 += (le32(&block, 12) >> 8) | hibit;

        let d0 = h0 * r0 + h1 * s4 + h2 * s3 + h3 * s2 + h4 * s1;
        let d1 = h0 * r1 + h1 * r0 + h2 * s4 + h3 * s3 + h4 * s2;
        let d2 = h0 * r2 + h1 * r1 + h2 * r0 + h3 * s4 + h4 * s3;
        let d3 = h0 * r3 + h1 * r2 + h2 * r1 + h3 * r0 + h4 * s4;
        let d4 = h0 * r4 + h1 * r3 + h2 * r2 + h3 * r1 + h4 * r0;

        let mut c = d0 >> 26;
        h0 = d0 & MASK26;
        let d1 = d1 + c;
        c = d1 >> 26;
        h1 = d1 & MASK26;
        let d2 = d2 + c;
        c = d2 >> 26;
        h2 = d2 & MASK26;
        let d3 = d3 + c;
        c = d3 >> 26;
        h3 = d3 & MASK26;
        let d4 = d4 + c;
        c = d4 >> 26;
        h4 = d4 & MASK26;
        h0 += c * 5;
        c = h0 >> 26;
        h0 &= MASK26;
        h1 += c;
    }

    // Full carry, then compute h + 5 and select whichever is < 2^130 - 5.
    let mut c = h1 >> 26;
    h1 &= MASK26;
    h2 += c;
    c = h2 >> 26;
    h2 &= MASK26;
    h3 += c;
    c = h3 >> 26;
    h3 &= MASK26;
    h4 += c;
    c = h4 >> 26;
    h4 &= MASK26;
    h0 += c * 5;
    c = h0 >> 26;
    h0 &= MASK26;
    h1 += c;

    let mut g0 = h0 + 5;
    c = g0 >> 26;
    g0 &= MASK26;
    let mut g1 = h1 + c;
    c = g1 >> 26;
    g1 &= MASK26;
    let mut g2 = h2 + c;
    c = g2 >> 26;
    g2 &= MASK26;
    let mut g3 = h3 + c;
    c = g3 >> 26;
    g3 &= MASK26;
    let g4 = h4.wrapping_add(c).wrapping_sub(1 << 26);

    // mask = all-ones if h >= p (g4 did not underflow)
    let mask = (g4 >> 63).wrapping_sub(1);
    h0 = (h0 & !mask) | (g0 & mask);
    h1 = (h1 & !mask) | (g1 & mask);
    h2 = (h2 & !mask) | (g2 & mask);
    h3 = (h3 & !mask) | (g3 & mask);
    h4 = (h4 & !mask) | (g4 & mask & MASK26);

    // Repack to 128 bits and add the key's `s` half mod 2^128.
    let acc = (h0 as u128)
        | ((h1 as u128) << 26)
        | ((h2 as u128) << 52)
        | ((h3 as u128) << 78)
        | ((h4 as u128) << 104);
    let s = u128::from_le_bytes(key[16..32].try_into().unwrap());
    acc.wrapping_add(s).to_le_bytes()
}

// ─────────────────────────────────────────────────────────────────────────────
// AEAD
// ─────────────────────────────────────────────────────────────────────────────

pub struct ChaCha20Poly1305 {
    key: [u8; 32],
}

impl ChaCha20Poly1305 {
    pub fn new(key: &[u8; 32]) -> Self {
        Self { key: *key }
    }

    /// One-time Poly1305 key: the first half of ChaCha20 block 0.
    fn mac_key(&self, nonce: &[u8; 12]) -> [u8; 32] {
        let mut block = [0u8; 64];
        chacha20_block(&self.key, 0, nonce, &mut block);
        block[..32].try_into().unwrap()
    }

    /// `pad16(aad) || pad16(ct) || len(aad) || len(ct)` (lengths LE).
    fn tag(&self, nonce: &[u8; 12], aad: &[u8], ciphertext: &[u8]) -> [u8; 16] {
        let mut msg = Vec::with_capacity(aad.len() + ciphertext.len() + 32);
        msg.extend_from_slice(aad);
        msg.resize(msg.len().div_ceil(16) * 16, 0);
        msg.extend_from_slice(ciphertext);
        msg.resize(msg.len().div_ceil(16) * 16, 0);
        msg.extend_from_slice(&(aad.len() as u64).to_le_bytes());
        msg.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
        poly1305(&self.mac_key(nonce), &msg)
    }

    /// Encrypt and authenticate; returns `ciphertext || tag`.
    pub fn seal(&self, nonce: &[u8; 12], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(plaintext.len() + TAG_LEN);
        out.extend_from_slice(plaintext);
        chacha20_xor(&self.key, 1, nonce, &mut out);
        let tag = self.tag(nonce, aad, &out);
        out.extend_from_slice(&tag);
        out
    }

    /// Verify and decrypt `ciphertext || tag`. `None` on authentication
    /// failure.
    pub fn open(&self, nonce: &[u8; 12], aad: &[u8], sealed: &[u8]) -> Option<Vec<u8>> {
        if sealed.len() < TAG_LEN {
            return None;
        }
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
        if !ct_eq(&self.tag(nonce, aad, ciphertext), tag) {
            return None;
        }
        let mut out = ciphertext.to_vec();
        chacha20_xor(&self.key, 1, nonce, &mut out);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::hex;

    fn unhex(s: &str) -> Vec<u8> {
        let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // RFC 8439 §2.3.2: ChaCha20 block function.
    #[test]
    fn chacha20_block_vector() {
        let key: [u8; 32] = unhex(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        )
        .try_into()
        .unwrap();
        let nonce: [u8; 12] = unhex("000000090000004a00000000").try_into().unwrap();
        let mut block = [0u8; 64];
        chacha20_block(&key, 1, &nonce, &mut block);
        assert_eq!(
            hex(&block),
            "10f1e7e4d13b5915500fdd1fa32071c4c7d1f4c733c068030422aa9ac3d46c4e\
             d2826446079faa0914c2d705d98b02a2b5129cd1de164eb9cbd083e8a2503c4e"
        );
    }

    // RFC 8439 §2.4.2: ChaCha20 encryption.
    #[test]
    fn chacha20_encrypt_vector() {
        let key: [u8; 32] = unhex(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        )
        .try_into()
        .unwrap();
        let nonce: [u8; 12] = unhex("000000000000004a00000000").try_into().unwrap();
        let mut data = b"Ladies and Gentlemen of the class of '99: If I could offer you \
only one tip for the future, sunscreen would be it."
            .to_vec();
        chacha20_xor(&key, 1, &nonce, &mut data);
        assert_eq!(
            hex(&data),
            "6e2e359a2568f98041ba0728dd0d6981e97e7aec1d4360c20a27afccfd9fae0b\
             f91b65c5524733ab8f593dabcd62b3571639d624e65152ab8f530c359f0861d8\
             07ca0dbf500d6a6156a38e088a22b65e52bc514d16ccf806818ce91ab7793736\
             5af90bbf74a35be6b40b8eedf2785e42874d"
        );
    }

    // RFC 8439 §2.5.2: Poly1305 tag.
    #[test]
    fn poly1305_vector() {
        let key: [u8; 32] = unhex(
            "85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b",
        )
        .try_into()
        .unwrap();
        let tag = poly1305(&key, b"Cryptographic Forum Research Group");
        assert_eq!(hex(&tag), "a8061dc1305136c6c22b8baf0c0127a9");
    }

    // RFC 8439 §2.8.2: full AEAD.
    #[test]
    fn aead_vector() {
        let key: [u8; 32] = unhex(
            "808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f",
        )
        .try_into()
        .unwrap();
        let nonce: [u8; 12] = unhex("070000004041424344454647").try_into().unwrap();
        let aad = unhex("50515253c0c1c2c3c4c5c6c7");
        let plaintext = b"Ladies and Gentlemen of the class of '99: If I could offer you \
only one tip for the future, sunscreen would be it.";

        let aead = ChaCha20Poly1305::new(&key);
        let sealed = aead.seal(&nonce, &aad, plaintext);
        assert_eq!(
            hex(&sealed),
            "d31a8d34648e60db7b86afbc53ef7ec2a4aded51296e08fea9e2b5a736ee62d6\
             3dbea45e8ca9671282fafb69da92728b1a71de0a9e060b2905d6a5b67ecd3b36\
             92ddbd7f2d778b8c9803aee328091b58fab324e4fad675945585808b4831d7bc\
             3ff4def08e4b7a9de576d26586cec64b61161ae10b594f09e26a7e902ecbd0600691"
        );
        assert_eq!(aead.open(&nonce, &aad, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn tampering_rejected() {
        let aead = ChaCha20Poly1305::new(&[0x42; 32]);
        let mut sealed = aead.seal(&[1; 12], b"aad", b"payload");
        sealed[3] ^= 0x80;
        assert!(aead.open(&[1; 12], b"aad", &sealed).is_none());
        assert!(aead.open(&[1; 12], b"aad", &[0u8; 4]).is_none());
    }

    #[test]
    fn roundtrip_odd_lengths() {
        let aead = ChaCha20Poly1305::new(&[7; 32]);
        for len in [0usize, 1, 15, 16, 17, 63, 64, 65, 200] {
            let pt: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let sealed = aead.seal(&[3; 12], &[], &pt);
            assert_eq!(aead.open(&[3; 12], &[], &sealed).unwrap(), pt, "len {len}");
        }
    }
}
