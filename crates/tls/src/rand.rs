//! Entropy for key generation and hello randoms.
//!
//! `/dev/urandom` when the host provides it; otherwise a time-seeded
//! xorshift64* stream. The fallback exists for odd hosts only — this client
//! does not validate certificates either, so it targets the same threat
//! model as the rest of the core.

use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fill `out` with random bytes.
pub fn fill_random(out: &mut [u8]) {
    if let Ok(mut f) = std::fs::File::open("/dev/urandom") {
        if f.read_exact(out).is_ok() {
            return;
        }
    }
    fallback_fill(out);
}

/// 32 random bytes (hello random, session id, X25519 private key).
pub fn random_32() -> [u8; 32] {
    let mut out = [0u8; 32];
    fill_random(&mut out);
    out
}

fn fallback_fill(out: &mut [u8]) {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9e3779b97f4a7c15)
        | 1;
    let mut state = seed;
    for b in out.iter_mut() {
        // xorshift64*
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        *b = (state.wrapping_mul(0x2545F4914F6CDD1D) >> 56) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_requested_length() {
        let mut buf = [0u8; 48];
        fill_random(&mut buf);
        // Overwhelmingly unlikely to be all zeros from either source.
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn successive_keys_differ() {
        assert_ne!(random_32(), random_32());
    }

    #[test]
    fn fallback_is_nonconstant() {
        let mut a = [0u8; 32];
        fallback_fill(&mut a);
        assert!(a.windows(2).any(|w| w[0] != w[1]));
    }
}
