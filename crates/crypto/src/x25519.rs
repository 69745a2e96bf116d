//! X25519 Diffie-Hellman (RFC 7748).
//!
//! Montgomery ladder over Curve25519 with field arithmetic on five 51-bit
//! limbs modulo `2^255 - 19`. Only the two operations TLS needs are exposed:
//! scalar multiplication of an arbitrary point and of the base point.

const MASK51: u64 = (1 << 51) - 1;

/// Field element: five 51-bit limbs, little-endian limb order.
#[derive(Clone, Copy)]
struct Fe([u64; 5]);

impl Fe {
    const ZERO: Fe = Fe([0; 5]);
    const ONE: Fe = Fe([1, 0, 0, 0, 0]);

    fn from_bytes(b: &[u8; 32]) -> Fe {
        let lo = |i: usize| u64::from_le_bytes(b[i..i + 8].try_into().unwrap());
        // Overlapping 64-bit loads, shifted into 51-bit windows. The top
        // bit of the u-coordinate is masked off per RFC 7748 §5.
        Fe([
            lo(0) & MASK51,
            (lo(6) >> 3) & MASK51,
            (lo(12) >> 6) & MASK51,
            (lo(19) >> 1) & MASK51,
            (lo(24) >> 12) & MASK51,
        ])
    }

    /// Fully reduce and serialize.
    fn to_bytes(mut self) -> [u8; 32] {
        self = self.carry();
        // Freeze: subtract p up to twice.
        for _ in 0..2 {
            let mut t = self.0;
            let mut borrow;
            let p = [MASK51 - 18, MASK51, MASK51, MASK51, MASK51];
            let mut out = [0u64; 5];
            borrow = 0u64;
            for i in 0..5 {
                let (d, b1) = t[i].overflowing_sub(p[i]);
                let (d, b2) = d.overflowing_sub(borrow);
                out[i] = d;
                borrow = (b1 || b2) as u64;
            }
            // Keep the subtraction only if it did not underflow.
            if borrow == 0 {
                t = out;
                // limbs may hold borrow-wrapped values; re-mask
                for limb in t.iter_mut() {
                    *limb &= MASK51;
                }
            }
            self = Fe(t);
        }

        let mut out = [0u8; 32];
        let t = self.0;
        let packed = [
            t[0] | (t[1] << 51),
            (t[1] >> 13) | (t[2] << 38),
            (t[2] >> 26) | (t[3] << 25),
            (t[3] >> 39) | (t[4] << 12),
        ];
        for (i, word) in packed.iter().enumerate() {
            out[8 * i..8 * i + 8].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    fn carry(self) -> Fe {
        let mut t = self.0;
        for _ in 0..2 {
            let mut c = 0u64;
            for limb in t.iter_mut() {
                let v = *limb + c;
                *limb = v & MASK51;
                c = v >> 51;
            }
            t[0] += c * 19;
        }
        Fe(t)
    }

    fn add(self, rhs: Fe) -> Fe {
        let a = self.0;
        let b = rhs.0;
        Fe([
            a[0] + b[0],
            a[1] + b[1],
            a[2] + b[2],
            a[3] + b[3],
            a[4] + b[4],
        ])
        .carry()
    }

    /// `self - rhs`, offset by 2p so limbs never go negative.
    fn sub(self, rhs: Fe) -> Fe {
        const TWO_P: [u64; 5] = [
            0xffff_ffff_fffd_a, // (2^51 - 19) * 2
            0xffff_ffff_ffff_e,
            0xffff_ffff_ffff_e,
            0xffff_ffff_ffff_e,
            0xffff_ffff_ffff_e,
        ];
        let a = self.0;
        let b = rhs.0;
        Fe([
            a[0] + TWO_P[0] - b[0],
            a[1] + TWO_P[1] - b[1],
            a[2] + TWO_P[2] - b[2],
            a[3] + TWO_P[3] - b[3],
            a[4] + TWO_P[4] - b[4],
        ])
        .carry()
    }

    fn mul(self, rhs: Fe) -> Fe {
        let a = self.0.map(|x| x as u128);
        let b = rhs.0.map(|x| x as u128);

        // Schoolbook with the 2^255 ≡ 19 wraparound folded in.
        let t0 = a[0] * b[0] + 19 * (a[1] * b[4] + a[2] * b[3] + a[3] * b[2] + a[4] * b[1]);
        let t1 = a[0] * b[1] + a[1] * b[0] + 19 * (a[2] * b[4] + a[3] * b[3] + a[4] * b[2]);
        let t2 = a[0] * b[2] + a[1] * b[1] + a[2] * b[0] + 19 * (a[3] * b[4] + a[4] * b[3]);
        let t3 = a[0] * b[3] + a[1] * b[2] + a[2] * b[1] + a[3] * b[0] + 19 * (a[4] * b[4]);
        let t4 = a[0] * b[4] + a[1] * b[3] + a[2] * b[2] + a[3] * b[1] + a[4] * b[0];

        // Carry in u128: the wraparound term c*19 can exceed 64 bits.
        let mut t = [t0, t1, t2, t3, t4];
        let mut c: u128 = 0;
        for limb in t.iter_mut() {
            *limb += c;
            c = *limb >> 51;
            *limb &= MASK51 as u128;
        }
        t[0] += c * 19;
        let c2 = t[0] >> 51;
        t[0] &= MASK51 as u128;
        t[1] += c2;
        Fe([t[0] as u64, t[1] as u64, t[2] as u64, t[3] as u64, t[4] as u64])
    }

    fn square(self) -> Fe {
        self.mul(self)
    }

    /// Raise to `2^k` by repeated squaring.
    fn pow2k(self, k: u32) -> Fe {
        let mut x = self;
        for _ in 0..k {
            x = x.square();
        }
        x
    }

    /// Inversion via Fermat: `self^(p-2)`, classic curve25519 chain.
    fn invert(self) -> Fe {
        let z = self;
        let z2 = z.square();
        let z9 = z2.pow2k(2).mul(z);
        let z11 = z9.mul(z2);
        let z2_5_0 = z11.square().mul(z9);
        let z2_10_0 = z2_5_0.pow2k(5).mul(z2_5_0);
        let z2_20_0 = z2_10_0.pow2k(10).mul(z2_10_0);
        let z2_40_0 = z2_20_0.pow2k(20).mul(z2_20_0);
        let z2_50_0 = z2_40_0.pow2k(10).mul(z2_10_0);
        let z2_100_0 = z2_50_0.pow2k(50).mul(z2_50_0);
        let z2_200_0 = z2_100_0.pow2k(100).mul(z2_100_0);
        let z2_250_0 = z2_200_0.pow2k(50).mul(z2_50_0);
        z2_250_0.pow2k(5).mul(z11)
    }

    /// Constant-time conditional swap of two elements.
    fn cswap(swap: u64, a: &mut Fe, b: &mut Fe) {
        let mask = 0u64.wrapping_sub(swap);
        for i in 0..5 {
            let d = mask & (a.0[i] ^ b.0[i]);
            a.0[i] ^= d;
            b.0[i] ^= d;
        }
    }
}

/// `a24 = (486662 - 2) / 4`
const A24: Fe = Fe([121665, 0, 0, 0, 0]);

/// Clamp a scalar per RFC 7748 §5.
fn clamp(scalar: &[u8; 32]) -> [u8; 32] {
    let mut k = *scalar;
    k[0] &= 248;
    k[31] &= 127;
    k[31] |= 64;
    k
}

/// X25519 scalar multiplication: `scalar * point` where `point` is a
/// u-coordinate.
pub fn x25519(scalar: &[u8; 32], point: &[u8; 32]) -> [u8; 32] {
    let k = clamp(scalar);
    let mut u = *point;
    u[31] &= 127;
    let x1 = Fe::from_bytes(&u);

    let mut x2 = Fe::ONE;
    let mut z2 = Fe::ZERO;
    let mut x3 = x1;
    let mut z3 = Fe::ONE;
    let mut swap: u64 = 0;

    for t in (0..255).rev() {
        let k_t = ((k[t / 8] >> (t % 8)) & 1) as u64;
        swap ^= k_t;
        Fe::cswap(swap, &mut x2, &mut x3);
        Fe::cswap(swap, &mut z2, &mut z3);
        swap = k_t;

        // One ladder step (RFC 7748 §5 pseudocode).
        let a = x2.add(z2);
        let aa = a.square();
        let b = x2.sub(z2);
        let bb = b.square();
        let e = aa.sub(bb);
        let c = x3.add(z3);
        let d = x3.sub(z3);
        let da = d.mul(a);
        let cb = c.mul(b);
        x3 = da.add(cb).square();
        z3 = x1.mul(da.sub(cb).square());
        x2 = aa.mul(bb);
        z2 = e.mul(bb.add(A24.mul(e)));
    }

    Fe::cswap(swap, &mut x2, &mut x3);
    Fe::cswap(swap, &mut z2, &mut z3);

    x2.mul(z2.invert()).to_bytes()
}

/// Scalar multiplication of the base point (u = 9): public-key derivation.
pub fn x25519_base(scalar: &[u8; 32]) -> [u8; 32] {
    let mut base = [0u8; 32];
    base[0] = 9;
    x25519(scalar, &base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::hex;

    fn unhex32(s: &str) -> [u8; 32] {
        let v: Vec<u8> = (0..64)
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect();
        v.try_into().unwrap()
    }

    // RFC 7748 §5.2 test vector 1.
    #[test]
    fn rfc7748_vector_1() {
        let scalar = unhex32("a546e36bf0527c9d3b16154b82465edd62144c0ac1fc5a18506a2244ba449ac4");
        let point = unhex32("e6db6867583030db3594c1a424b15f7c726624ec26b3353b10a903a6d0ab1c4c");
        assert_eq!(
            hex(&x25519(&scalar, &point)),
            "c3da55379de9c6908e94ea4df28d084f32eccf03491c71f754b4075577a28552"
        );
    }

    // RFC 7748 §5.2 test vector 2.
    #[test]
    fn rfc7748_vector_2() {
        let scalar = unhex32("4b66e9d4d1b4673c5ad22691957d6af5c11b6421e0ea01d42ca4169e7918ba0d");
        let point = unhex32("e5210f12786811d3f4b7959d0538ae2c31dbe7106fc03c3efc4cd549c715a493");
        assert_eq!(
            hex(&x25519(&scalar, &point)),
            "95cbde9476e8907d7aade45cb4b873f88b595a68799fa152e6f8f7647aac7957"
        );
    }

    // RFC 7748 §6.1: full Diffie-Hellman agreement.
    #[test]
    fn rfc7748_diffie_hellman() {
        let alice_priv =
            unhex32("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a");
        let bob_priv =
            unhex32("5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb");

        let alice_pub = x25519_base(&alice_priv);
        let bob_pub = x25519_base(&bob_priv);
        assert_eq!(
            hex(&alice_pub),
            "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
        );
        assert_eq!(
            hex(&bob_pub),
            "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f"
        );

        let shared_a = x25519(&alice_priv, &bob_pub);
        let shared_b = x25519(&bob_priv, &alice_pub);
        assert_eq!(shared_a, shared_b);
        assert_eq!(
            hex(&shared_a),
            "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742"
        );
    }

    #[test]
    fn field_roundtrip() {
        let b = unhex32("0100000000000000000000000000000000000000000000000000000000000000");
        assert_eq!(Fe::from_bytes(&b).to_bytes(), b);
    }
}
