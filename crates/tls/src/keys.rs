//! TLS 1.3 key schedule (RFC 8446 §7).
//!
//! Both supported suites are SHA-256 based, so every secret is 32 bytes.
//! The schedule is staged the way the handshake consumes it: handshake
//! traffic secrets become available at ServerHello, application secrets at
//! ServerFinished and are installed before ClientFinished is sent.

use crypto::digest::{OUT_LEN, Sha256, sha256};
use crypto::{hkdf_expand, hkdf_extract, hmac_sha256};

use crate::suites::CipherSuite;

/// `HKDF-Expand-Label(secret, "tls13 " + label, context, length)`.
pub fn hkdf_expand_label(secret: &[u8], label: &[u8], context: &[u8], length: usize) -> Vec<u8> {
    let mut info = Vec::with_capacity(10 + label.len() + context.len());
    info.extend_from_slice(&(length as u16).to_be_bytes());
    info.push((6 + label.len()) as u8);
    info.extend_from_slice(b"tls13 ");
    info.extend_from_slice(label);
    info.push(context.len() as u8);
    info.extend_from_slice(context);
    hkdf_expand(secret, &info, length)
}

/// `Derive-Secret(secret, label, transcript-hash)`.
pub fn derive_secret(secret: &[u8], label: &[u8], transcript_hash: &[u8; 32]) -> [u8; 32] {
    hkdf_expand_label(secret, label, transcript_hash, OUT_LEN)
        .try_into()
        .expect("digest-sized output")
}

/// Key and static IV for one direction of traffic.
#[derive(Clone)]
pub struct TrafficKeys {
    pub key: Vec<u8>,
    pub iv: [u8; 12],
}

/// Expand a traffic secret into its key and IV for `suite`.
pub fn traffic_keys(secret: &[u8; 32], suite: CipherSuite) -> TrafficKeys {
    let key = hkdf_expand_label(secret, b"key", b"", suite.key_len());
    let iv: [u8; 12] = hkdf_expand_label(secret, b"iv", b"", suite.iv_len())
        .try_into()
        .expect("12-byte IV");
    TrafficKeys { key, iv }
}

/// Finished verify data: `HMAC(HKDF-Expand-Label(secret, "finished", "", 32), hash)`.
pub fn finished_verify(traffic_secret: &[u8; 32], transcript_hash: &[u8; 32]) -> [u8; 32] {
    let finished_key = hkdf_expand_label(traffic_secret, b"finished", b"", OUT_LEN);
    hmac_sha256(&finished_key, transcript_hash)
}

/// Running hash of all handshake message bodies (header + body, no record
/// framing). Snapshots are taken at ServerHello, ServerFinished, and
/// ClientFinished.
#[derive(Clone, Default)]
pub struct Transcript {
    hasher: Sha256,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: &[u8]) {
        self.hasher.update(message);
    }

    pub fn hash(&self) -> [u8; 32] {
        self.hasher.clone().finalize()
    }
}

/// The secrets alive during and after a handshake.
pub struct KeySchedule {
    pub suite: CipherSuite,
    handshake_secret: [u8; 32],
    pub client_hs_traffic: [u8; 32],
    pub server_hs_traffic: [u8; 32],
    master_secret: Option<[u8; 32]>,
    pub client_app_traffic: Option<[u8; 32]>,
    pub server_app_traffic: Option<[u8; 32]>,
}

impl KeySchedule {
    /// Stage one, at ServerHello: mix the ECDH shared secret in and derive
    /// handshake traffic secrets from the hash through ServerHello.
    pub fn after_server_hello(
        suite: CipherSuite,
        shared_secret: &[u8; 32],
        hello_hash: &[u8; 32],
    ) -> Self {
        let empty_hash = sha256(b"");
        let zeros = [0u8; 32];

        let early_secret = hkdf_extract(&zeros, &zeros);
        let derived = derive_secret(&early_secret, b"derived", &empty_hash);
        let handshake_secret = hkdf_extract(&derived, shared_secret);

        let client_hs_traffic = derive_secret(&handshake_secret, b"c hs traffic", hello_hash);
        let server_hs_traffic = derive_secret(&handshake_secret, b"s hs traffic", hello_hash);

        Self {
            suite,
            handshake_secret,
            client_hs_traffic,
            server_hs_traffic,
            master_secret: None,
            client_app_traffic: None,
            server_app_traffic: None,
        }
    }

    /// Stage two, at ServerFinished: derive the master secret and the
    /// application traffic secrets from the hash through ServerFinished.
    pub fn install_application_secrets(&mut self, server_finished_hash: &[u8; 32]) {
        let empty_hash = sha256(b"");
        let derived = derive_secret(&self.handshake_secret, b"derived", &empty_hash);
        let master = hkdf_extract(&derived, &[0u8; 32]);

        self.client_app_traffic =
            Some(derive_secret(&master, b"c ap traffic", server_finished_hash));
        self.server_app_traffic =
            Some(derive_secret(&master, b"s ap traffic", server_finished_hash));
        self.master_secret = Some(master);
    }

    /// Stage three, after ClientFinished: the resumption master secret that
    /// NewSessionTicket PSKs are derived from.
    pub fn resumption_master(&self, client_finished_hash: &[u8; 32]) -> Option<[u8; 32]> {
        let master = self.master_secret?;
        Some(derive_secret(&master, b"res master", client_finished_hash))
    }
}

/// PSK for one stored ticket: `HKDF-Expand-Label(res_master, "resumption", nonce, 32)`.
pub fn ticket_psk(resumption_master: &[u8; 32], ticket_nonce: &[u8]) -> [u8; 32] {
    hkdf_expand_label(resumption_master, b"resumption", ticket_nonce, OUT_LEN)
        .try_into()
        .expect("digest-sized output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto::digest::hex;

    #[test]
    fn expand_label_lengths() {
        let secret = [0x42u8; 32];
        assert_eq!(hkdf_expand_label(&secret, b"key", b"", 16).len(), 16);
        assert_eq!(hkdf_expand_label(&secret, b"key", b"", 32).len(), 32);
        assert_eq!(hkdf_expand_label(&secret, b"iv", b"", 12).len(), 12);
    }

    // RFC 8448 §3 (simple 1-RTT handshake trace).
    #[test]
    fn rfc8448_handshake_secrets() {
        let shared: [u8; 32] = unhex(
            "8bd4054fb55b9d63fdfbacf9f04b9f0d35e6d63f537563efd46272900f89492d",
        );
        let hello_hash: [u8; 32] = unhex(
            "860c06edc07858ee8e78f0e7428c58edd6b43f2ca3e6e95f02ed063cf0e1cad8",
        );
        let ks = KeySchedule::after_server_hello(
            CipherSuite::Aes128GcmSha256,
            &shared,
            &hello_hash,
        );
        assert_eq!(
            hex(&ks.client_hs_traffic),
            "b3eddb126e067f35a780b3abf45e2d8f3b1a950738f52e9600746a0e27a55a21"
        );
        assert_eq!(
            hex(&ks.server_hs_traffic),
            "b67b7d690cc16c4e75e54213cb2d37b4e9c912bcded9105d42befd59d391ad38"
        );
    }

    #[test]
    fn application_secrets_appear_after_stage_two() {
        let mut ks = KeySchedule::after_server_hello(
            CipherSuite::Aes128GcmSha256,
            &[1u8; 32],
            &sha256(b"hello"),
        );
        assert!(ks.client_app_traffic.is_none());
        ks.install_application_secrets(&sha256(b"through server finished"));
        assert!(ks.client_app_traffic.is_some());
        assert!(ks.server_app_traffic.is_some());
        assert_ne!(
            ks.client_app_traffic.unwrap(),
            ks.server_app_traffic.unwrap()
        );
    }

    #[test]
    fn traffic_key_sizes_follow_suite() {
        let secret = [9u8; 32];
        let aes = traffic_keys(&secret, CipherSuite::Aes128GcmSha256);
        assert_eq!(aes.key.len(), 16);
        let chacha = traffic_keys(&secret, CipherSuite::ChaCha20Poly1305Sha256);
        assert_eq!(chacha.key.len(), 32);
    }

    #[test]
    fn finished_is_deterministic() {
        let secret = [3u8; 32];
        let hash = sha256(b"transcript");
        assert_eq!(finished_verify(&secret, &hash), finished_verify(&secret, &hash));
    }

    #[test]
    fn transcript_snapshots() {
        let mut t = Transcript::new();
        t.add(b"client hello");
        let h1 = t.hash();
        t.add(b"server hello");
        assert_eq!(h1, sha256(b"client hello"));
        assert_eq!(t.hash(), sha256(b"client helloserver hello"));
    }

    fn unhex(s: &str) -> [u8; 32] {
        let v: Vec<u8> = (0..64)
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect();
        v.try_into().unwrap()
    }
}
