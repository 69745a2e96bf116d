//! TLS 1.3 handshake messages.
//!
//! ClientHello construction, ServerHello / NewSessionTicket parsing, and the
//! reframing buffer that splits coalesced handshake messages back apart. A
//! single protected record may carry several messages, and one message may
//! span records, so decrypted handshake bytes are pooled and re-cut on
//! `(type, length24)` headers.

use common::{ByteReader, ByteWriter};

use crate::TlsError;
use crate::suites::CipherSuite;

/// Handshake message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    ClientHello = 1,
    ServerHello = 2,
    NewSessionTicket = 4,
    EncryptedExtensions = 8,
    Certificate = 11,
    CertificateVerify = 15,
    Finished = 20,
}

impl HandshakeType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::ClientHello),
            2 => Some(Self::ServerHello),
            4 => Some(Self::NewSessionTicket),
            8 => Some(Self::EncryptedExtensions),
            11 => Some(Self::Certificate),
            15 => Some(Self::CertificateVerify),
            20 => Some(Self::Finished),
            _ => None,
        }
    }
}

// Extension codes.
pub const EXT_SERVER_NAME: u16 = 0x0000;
pub const EXT_SUPPORTED_GROUPS: u16 = 0x000a;
pub const EXT_SIGNATURE_ALGORITHMS: u16 = 0x000d;
pub const EXT_ALPN: u16 = 0x0010;
pub const EXT_SUPPORTED_VERSIONS: u16 = 0x002b;
pub const EXT_KEY_SHARE: u16 = 0x0033;

/// The only key-exchange group offered.
pub const GROUP_X25519: u16 = 0x001d;

/// Signature schemes advertised (the server's choice is not verified here).
const SIGNATURE_SCHEMES: [u16; 3] = [
    0x0403, // ecdsa_secp256r1_sha256
    0x0804, // rsa_pss_rsae_sha256
    0x0401, // rsa_pkcs1_sha256
];

/// ALPN protocols offered, h2 preferred on the wire. Only `http/1.1` is
/// actually spoken; the client hard-fails if the server picks anything
/// else (see [`parse_encrypted_extensions`]).
const ALPN_PROTOCOLS: [&[u8]; 2] = [b"h2", b"http/1.1"];

/// The one ALPN selection the connection may proceed with.
pub const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Client handshake states, in the order they are normally visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Start,
    WaitServerHello,
    WaitEncryptedExtensions,
    WaitCertificate,
    WaitFinished,
    Connected,
    Closed,
}

/// Wrap a handshake body in its `(type, length24)` header.
pub fn message(msg_type: HandshakeType, body: &[u8]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(4 + body.len());
    w.u8(msg_type as u8);
    w.vec24(body);
    w.finish()
}

/// Build a complete ClientHello handshake message.
pub fn build_client_hello(
    server_name: &str,
    random: &[u8; 32],
    session_id: &[u8; 32],
    key_share_public: &[u8; 32],
) -> Vec<u8> {
    let mut body = ByteWriter::new();
    body.u16(0x0303); // legacy_version
    body.bytes(random);
    body.vec8(session_id);

    // Offered cipher suites, preference order.
    body.with_len16(|w| {
        w.u16(CipherSuite::Aes128GcmSha256 as u16);
        w.u16(CipherSuite::ChaCha20Poly1305Sha256 as u16);
    });

    // Legacy compression: null only.
    body.u8(1);
    body.u8(0);

    // Extensions.
    body.with_len16(|w| {
        // server_name
        w.u16(EXT_SERVER_NAME);
        w.with_len16(|w| {
            w.with_len16(|w| {
                w.u8(0); // host_name
                w.vec16(server_name.as_bytes());
            });
        });

        // supported_versions: TLS 1.3 only
        w.u16(EXT_SUPPORTED_VERSIONS);
        w.with_len16(|w| {
            w.u8(2);
            w.u16(0x0304);
        });

        // supported_groups: x25519 only
        w.u16(EXT_SUPPORTED_GROUPS);
        w.with_len16(|w| {
            w.with_len16(|w| w.u16(GROUP_X25519));
        });

        // signature_algorithms
        w.u16(EXT_SIGNATURE_ALGORITHMS);
        w.with_len16(|w| {
            w.with_len16(|w| {
                for s in SIGNATURE_SCHEMES {
                    w.u16(s);
                }
            });
        });

        // ALPN
        w.u16(EXT_ALPN);
        w.with_len16(|w| {
            w.with_len16(|w| {
                for proto in ALPN_PROTOCOLS {
                    w.vec8(proto);
                }
            });
        });

        // key_share: one x25519 entry
        w.u16(EXT_KEY_SHARE);
        w.with_len16(|w| {
            w.with_len16(|w| {
                w.u16(GROUP_X25519);
                w.vec16(key_share_public);
            });
        });
    });

    message(HandshakeType::ClientHello, &body.finish())
}

/// The parts of a ServerHello the client acts on.
#[derive(Debug, Clone)]
pub struct ServerHello {
    pub cipher_suite: CipherSuite,
    pub key_share: [u8; 32],
}

/// Parse a ServerHello body (after the 4-byte handshake header).
pub fn parse_server_hello(body: &[u8]) -> Result<ServerHello, TlsError> {
    let bad = |_| TlsError::ProtocolViolation("truncated ServerHello");
    let mut r = ByteReader::new(body);

    r.u16().map_err(bad)?; // legacy_version
    r.bytes(32).map_err(bad)?; // random
    r.vec8().map_err(bad)?; // legacy_session_id_echo
    let suite_code = r.u16().map_err(bad)?;
    r.u8().map_err(bad)?; // compression

    let cipher_suite = CipherSuite::from_u16(suite_code)
        .ok_or(TlsError::ProtocolViolation("server chose an unoffered suite"))?;

    let mut key_share: Option<[u8; 32]> = None;
    let exts = r.vec16().map_err(bad)?;
    let mut er = ByteReader::new(exts);
    while !er.is_empty() {
        let ext_type = er.u16().map_err(bad)?;
        let data = er.vec16().map_err(bad)?;
        if ext_type == EXT_KEY_SHARE {
            let mut kr = ByteReader::new(data);
            let group = kr.u16().map_err(bad)?;
            if group != GROUP_X25519 {
                return Err(TlsError::ProtocolViolation("server key share not x25519"));
            }
            let pk = kr.vec16().map_err(bad)?;
            key_share = Some(
                pk.try_into()
                    .map_err(|_| TlsError::ProtocolViolation("bad x25519 key length"))?,
            );
        }
    }

    Ok(ServerHello {
        cipher_suite,
        key_share: key_share.ok_or(TlsError::ProtocolViolation("ServerHello without key share"))?,
    })
}

/// Parse an EncryptedExtensions body, returning the server's ALPN
/// selection if it sent one.
pub fn parse_encrypted_extensions(body: &[u8]) -> Result<Option<Vec<u8>>, TlsError> {
    let bad = |_| TlsError::ProtocolViolation("truncated EncryptedExtensions");
    let mut r = ByteReader::new(body);
    let exts = r.vec16().map_err(bad)?;
    let mut er = ByteReader::new(exts);
    while !er.is_empty() {
        let ext_type = er.u16().map_err(bad)?;
        let data = er.vec16().map_err(bad)?;
        if ext_type == EXT_ALPN {
            // protocol_name_list with exactly one entry in a response.
            let mut ar = ByteReader::new(data);
            let list = ar.vec16().map_err(bad)?;
            let mut lr = ByteReader::new(list);
            let proto = lr.vec8().map_err(bad)?;
            return Ok(Some(proto.to_vec()));
        }
    }
    Ok(None)
}

/// A parsed NewSessionTicket.
#[derive(Debug, Clone)]
pub struct NewSessionTicket {
    pub lifetime_secs: u32,
    pub age_add: u32,
    pub nonce: Vec<u8>,
    pub ticket: Vec<u8>,
}

/// Parse a NewSessionTicket body:
/// `lifetime(4) age_add(4) nonce<0..255> ticket<0..2^16-1> extensions`.
pub fn parse_new_session_ticket(body: &[u8]) -> Result<NewSessionTicket, TlsError> {
    let bad = |_| TlsError::ProtocolViolation("truncated NewSessionTicket");
    let mut r = ByteReader::new(body);
    let lifetime_secs = r.u32().map_err(bad)?;
    let age_add = r.u32().map_err(bad)?;
    let nonce = r.vec8().map_err(bad)?.to_vec();
    let ticket = r.vec16().map_err(bad)?.to_vec();
    // Trailing extensions are ignored.
    Ok(NewSessionTicket {
        lifetime_secs,
        age_add,
        nonce,
        ticket,
    })
}

/// One complete handshake message cut out of the reframing buffer.
#[derive(Debug, Clone)]
pub struct HandshakeMessage {
    pub msg_type: HandshakeType,
    pub body: Vec<u8>,
    /// Header + body, the form that enters the transcript.
    pub raw: Vec<u8>,
}

/// Pools decrypted handshake bytes and re-cuts them into whole messages.
#[derive(Default)]
pub struct HandshakeBuffer {
    buf: Vec<u8>,
}

impl HandshakeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Cut the next whole message, if one is buffered.
    pub fn next_message(&mut self) -> Result<Option<HandshakeMessage>, TlsError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = ((self.buf[1] as usize) << 16) | ((self.buf[2] as usize) << 8) | self.buf[3] as usize;
        if self.buf.len() < 4 + len {
            return Ok(None);
        }
        let msg_type = HandshakeType::from_u8(self.buf[0])
            .ok_or(TlsError::ProtocolViolation("unknown handshake message type"))?;
        let raw: Vec<u8> = self.buf.drain(..4 + len).collect();
        Ok(Some(HandshakeMessage {
            msg_type,
            body: raw[4..].to_vec(),
            raw,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_hello_shape() {
        let hello = build_client_hello("example.com", &[0xAA; 32], &[0xBB; 32], &[0xCC; 32]);
        assert_eq!(hello[0], HandshakeType::ClientHello as u8);
        let len = ((hello[1] as usize) << 16) | ((hello[2] as usize) << 8) | hello[3] as usize;
        assert_eq!(len, hello.len() - 4);
        // Offers exactly our two suites.
        let needle = [0x13u8, 0x01, 0x13, 0x03];
        assert!(hello.windows(4).any(|w| w == needle));
        // Carries the SNI bytes and both ALPN protocols.
        assert!(hello.windows(11).any(|w| w == b"example.com"));
        assert!(hello.windows(8).any(|w| w == b"http/1.1"));
    }

    fn fake_server_hello(suite: u16, group: u16) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.u16(0x0303);
        w.bytes(&[0u8; 32]);
        w.vec8(&[0u8; 32]);
        w.u16(suite);
        w.u8(0);
        w.with_len16(|w| {
            w.u16(EXT_SUPPORTED_VERSIONS);
            w.with_len16(|w| w.u16(0x0304));
            w.u16(EXT_KEY_SHARE);
            w.with_len16(|w| {
                w.u16(group);
                w.vec16(&[0x42u8; 32]);
            });
        });
        w.finish()
    }

    #[test]
    fn server_hello_parses() {
        let body = fake_server_hello(0x1301, GROUP_X25519);
        let sh = parse_server_hello(&body).unwrap();
        assert_eq!(sh.cipher_suite, CipherSuite::Aes128GcmSha256);
        assert_eq!(sh.key_share, [0x42u8; 32]);
    }

    #[test]
    fn server_hello_rejects_unknown_suite() {
        let body = fake_server_hello(0x1302, GROUP_X25519);
        assert!(parse_server_hello(&body).is_err());
    }

    #[test]
    fn server_hello_rejects_wrong_group() {
        let body = fake_server_hello(0x1301, 0x0017);
        assert!(parse_server_hello(&body).is_err());
    }

    #[test]
    fn encrypted_extensions_without_alpn() {
        // Empty extension list: the server ignored the offer.
        assert_eq!(parse_encrypted_extensions(&[0, 0]).unwrap(), None);
    }

    #[test]
    fn encrypted_extensions_alpn_selection() {
        let mut w = ByteWriter::new();
        w.with_len16(|w| {
            w.u16(EXT_ALPN);
            w.with_len16(|w| {
                w.with_len16(|w| w.vec8(b"http/1.1"));
            });
        });
        assert_eq!(
            parse_encrypted_extensions(&w.finish()).unwrap(),
            Some(b"http/1.1".to_vec())
        );
    }

    #[test]
    fn encrypted_extensions_truncated() {
        assert!(parse_encrypted_extensions(&[0]).is_err());
    }

    #[test]
    fn session_ticket_parses() {
        let mut w = ByteWriter::new();
        w.u32(7200);
        w.u32(0xDEADBEEF);
        w.vec8(&[1, 2]);
        w.vec16(b"opaque-ticket");
        w.u16(0); // empty extensions
        let t = parse_new_session_ticket(&w.finish()).unwrap();
        assert_eq!(t.lifetime_secs, 7200);
        assert_eq!(t.age_add, 0xDEADBEEF);
        assert_eq!(t.nonce, vec![1, 2]);
        assert_eq!(t.ticket, b"opaque-ticket");
    }

    #[test]
    fn reframer_splits_coalesced_messages() {
        // Two messages delivered in one record, split across pushes.
        let m1 = message(HandshakeType::EncryptedExtensions, &[0, 0]);
        let m2 = message(HandshakeType::Finished, &[9; 32]);
        let mut joined = m1.clone();
        joined.extend_from_slice(&m2);

        let mut buf = HandshakeBuffer::new();
        buf.push(&joined[..3]);
        assert!(buf.next_message().unwrap().is_none());
        buf.push(&joined[3..]);

        let first = buf.next_message().unwrap().unwrap();
        assert_eq!(first.msg_type, HandshakeType::EncryptedExtensions);
        assert_eq!(first.raw, m1);

        let second = buf.next_message().unwrap().unwrap();
        assert_eq!(second.msg_type, HandshakeType::Finished);
        assert_eq!(second.body, vec![9; 32]);
        assert!(buf.next_message().unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn reframer_rejects_unknown_type() {
        let mut buf = HandshakeBuffer::new();
        buf.push(&[99, 0, 0, 1, 0]);
        assert!(buf.next_message().is_err());
    }
}
