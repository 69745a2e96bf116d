//! TLS 1.3 record layer.
//!
//! Framing of records from a raw byte stream, plus AEAD protection. An
//! encrypted record's plaintext is `content || type-byte || zero padding`;
//! the real content type is the last nonzero byte.

use common::{ByteReader, ByteWriter};

use crate::TlsError;
use crate::suites::Aead;

/// Outer record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            20 => Some(Self::ChangeCipherSpec),
            21 => Some(Self::Alert),
            22 => Some(Self::Handshake),
            23 => Some(Self::ApplicationData),
            _ => None,
        }
    }
}

/// All records carry 0x0303 on the wire for middlebox compatibility.
pub const LEGACY_VERSION: u16 = 0x0303;

/// Maximum plaintext per record.
pub const MAX_PLAINTEXT: usize = 16384;
/// Maximum protected payload (plaintext + type byte + tag + slack).
pub const MAX_CIPHERTEXT: usize = MAX_PLAINTEXT + 256;

/// One record as it appears on the wire.
#[derive(Debug, Clone)]
pub struct Record {
    pub content_type: ContentType,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn new(content_type: ContentType, payload: Vec<u8>) -> Self {
        Self {
            content_type,
            payload,
        }
    }

    /// Serialize with the 5-byte record header.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(5 + self.payload.len());
        w.u8(self.content_type as u8);
        w.u16(LEGACY_VERSION);
        w.vec16(&self.payload);
        w.finish()
    }

    /// Try to frame one record out of `buf`. On success returns the record
    /// and the number of bytes consumed; `Ok(None)` means more bytes are
    /// needed.
    pub fn from_wire(buf: &[u8]) -> Result<Option<(Record, usize)>, TlsError> {
        if buf.len() < 5 {
            return Ok(None);
        }
        let mut r = ByteReader::new(buf);
        let ct = r.u8().expect("length checked");
        let _version = r.u16().expect("length checked");
        let len = r.u16().expect("length checked") as usize;

        if len > MAX_CIPHERTEXT {
            return Err(TlsError::ProtocolViolation("record too large"));
        }
        if buf.len() < 5 + len {
            return Ok(None);
        }
        let content_type = ContentType::from_u8(ct)
            .ok_or(TlsError::ProtocolViolation("unknown record content type"))?;
        Ok(Some((
            Record {
                content_type,
                payload: buf[5..5 + len].to_vec(),
            },
            5 + len,
        )))
    }
}

/// Per-record nonce: the 64-bit sequence number, big-endian and left-padded
/// with zeros to the IV length, XORed into the static IV.
pub fn make_nonce(iv: &[u8; 12], seq: u64) -> [u8; 12] {
    let mut nonce = *iv;
    for (i, b) in seq.to_be_bytes().iter().enumerate() {
        nonce[4 + i] ^= b;
    }
    nonce
}

/// Protect `inner_type || payload` into an outer ApplicationData record.
pub fn seal_record(
    aead: &Aead,
    iv: &[u8; 12],
    seq: u64,
    inner_type: ContentType,
    payload: &[u8],
) -> Record {
    let mut inner = Vec::with_capacity(payload.len() + 1);
    inner.extend_from_slice(payload);
    inner.push(inner_type as u8);

    let nonce = make_nonce(iv, seq);
    let aad = record_aad(inner.len() + 16);
    Record {
        content_type: ContentType::ApplicationData,
        payload: aead.seal(&nonce, &aad, &inner),
    }
}

/// Unprotect an ApplicationData record, yielding the inner content type and
/// plaintext with padding stripped.
pub fn open_record(
    aead: &Aead,
    iv: &[u8; 12],
    seq: u64,
    record: &Record,
) -> Result<(ContentType, Vec<u8>), TlsError> {
    let nonce = make_nonce(iv, seq);
    let aad = record_aad(record.payload.len());
    let mut inner = aead
        .open(&nonce, &aad, &record.payload)
        .ok_or(TlsError::ProtocolViolation("record authentication failed"))?;

    // Strip zero padding; the last nonzero byte is the inner type.
    while inner.last() == Some(&0) {
        inner.pop();
    }
    let type_byte = inner
        .pop()
        .ok_or(TlsError::ProtocolViolation("record had no content type"))?;
    let inner_type = ContentType::from_u8(type_byte)
        .ok_or(TlsError::ProtocolViolation("bad inner content type"))?;
    Ok((inner_type, inner))
}

/// The additional data is the outer record header.
fn record_aad(ciphertext_len: usize) -> [u8; 5] {
    [
        ContentType::ApplicationData as u8,
        (LEGACY_VERSION >> 8) as u8,
        LEGACY_VERSION as u8,
        (ciphertext_len >> 8) as u8,
        ciphertext_len as u8,
    ]
}
