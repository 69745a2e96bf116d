//! # TLS 1.3 Client (RFC 8446)
//!
//! A from-scratch TLS 1.3 client: record layer, handshake state machine, key
//! schedule, AEAD cipher-suite dispatch, and per-host session-ticket cache.
//! Certificates are consumed but not validated; that concern sits outside
//! this crate.

#![forbid(unsafe_code)]

pub mod client;
pub mod handshake;
pub mod keys;
pub mod rand;
pub mod record;
pub mod suites;
pub mod ticket;

use thiserror::Error;

pub use client::TlsClient;
pub use suites::CipherSuite;
pub use ticket::TicketCache;

/// Errors surfaced by the TLS layer. Per the error taxonomy, everything that
/// breaks the protocol collapses into [`TlsError::ProtocolViolation`]; the
/// controller only ever sees a single fatal reason for a dead connection.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Malformed record, unexpected handshake message, failed AEAD open, or
    /// any other violation of RFC 8446. Fatal to the connection.
    #[error("TLS protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// A fatal alert from the peer, `(level, description)`.
    #[error("TLS alert: level {0}, description {1}")]
    Alert(u8, u8),

    /// The peer sent `close_notify`; the connection ended cleanly.
    #[error("connection closed")]
    Closed,

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// No data arrived within the caller's deadline.
    #[error("read timed out")]
    Timeout,
}

/// Byte-oriented transport under the record layer. No framing is assumed;
/// the TLS layer frames records itself.
pub trait Transport {
    /// Send all of `data`.
    fn send(&mut self, data: &[u8]) -> Result<(), TlsError>;

    /// Receive whatever is available, waiting at most `timeout_ms`.
    /// `Ok(None)` means the deadline passed with nothing to read.
    fn recv(&mut self, timeout_ms: u64) -> Result<Option<Vec<u8>>, TlsError>;

    /// Close the transport. Further calls may fail.
    fn close(&mut self);
}
