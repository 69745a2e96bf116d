//! TLS 1.3 client connection.
//!
//! Drives the handshake state machine over a [`Transport`], then exposes a
//! bidirectional byte stream to the HTTP layer. Application traffic keys are
//! installed as soon as ServerFinished is processed, before ClientFinished
//! is sent; both directions reset their sequence numbers at every key
//! change.

use std::time::{Duration, Instant};

use crypto::ct_eq;
use crypto::x25519::{x25519, x25519_base};
use tracing::{debug, warn};

use crate::handshake::{
    ALPN_HTTP11, HandshakeBuffer, HandshakeState, HandshakeType, build_client_hello, message,
    parse_encrypted_extensions, parse_new_session_ticket, parse_server_hello,
};
use crate::keys::{KeySchedule, Transcript, finished_verify, ticket_psk, traffic_keys};
use crate::rand::random_32;
use crate::record::{ContentType, MAX_PLAINTEXT, Record, open_record, seal_record};
use crate::suites::{Aead, CipherSuite};
use crate::ticket::{StoredTicket, TicketCache};
use crate::{TlsError, Transport};

/// Per-read deadline while the handshake is in flight.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded post-handshake window for the opportunistic NewSessionTicket
/// read. A timeout here is not an error.
const TICKET_HARVEST_TIMEOUT: Duration = Duration::from_millis(50);

const ALERT_CLOSE_NOTIFY: u8 = 0;

// ─────────────────────────────────────────────────────────────────────────────
// Directional keys
// ─────────────────────────────────────────────────────────────────────────────

/// AEAD, static IV and sequence number for one direction of traffic.
struct Direction {
    aead: Aead,
    iv: [u8; 12],
    seq: u64,
}

impl Direction {
    /// Derive fresh keys from a traffic secret. Sequence restarts at zero.
    fn new(suite: CipherSuite, secret: &[u8; 32]) -> Self {
        let tk = traffic_keys(secret, suite);
        Self {
            aead: Aead::new(suite, &tk.key),
            iv: tk.iv,
            seq: 0,
        }
    }

    fn seal(&mut self, inner: ContentType, payload: &[u8]) -> Record {
        let rec = seal_record(&self.aead, &self.iv, self.seq, inner, payload);
        self.seq += 1;
        rec
    }

    fn open(&mut self, record: &Record) -> Result<(ContentType, Vec<u8>), TlsError> {
        let out = open_record(&self.aead, &self.iv, self.seq, record)?;
        self.seq += 1;
        Ok(out)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Record-framing connection
// ─────────────────────────────────────────────────────────────────────────────

struct Conn<T: Transport> {
    transport: T,
    incoming: Vec<u8>,
}

impl<T: Transport> Conn<T> {
    fn send_record(&mut self, record: &Record) -> Result<(), TlsError> {
        self.transport.send(&record.to_wire())
    }

    /// Read one whole record, polling the transport until the deadline.
    fn read_record(&mut self, timeout: Duration) -> Result<Record, TlsError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some((record, used)) = Record::from_wire(&self.incoming)? {
                self.incoming.drain(..used);
                return Ok(record);
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Err(TlsError::Timeout);
            }
            match self.transport.recv(left.as_millis() as u64)? {
                Some(bytes) => self.incoming.extend_from_slice(&bytes),
                None => return Err(TlsError::Timeout),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TlsClient
// ─────────────────────────────────────────────────────────────────────────────

/// A connected TLS 1.3 session.
pub struct TlsClient<T: Transport> {
    conn: Conn<T>,
    suite: CipherSuite,
    send: Direction,
    recv: Direction,
    state: HandshakeState,
}

impl<T: Transport> TlsClient<T> {
    /// Perform a full handshake with the server behind `transport`.
    ///
    /// `host` is used for SNI and as the ticket-cache key. Any freshly
    /// issued session ticket is stored into `tickets`.
    pub fn handshake(
        host: &str,
        transport: T,
        tickets: &mut TicketCache,
    ) -> Result<Self, TlsError> {
        let mut conn = Conn {
            transport,
            incoming: Vec::new(),
        };
        let mut transcript = Transcript::new();

        // ── ClientHello ──
        let client_private = random_32();
        let client_public = x25519_base(&client_private);
        let hello = build_client_hello(host, &random_32(), &random_32(), &client_public);
        transcript.add(&hello);
        conn.send_record(&Record::new(ContentType::Handshake, hello))?;
        let mut state = HandshakeState::WaitServerHello;
        debug!(host, "sent ClientHello");

        // ── ServerHello: one unencrypted record, exactly one message ──
        let record = loop {
            let r = conn.read_record(HANDSHAKE_TIMEOUT)?;
            match r.content_type {
                ContentType::ChangeCipherSpec => continue,
                ContentType::Alert => return Err(parse_alert(&r.payload)),
                ContentType::Handshake => break r,
                ContentType::ApplicationData => {
                    return Err(TlsError::ProtocolViolation("encrypted data before ServerHello"));
                }
            }
        };
        let mut hs = HandshakeBuffer::new();
        hs.push(&record.payload);
        let msg = hs
            .next_message()?
            .ok_or(TlsError::ProtocolViolation("truncated ServerHello"))?;
        if msg.msg_type != HandshakeType::ServerHello || !hs.is_empty() {
            return Err(TlsError::ProtocolViolation(
                "ServerHello record must hold exactly one ServerHello",
            ));
        }
        let server_hello = parse_server_hello(&msg.body)?;
        transcript.add(&msg.raw);
        let suite = server_hello.cipher_suite;
        debug!(?state, ?suite, "got ServerHello");

        // ── Handshake traffic keys ──
        let shared = x25519(&client_private, &server_hello.key_share);
        let mut schedule = KeySchedule::after_server_hello(suite, &shared, &transcript.hash());
        let mut send = Direction::new(suite, &schedule.client_hs_traffic);
        let mut recv = Direction::new(suite, &schedule.server_hs_traffic);
        state = HandshakeState::WaitEncryptedExtensions;

        // ── Encrypted server flight ──
        let mut certificate_seen = false;
        'flight: loop {
            while let Some(msg) = hs.next_message()? {
                match (state, msg.msg_type) {
                    (HandshakeState::WaitEncryptedExtensions, HandshakeType::EncryptedExtensions) => {
                        // h2 is offered for wire compatibility but not
                        // spoken; only an http/1.1 selection (or none)
                        // may proceed.
                        if let Some(proto) = parse_encrypted_extensions(&msg.body)? {
                            if proto != ALPN_HTTP11 {
                                return Err(TlsError::ProtocolViolation(
                                    "server selected an unsupported ALPN protocol",
                                ));
                            }
                        }
                        transcript.add(&msg.raw);
                        state = HandshakeState::WaitCertificate;
                    }
                    (HandshakeState::WaitCertificate, HandshakeType::Certificate) => {
                        // Consumed but not validated; path building is an
                        // external collaborator.
                        transcript.add(&msg.raw);
                        certificate_seen = true;
                    }
                    (HandshakeState::WaitCertificate, HandshakeType::CertificateVerify)
                        if certificate_seen =>
                    {
                        transcript.add(&msg.raw);
                        state = HandshakeState::WaitFinished;
                    }
                    (
                        HandshakeState::WaitCertificate | HandshakeState::WaitFinished,
                        HandshakeType::Finished,
                    ) => {
                        let expected = finished_verify(&schedule.server_hs_traffic, &transcript.hash());
                        if !ct_eq(&expected, &msg.body) {
                            return Err(TlsError::ProtocolViolation(
                                "server Finished verify data mismatch",
                            ));
                        }
                        transcript.add(&msg.raw);
                        debug!("verified ServerFinished");
                        break 'flight;
                    }
                    _ => {
                        return Err(TlsError::ProtocolViolation(
                            "handshake message out of order",
                        ));
                    }
                }
            }

            let record = conn.read_record(HANDSHAKE_TIMEOUT)?;
            match record.content_type {
                ContentType::ChangeCipherSpec => continue,
                ContentType::Alert => return Err(parse_alert(&record.payload)),
                ContentType::ApplicationData => {
                    let (inner, plain) = recv.open(&record)?;
                    match inner {
                        ContentType::Handshake => hs.push(&plain),
                        ContentType::Alert => return Err(parse_alert(&plain)),
                        _ => {
                            return Err(TlsError::ProtocolViolation(
                                "unexpected inner content type in handshake",
                            ));
                        }
                    }
                }
                ContentType::Handshake => {
                    return Err(TlsError::ProtocolViolation(
                        "unencrypted handshake after ServerHello",
                    ));
                }
            }
        }

        // ── Application secrets from the hash through ServerFinished,
        //    installed before ClientFinished goes out ──
        let server_finished_hash = transcript.hash();
        schedule.install_application_secrets(&server_finished_hash);

        let verify = finished_verify(&schedule.client_hs_traffic, &server_finished_hash);
        let finished = message(HandshakeType::Finished, &verify);
        transcript.add(&finished);
        let record = send.seal(ContentType::Handshake, &finished);
        conn.send_record(&record)?;

        let send = Direction::new(
            suite,
            &schedule.client_app_traffic.expect("app secrets installed"),
        );
        let recv_app = Direction::new(
            suite,
            &schedule.server_app_traffic.expect("app secrets installed"),
        );
        state = HandshakeState::Connected;
        debug!("handshake complete");

        let mut client = TlsClient {
            conn,
            suite,
            send,
            recv: recv_app,
            state,
        };

        // ── Bounded opportunistic ticket harvest ──
        if let Some(resumption_master) = schedule.resumption_master(&transcript.hash()) {
            client.harvest_ticket(host, &resumption_master, tickets);
        }

        Ok(client)
    }

    /// One short read after the handshake; if the server pushed a
    /// NewSessionTicket it is stored, otherwise nothing happens.
    fn harvest_ticket(
        &mut self,
        host: &str,
        resumption_master: &[u8; 32],
        tickets: &mut TicketCache,
    ) {
        let record = match self.conn.read_record(TICKET_HARVEST_TIMEOUT) {
            Ok(r) => r,
            Err(TlsError::Timeout) => return,
            Err(_) => return,
        };
        if record.content_type != ContentType::ApplicationData {
            return;
        }
        let Ok((inner, plain)) = self.recv.open(&record) else {
            return;
        };
        if inner != ContentType::Handshake {
            return;
        }

        let mut hs = HandshakeBuffer::new();
        hs.push(&plain);
        while let Ok(Some(msg)) = hs.next_message() {
            if msg.msg_type != HandshakeType::NewSessionTicket {
                continue;
            }
            match parse_new_session_ticket(&msg.body) {
                Ok(t) => {
                    debug!(host, lifetime = t.lifetime_secs, "stored session ticket");
                    tickets.store(
                        host,
                        StoredTicket {
                            resumption_secret: ticket_psk(resumption_master, &t.nonce),
                            ticket: t.ticket,
                            lifetime: Duration::from_secs(t.lifetime_secs as u64),
                            age_add: t.age_add,
                            stored_at: Instant::now(),
                            cipher_suite: self.suite,
                        },
                    );
                }
                Err(_) => warn!("malformed NewSessionTicket ignored"),
            }
        }
    }

    /// Return the plaintext of the next application-data record.
    ///
    /// ChangeCipherSpec and post-handshake handshake messages are skipped
    /// transparently; alerts surface as errors, `close_notify` as
    /// [`TlsError::Closed`].
    pub fn read(&mut self, timeout: Duration) -> Result<Vec<u8>, TlsError> {
        loop {
            let record = self.conn.read_record(timeout)?;
            match record.content_type {
                ContentType::ChangeCipherSpec => continue,
                ContentType::Alert => return Err(parse_alert(&record.payload)),
                ContentType::Handshake => {
                    return Err(TlsError::ProtocolViolation(
                        "unencrypted handshake after connect",
                    ));
                }
                ContentType::ApplicationData => {
                    let (inner, plain) = self.recv.open(&record)?;
                    match inner {
                        ContentType::ApplicationData => return Ok(plain),
                        // Late NewSessionTicket or KeyUpdate; skipped.
                        ContentType::Handshake => {
                            debug!("skipping post-handshake message");
                            continue;
                        }
                        ContentType::Alert => return Err(parse_alert(&plain)),
                        ContentType::ChangeCipherSpec => {
                            return Err(TlsError::ProtocolViolation("CCS inside protected record"));
                        }
                    }
                }
            }
        }
    }

    /// AEAD-seal `data` into one or more application-data records.
    pub fn write(&mut self, data: &[u8]) -> Result<(), TlsError> {
        for chunk in data.chunks(MAX_PLAINTEXT) {
            let record = self.send.seal(ContentType::ApplicationData, chunk);
            self.conn.send_record(&record)?;
        }
        Ok(())
    }

    /// Send `close_notify` best-effort, drop keys, close the transport.
    pub fn close(mut self) {
        let alert = self.send.seal(ContentType::Alert, &[1, ALERT_CLOSE_NOTIFY]);
        let _ = self.conn.send_record(&alert);
        self.conn.transport.close();
        self.state = HandshakeState::Closed;
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn cipher_suite(&self) -> CipherSuite {
        self.suite
    }
}

/// Alerts are `(level, description)`; `close_notify` is a clean close.
fn parse_alert(payload: &[u8]) -> TlsError {
    match payload {
        [_, ALERT_CLOSE_NOTIFY] => TlsError::Closed,
        [level, description] => TlsError::Alert(*level, *description),
        _ => TlsError::ProtocolViolation("malformed alert"),
    }
}
