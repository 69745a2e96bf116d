//! TCP transport.
//!
//! Implements the byte-oriented transport boundary the TLS layer (and
//! plain HTTP) sits on: connect, send, receive-with-timeout, close. DNS
//! resolution happens here, through the standard resolver.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tls::{TlsError, Transport};
use tracing::debug;

const RECV_CHUNK: usize = 16 * 1024;

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Resolve `host` and connect to the first reachable address.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, TlsError> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| TlsError::Transport(format!("resolve {host}: {e}")))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true).ok();
                    debug!(%addr, "connected");
                    return Ok(Self { stream });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(TlsError::Transport(match last_err {
            Some(e) => format!("connect {host}:{port}: {e}"),
            None => format!("no addresses for {host}"),
        }))
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8]) -> Result<(), TlsError> {
        self.stream
            .write_all(data)
            .and_then(|_| self.stream.flush())
            .map_err(|e| TlsError::Transport(e.to_string()))
    }

    fn recv(&mut self, timeout_ms: u64) -> Result<Option<Vec<u8>>, TlsError> {
        self.stream
            .set_read_timeout(Some(Duration::from_millis(timeout_ms.max(1))))
            .map_err(|e| TlsError::Transport(e.to_string()))?;

        let mut buf = vec![0u8; RECV_CHUNK];
        match self.stream.read(&mut buf) {
            Ok(0) => Err(TlsError::Closed),
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(TlsError::Transport(e.to_string())),
        }
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
