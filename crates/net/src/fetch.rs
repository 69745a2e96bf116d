//! Fetch orchestration.
//!
//! Resolves an origin-ful URL to a response, speaking plain HTTP/1.1 on
//! `http` and HTTP/1.1 over the TLS client on `https`. Up to five
//! redirects are followed automatically; the final URL is reported back.

use std::time::{Duration, Instant};

use tls::{TicketCache, TlsClient, TlsError, Transport};
use tracing::{debug, warn};
use url_parser::{Scheme, Url};

use crate::http::{HttpResponse, build_request, parse_response};
use crate::transport::TcpTransport;
use crate::FetchError;

/// Redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: Url, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            url,
            method: "POST".to_string(),
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: Some(body),
        }
    }
}

/// What the controller consumes.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Where the response actually came from, after redirects.
    pub final_url: Url,
}

impl FetchResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as text, for HTML-ish and other text content types.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The fetch service. One instance per browser; carries only settings, so
/// each fetch opens a fresh connection (`Connection: close` semantics).
pub struct NetService {
    pub user_agent: String,
    pub max_redirects: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for NetService {
    fn default() -> Self {
        Self::new()
    }
}

impl NetService {
    pub fn new() -> Self {
        Self {
            user_agent: "tern/0.1".to_string(),
            max_redirects: MAX_REDIRECTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Fetch `request`, following redirects. Only origin-ful URLs are
    /// accepted; opaque schemes resolve locally in the controller.
    pub fn fetch(
        &self,
        request: FetchRequest,
        tickets: &mut TicketCache,
    ) -> Result<FetchResponse, FetchError> {
        let mut url = request.url.clone();
        let mut method = request.method.clone();
        let mut body = request.body.clone();
        let mut redirects = 0;

        loop {
            if !url.has_origin() {
                return Err(FetchError::NotFetchable);
            }

            let response = self.fetch_once(&url, &method, &request.headers, body.as_deref(), tickets)?;

            if response.is_redirect() && redirects < self.max_redirects {
                let location = response.location().unwrap_or_default().to_string();
                let next = url
                    .join(&location)
                    .map_err(|e| FetchError::ConnectionFailed(format!("bad redirect: {e}")))?;
                debug!(from = %url, to = %next, status = response.status, "redirect");
                redirects += 1;
                // 303 (and historical 301/302 practice) switch to GET.
                if matches!(response.status, 301 | 302 | 303) {
                    method = "GET".to_string();
                    body = None;
                }
                url = next;
                continue;
            }
            if response.is_redirect() {
                return Err(FetchError::TooManyRedirects);
            }

            return Ok(FetchResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
                final_url: url,
            });
        }
    }

    fn fetch_once(
        &self,
        url: &Url,
        method: &str,
        headers: &[(String, String)],
        body: Option<&[u8]>,
        tickets: &mut TicketCache,
    ) -> Result<HttpResponse, FetchError> {
        let fail = |e: TlsError| FetchError::ConnectionFailed(e.to_string());
        let request = build_request(method, url, &self.user_agent, headers, body);
        let transport =
            TcpTransport::connect(&url.host, url.port, self.connect_timeout).map_err(fail)?;

        let raw = match url.scheme {
            Scheme::Https => {
                let mut client =
                    TlsClient::handshake(&url.host, transport, tickets).map_err(fail)?;
                client.write(&request).map_err(fail)?;
                let raw = self.drain_tls(&mut client)?;
                client.close();
                raw
            }
            Scheme::Http => {
                let mut transport = transport;
                transport.send(&request).map_err(fail)?;
                let raw = self.drain_tcp(&mut transport)?;
                transport.close();
                raw
            }
            _ => return Err(FetchError::NotFetchable),
        };

        parse_response(&raw)
            .ok_or_else(|| FetchError::ConnectionFailed("malformed HTTP response".to_string()))
    }

    /// Read application data until the peer closes or the deadline hits.
    fn drain_tls<T: Transport>(&self, client: &mut TlsClient<T>) -> Result<Vec<u8>, FetchError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut out = Vec::new();
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            match client.read(left.min(Duration::from_millis(500))) {
                Ok(chunk) => out.extend_from_slice(&chunk),
                Err(TlsError::Closed) => break,
                Err(TlsError::Timeout) => {
                    // Keep waiting until the overall deadline.
                    if out.is_empty() {
                        continue;
                    }
                    // Got a response and the server went quiet; with
                    // Connection: close this is as done as it gets.
                    if crate::http::parse_response(&out).is_some() {
                        break;
                    }
                }
                Err(e) => {
                    if out.is_empty() {
                        return Err(FetchError::ConnectionFailed(e.to_string()));
                    }
                    warn!(error = %e, "connection dropped mid-body");
                    break;
                }
            }
        }
        Ok(out)
    }

    fn drain_tcp(&self, transport: &mut TcpTransport) -> Result<Vec<u8>, FetchError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut out = Vec::new();
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            match transport.recv(left.as_millis().min(500) as u64) {
                Ok(Some(chunk)) => out.extend_from_slice(&chunk),
                Ok(None) => {
                    if !out.is_empty() && crate::http::parse_response(&out).is_some() {
                        break;
                    }
                }
                Err(TlsError::Closed) => break,
                Err(e) => {
                    if out.is_empty() {
                        return Err(FetchError::ConnectionFailed(e.to_string()));
                    }
                    break;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a fresh port.
    fn one_shot_server(response: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((mut sock, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = sock.read(&mut buf);
                let _ = sock.write_all(response.as_bytes());
            }
        });
        port
    }

    fn get(port: u16, path: &str) -> Result<FetchResponse, FetchError> {
        let url = Url::parse(&format!("http://127.0.0.1:{port}{path}")).unwrap();
        let service = NetService {
            read_timeout: Duration::from_secs(2),
            ..NetService::new()
        };
        service.fetch(FetchRequest::get(url), &mut TicketCache::new())
    }

    #[test]
    fn plain_http_get() {
        let port = one_shot_server(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 2\r\n\r\nok",
        );
        let r = get(port, "/").unwrap();
        assert_eq!(r.status, 200);
        assert_eq!(r.body, b"ok");
        assert_eq!(r.content_type(), Some("text/html"));
    }

    #[test]
    fn http_error_status_still_returns_body() {
        let port = one_shot_server("HTTP/1.1 500 Oops\r\nContent-Length: 4\r\n\r\nboom");
        let r = get(port, "/").unwrap();
        assert_eq!(r.status, 500);
        assert_eq!(r.body, b"boom");
    }

    #[test]
    fn redirect_followed_and_final_url_reported() {
        // Second server is the redirect target.
        let target = one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nfinal");
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((mut sock, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = sock.read(&mut buf);
                let resp = format!(
                    "HTTP/1.1 302 Found\r\nLocation: http://127.0.0.1:{target}/done\r\n\r\n"
                );
                let _ = sock.write_all(resp.as_bytes());
            }
        });

        let r = get(port, "/start").unwrap();
        assert_eq!(r.status, 200);
        assert_eq!(r.body, b"final");
        assert_eq!(r.final_url.path, "/done");
    }

    #[test]
    fn opaque_urls_rejected() {
        let service = NetService::new();
        let err = service
            .fetch(
                FetchRequest::get(Url::parse("about:blank").unwrap()),
                &mut TicketCache::new(),
            )
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFetchable));
    }

    #[test]
    fn connect_failure_is_single_reason() {
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let service = NetService {
            connect_timeout: Duration::from_millis(200),
            ..NetService::new()
        };
        let err = service
            .fetch(FetchRequest::get(url), &mut TicketCache::new())
            .unwrap_err();
        assert!(matches!(err, FetchError::ConnectionFailed(_)));
    }
}
