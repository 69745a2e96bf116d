//! HTTP/1.1 wire format.
//!
//! Requests are emitted with `Connection: close`, so a response is simply
//! everything the peer sends before closing; the parser then cuts it into
//! status line, headers and body, undoing chunked transfer coding when
//! present.

use url_parser::Url;

/// A parsed HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.location().is_some()
    }
}

/// Serialize a request for `url` with the given method, extra headers and
/// optional body.
pub fn build_request(
    method: &str,
    url: &Url,
    user_agent: &str,
    extra_headers: &[(String, String)],
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(method);
    out.push(' ');
    out.push_str(&url.path);
    out.push_str(" HTTP/1.1\r\n");

    if url.port == url.scheme.default_port() {
        out.push_str(&format!("Host: {}\r\n", url.host));
    } else {
        out.push_str(&format!("Host: {}:{}\r\n", url.host, url.port));
    }
    out.push_str(&format!("User-Agent: {user_agent}\r\n"));
    out.push_str("Accept: */*\r\n");
    out.push_str("Connection: close\r\n");
    for (k, v) in extra_headers {
        out.push_str(&format!("{k}: {v}\r\n"));
    }
    if let Some(body) = body {
        out.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    out.push_str("\r\n");

    let mut bytes = out.into_bytes();
    if let Some(body) = body {
        bytes.extend_from_slice(body);
    }
    bytes
}

/// Parse a complete response buffer. `None` when the head is not even
/// complete.
pub fn parse_response(raw: &[u8]) -> Option<HttpResponse> {
    let head_end = find_head_end(raw)?;
    let head = std::str::from_utf8(&raw[..head_end]).ok()?;
    let mut lines = head.split("\r\n");

    // Status line: HTTP/1.1 200 OK
    let status_line = lines.next()?;
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next()?;
    let status: u16 = parts.next()?.parse().ok()?;
    let reason = parts.next().unwrap_or("").to_string();

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let raw_body = &raw[head_end + 4..];
    let response = HttpResponse {
        status,
        reason,
        headers,
        body: Vec::new(),
    };

    let body = if response
        .header("transfer-encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    {
        dechunk(raw_body)
    } else if let Some(len) = response
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
    {
        raw_body[..len.min(raw_body.len())].to_vec()
    } else {
        raw_body.to_vec()
    };

    Some(HttpResponse { body, ..response })
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Undo chunked transfer coding. Salvages what parses; a malformed tail is
/// dropped.
fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let Some(line_end) = raw.windows(2).position(|w| w == b"\r\n") else {
            break;
        };
        let size_line = std::str::from_utf8(&raw[..line_end]).unwrap_or("");
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let Ok(size) = usize::from_str_radix(size_hex, 16) else {
            break;
        };
        if size == 0 {
            break;
        }
        let data_start = line_end + 2;
        if raw.len() < data_start + size {
            // Truncated chunk: keep what arrived.
            out.extend_from_slice(&raw[data_start..]);
            break;
        }
        out.extend_from_slice(&raw[data_start..data_start + size]);
        // Skip data and trailing CRLF.
        raw = raw.get(data_start + size + 2..).unwrap_or(&[]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn request_shape() {
        let req = build_request("GET", &url("http://h/path?q=1"), "tern/0.1", &[], None);
        let text = String::from_utf8(req).unwrap();
        assert!(text.starts_with("GET /path?q=1 HTTP/1.1\r\n"));
        assert!(text.contains("Host: h\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn request_with_port_and_body() {
        let req = build_request(
            "POST",
            &url("http://h:8080/s"),
            "tern/0.1",
            &[("Content-Type".into(), "application/x-www-form-urlencoded".into())],
            Some(b"q=a+b"),
        );
        let text = String::from_utf8(req).unwrap();
        assert!(text.contains("Host: h:8080\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nq=a+b"));
    }

    #[test]
    fn response_with_content_length() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\n\r\nhellotrailing-garbage";
        let r = parse_response(raw).unwrap();
        assert_eq!(r.status, 200);
        assert_eq!(r.reason, "OK");
        assert_eq!(r.content_type(), Some("text/html"));
        assert_eq!(r.body, b"hello");
    }

    #[test]
    fn response_without_length_reads_to_end() {
        let raw = b"HTTP/1.1 404 Not Found\r\n\r\nmissing";
        let r = parse_response(raw).unwrap();
        assert_eq!(r.status, 404);
        assert_eq!(r.body, b"missing");
    }

    #[test]
    fn response_chunked() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        let r = parse_response(raw).unwrap();
        assert_eq!(r.body, b"hello world");
    }

    #[test]
    fn chunked_with_extension_and_truncation() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5;ext=1\r\nhello\r\nA\r\ncut";
        let r = parse_response(raw).unwrap();
        assert_eq!(r.body, b"hellocut");
    }

    #[test]
    fn header_lookup_case_insensitive() {
        let raw = b"HTTP/1.1 301 Moved\r\nLOCATION: /next\r\n\r\n";
        let r = parse_response(raw).unwrap();
        assert_eq!(r.location(), Some("/next"));
        assert!(r.is_redirect());
    }

    #[test]
    fn incomplete_head_is_none() {
        assert!(parse_response(b"HTTP/1.1 200 OK\r\nContent-").is_none());
    }

    #[test]
    fn garbage_status_is_none() {
        assert!(parse_response(b"not-http\r\n\r\n").is_none());
    }
}
