//! # URL resolver
//!
//! The URL model the browser core navigates by: `(scheme, host, port, path,
//! raw)`. A URL is either origin-ful (`http`, `https`) or opaque (`about`,
//! `data`, `blob`); only origin-ful URLs ever reach the network stack.
//! `data:` payload decoding (RFC 2397) and the process-wide blob store live
//! here too.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

use common::{b64_decode, percent_decode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,
    #[error("unsupported scheme")]
    UnsupportedScheme,
    #[error("missing host")]
    MissingHost,
    #[error("invalid port")]
    InvalidPort,
}

/// The five schemes the core dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    About,
    Data,
    Blob,
}

impl Scheme {
    fn parse(s: &str) -> Option<Scheme> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            "about" => Some(Scheme::About),
            "data" => Some(Scheme::Data),
            "blob" => Some(Scheme::Blob),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::About => "about",
            Scheme::Data => "data",
            Scheme::Blob => "blob",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
            _ => 0,
        }
    }
}

/// A parsed URL.
///
/// For opaque schemes `host` is empty, `port` is zero, and `path` holds the
/// entire scheme-specific part. For origin-ful schemes `path` includes the
/// query (it is the HTTP request target); the fragment survives only in
/// `raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub raw: String,
}

impl Url {
    pub fn parse(input: &str) -> Result<Url, UrlError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UrlError::Empty);
        }

        let (scheme_str, rest) = input.split_once(':').ok_or(UrlError::UnsupportedScheme)?;
        let scheme = Scheme::parse(scheme_str).ok_or(UrlError::UnsupportedScheme)?;

        match scheme {
            Scheme::About | Scheme::Data | Scheme::Blob => Ok(Url {
                scheme,
                host: String::new(),
                port: 0,
                path: rest.to_string(),
                raw: input.to_string(),
            }),
            Scheme::Http | Scheme::Https => {
                let rest = rest.strip_prefix("//").ok_or(UrlError::MissingHost)?;
                let (authority, path_and_more) = match rest.find(['/', '?', '#']) {
                    Some(i) => (&rest[..i], &rest[i..]),
                    None => (rest, ""),
                };
                if authority.is_empty() {
                    return Err(UrlError::MissingHost);
                }

                let (host, port) = match authority.rsplit_once(':') {
                    Some((h, p)) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => {
                        (h, p.parse().map_err(|_| UrlError::InvalidPort)?)
                    }
                    Some((h, "")) => (h, scheme.default_port()),
                    Some(_) => return Err(UrlError::InvalidPort),
                    None => (authority, scheme.default_port()),
                };

                // Path keeps the query, drops the fragment.
                let (without_fragment, fragment) = match path_and_more.split_once('#') {
                    Some((before, frag)) => (before, Some(frag)),
                    None => (path_and_more, None),
                };
                let path = if without_fragment.is_empty() {
                    "/".to_string()
                } else if without_fragment.starts_with('?') {
                    format!("/{without_fragment}")
                } else {
                    let (p, q) = match without_fragment.split_once('?') {
                        Some((p, q)) => (p, Some(q)),
                        None => (without_fragment, None),
                    };
                    let mut path = normalize_path(p);
                    if let Some(q) = q {
                        path.push('?');
                        path.push_str(q);
                    }
                    path
                };

                // Canonical serialization, so a joined `a/../b` reads clean.
                let host = host.to_ascii_lowercase();
                let mut raw = format!("{}://{}", scheme.as_str(), host);
                if port != scheme.default_port() {
                    raw.push(':');
                    raw.push_str(&port.to_string());
                }
                raw.push_str(&path);
                if let Some(frag) = fragment {
                    raw.push('#');
                    raw.push_str(frag);
                }

                Ok(Url {
                    scheme,
                    host,
                    port,
                    path,
                    raw,
                })
            }
        }
    }

    /// Origin-ful URLs may be fetched; opaque ones are resolved locally.
    pub fn has_origin(&self) -> bool {
        matches!(self.scheme, Scheme::Http | Scheme::Https)
    }

    pub fn is_opaque(&self) -> bool {
        !self.has_origin()
    }

    /// `scheme://host[:port]`, omitting a default port.
    pub fn origin(&self) -> String {
        if self.port == self.scheme.default_port() {
            format!("{}://{}", self.scheme.as_str(), self.host)
        } else {
            format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port)
        }
    }

    /// Path without the query, for display purposes.
    pub fn path_only(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }

    /// Resolve `href` against this URL.
    pub fn join(&self, href: &str) -> Result<Url, UrlError> {
        let href = href.trim();
        if href.is_empty() {
            return Ok(self.clone());
        }

        // Absolute (any known scheme).
        if let Some((scheme, _)) = href.split_once(':') {
            if Scheme::parse(scheme).is_some() {
                return Url::parse(href);
            }
        }

        if self.is_opaque() {
            // Nothing sensible to be relative to.
            return Url::parse(href);
        }

        // Protocol-relative.
        if let Some(rest) = href.strip_prefix("//") {
            return Url::parse(&format!("{}://{}", self.scheme.as_str(), rest));
        }

        // Fragment-only: same document.
        if href.starts_with('#') {
            return Url::parse(&format!("{}{}", self.strip_fragment(), href));
        }

        // Query-only: same path.
        if let Some(query) = href.strip_prefix('?') {
            return Url::parse(&format!(
                "{}{}?{}",
                self.origin(),
                self.path_only(),
                query
            ));
        }

        // Rooted path.
        if href.starts_with('/') {
            return Url::parse(&format!("{}{}", self.origin(), href));
        }

        // Relative path: splice onto the base directory.
        let base_dir = match self.path_only().rfind('/') {
            Some(i) => &self.path_only()[..=i],
            None => "/",
        };
        Url::parse(&format!("{}{}{}", self.origin(), base_dir, href))
    }

    fn strip_fragment(&self) -> &str {
        match self.raw.split_once('#') {
            Some((before, _)) => before,
            None => &self.raw,
        }
    }

    /// Decode a `data:` URL payload per RFC 2397. `None` for other schemes.
    pub fn data_payload(&self) -> Option<DataPayload> {
        if self.scheme != Scheme::Data {
            return None;
        }
        let (meta, body) = self.path.split_once(',')?;

        let (media_type, is_base64) = match meta.strip_suffix(";base64") {
            Some(mt) => (mt, true),
            None => (meta, false),
        };
        let media_type = if media_type.is_empty() {
            "text/plain".to_string()
        } else {
            media_type.to_string()
        };

        let body = if is_base64 {
            b64_decode(body)?
        } else {
            percent_decode(body).into_bytes()
        };

        Some(DataPayload { media_type, body })
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Decoded `data:` URL contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPayload {
    pub media_type: String,
    pub body: Vec<u8>,
}

/// Collapse `.` and `..` segments. The path always starts with `/`.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = String::from("/");
    out.push_str(&segments.join("/"));
    if path.ends_with('/') && out.len() > 1 {
        out.push('/');
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Blob store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide mapping `blob-id → (media-type, bytes)`. Owned by the
/// controller's `Context`, never an ambient global.
#[derive(Default)]
pub struct BlobStore {
    entries: HashMap<String, (String, Vec<u8>)>,
    next_id: u64,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes, returning a fresh `blob:` URL.
    pub fn insert(&mut self, media_type: &str, bytes: Vec<u8>) -> String {
        let id = format!("b{:08x}", self.next_id);
        self.next_id += 1;
        self.entries.insert(id.clone(), (media_type.to_string(), bytes));
        format!("blob:{id}")
    }

    /// Look up by blob id or full `blob:` URL.
    pub fn get(&self, key: &str) -> Option<&(String, Vec<u8>)> {
        let id = key.strip_prefix("blob:").unwrap_or(key);
        self.entries.get(id)
    }

    pub fn revoke(&mut self, key: &str) {
        let id = key.strip_prefix("blob:").unwrap_or(key);
        self.entries.remove(id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_https() {
        let u = Url::parse("https://example.com/path?q=1#frag").unwrap();
        assert_eq!(u.scheme, Scheme::Https);
        assert_eq!(u.host, "example.com");
        assert_eq!(u.port, 443);
        assert_eq!(u.path, "/path?q=1");
        assert_eq!(u.path_only(), "/path");
        assert!(u.has_origin());
    }

    #[test]
    fn parse_explicit_port() {
        let u = Url::parse("http://localhost:8080/").unwrap();
        assert_eq!(u.port, 8080);
        assert_eq!(u.origin(), "http://localhost:8080");
    }

    #[test]
    fn parse_bare_host() {
        let u = Url::parse("http://example.com").unwrap();
        assert_eq!(u.path, "/");
        assert_eq!(u.origin(), "http://example.com");
    }

    #[test]
    fn parse_rejects_unknown_scheme() {
        assert_eq!(Url::parse("ftp://x/"), Err(UrlError::UnsupportedScheme));
        assert_eq!(Url::parse("nonsense"), Err(UrlError::UnsupportedScheme));
    }

    #[test]
    fn host_is_lowercased() {
        let u = Url::parse("https://EXAMPLE.com/X").unwrap();
        assert_eq!(u.host, "example.com");
        assert_eq!(u.path, "/X"); // path case is preserved
    }

    #[test]
    fn opaque_schemes() {
        let u = Url::parse("about:blank").unwrap();
        assert!(u.is_opaque());
        assert_eq!(u.path, "blank");

        let u = Url::parse("data:text/html,<p>x</p>").unwrap();
        assert!(u.is_opaque());

        let u = Url::parse("blob:b0000002a").unwrap();
        assert_eq!(u.scheme, Scheme::Blob);
    }

    // Relative-reference resolution cases.
    #[test]
    fn join_parent_directory() {
        let base = Url::parse("https://a.example/x/y").unwrap();
        let u = base.join("../z").unwrap();
        assert_eq!(u.raw, "https://a.example/z");
    }

    #[test]
    fn join_protocol_relative() {
        let base = Url::parse("https://a.example/x/y").unwrap();
        let u = base.join("//b.example/q").unwrap();
        assert_eq!(u.scheme, Scheme::Https);
        assert_eq!(u.host, "b.example");
        assert_eq!(u.path, "/q");
    }

    #[test]
    fn join_fragment_only() {
        let base = Url::parse("https://a.example/x/y").unwrap();
        let u = base.join("#top").unwrap();
        assert_eq!(u.raw, "https://a.example/x/y#top");
        assert_eq!(u.path, "/x/y");
    }

    #[test]
    fn join_rooted_and_relative() {
        let base = Url::parse("https://a.example/x/y").unwrap();
        assert_eq!(base.join("/q").unwrap().path, "/q");
        assert_eq!(base.join("z").unwrap().path, "/x/z");
        assert_eq!(base.join("w/v").unwrap().path, "/x/w/v");
    }

    #[test]
    fn join_absolute_replaces_base() {
        let base = Url::parse("https://a.example/x").unwrap();
        let u = base.join("http://c.example/d").unwrap();
        assert_eq!(u.scheme, Scheme::Http);
        assert_eq!(u.host, "c.example");
    }

    #[test]
    fn join_query_only() {
        let base = Url::parse("https://a.example/s?old=1").unwrap();
        let u = base.join("?q=2").unwrap();
        assert_eq!(u.path, "/s?q=2");
    }

    #[test]
    fn dotdot_does_not_escape_root() {
        let base = Url::parse("https://a.example/x").unwrap();
        let u = base.join("../../../z").unwrap();
        assert_eq!(u.path, "/z");
    }

    #[test]
    fn data_url_percent_encoded() {
        let u = Url::parse("data:text/html,%3Cb%3Ehi%3C%2Fb%3E").unwrap();
        let p = u.data_payload().unwrap();
        assert_eq!(p.media_type, "text/html");
        assert_eq!(p.body, b"<b>hi</b>");
    }

    #[test]
    fn data_url_base64() {
        let u = Url::parse("data:text/plain;base64,aGVsbG8=").unwrap();
        let p = u.data_payload().unwrap();
        assert_eq!(p.body, b"hello");
    }

    #[test]
    fn data_url_default_media_type() {
        let u = Url::parse("data:,plain%20text").unwrap();
        let p = u.data_payload().unwrap();
        assert_eq!(p.media_type, "text/plain");
        assert_eq!(p.body, b"plain text");
    }

    #[test]
    fn blob_store_roundtrip() {
        let mut store = BlobStore::new();
        let url = store.insert("image/png", vec![1, 2, 3]);
        assert!(url.starts_with("blob:"));

        let (mt, bytes) = store.get(&url).unwrap();
        assert_eq!(mt, "image/png");
        assert_eq!(bytes, &vec![1, 2, 3]);

        store.revoke(&url);
        assert!(store.get(&url).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn blob_ids_are_unique() {
        let mut store = BlobStore::new();
        let a = store.insert("a/b", vec![]);
        let b = store.insert("a/b", vec![]);
        assert_ne!(a, b);
    }
}
