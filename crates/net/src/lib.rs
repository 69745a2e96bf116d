//! # Network service
//!
//! The fetch collaborator: TCP transport, HTTP/1.1 request emit and
//! response parse, TLS for `https`, and automatic redirect following. The
//! controller sees `{status, headers, body, final_url}` or exactly one
//! fatal reason.

#![forbid(unsafe_code)]

pub mod fetch;
pub mod http;
pub mod transport;

use thiserror::Error;

pub use fetch::{FetchRequest, FetchResponse, NetService};
pub use http::HttpResponse;
pub use transport::TcpTransport;

/// Why a fetch failed. The controller renders a synthesized error page
/// from the single reason string.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS or transport failure — one fatal reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// More than the redirect cap.
    #[error("too many redirects")]
    TooManyRedirects,
    /// The URL has no origin; it must be resolved locally, not fetched.
    #[error("URL is not fetchable")]
    NotFetchable,
}
