//! Process-wide shared state.
//!
//! The blob store, the TLS session-ticket cache and the redirect-depth
//! counter are singletons in principle, but they are carried explicitly in
//! a `Context` handed to the controller, so tests and multi-process
//! embeddings stay sound. The single-threaded reactor serializes all
//! mutation.

use tls::TicketCache;
use url_parser::BlobStore;

pub struct Context {
    pub blobs: BlobStore,
    pub tickets: TicketCache,
    /// Depth guard for navigations triggered while another navigation is
    /// being resolved (script-driven loops).
    pub nav_depth: u32,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            blobs: BlobStore::new(),
            tickets: TicketCache::new(),
            nav_depth: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_owns_its_stores() {
        let mut ctx = Context::new();
        let url = ctx.blobs.insert("text/plain", b"x".to_vec());
        assert!(ctx.blobs.get(&url).is_some());
        assert!(ctx.tickets.is_empty());
        assert_eq!(ctx.nav_depth, 0);
    }
}
