//! Per-host session-ticket cache.
//!
//! Tickets harvested from NewSessionTicket messages are stored per hostname
//! and expire when `now - stored_at > lifetime`. Storage is the only
//! observable effect: this client does not implement the PSK 0-RTT send
//! path, so the cache exists to be consulted and aged.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::suites::CipherSuite;

/// One stored ticket with everything a future abbreviated handshake needs.
#[derive(Clone)]
pub struct StoredTicket {
    pub ticket: Vec<u8>,
    pub resumption_secret: [u8; 32],
    pub lifetime: Duration,
    pub age_add: u32,
    pub stored_at: Instant,
    pub cipher_suite: CipherSuite,
}

impl StoredTicket {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.lifetime
    }
}

/// Hostname → latest ticket. A new ticket for a host replaces the old one.
#[derive(Default)]
pub struct TicketCache {
    entries: HashMap<String, StoredTicket>,
}

impl TicketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, host: &str, ticket: StoredTicket) {
        self.entries.insert(host.to_string(), ticket);
    }

    /// Fetch the ticket for `host`, dropping it if it has expired.
    pub fn get(&mut self, host: &str) -> Option<&StoredTicket> {
        let now = Instant::now();
        if let Some(t) = self.entries.get(host) {
            if t.is_expired(now) {
                self.entries.remove(host);
                return None;
            }
        }
        self.entries.get(host)
    }

    pub fn remove(&mut self, host: &str) {
        self.entries.remove(host);
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

    fn ticket(lifetime_secs: u64) -> StoredTicket {
        StoredTicket {
            ticket: vec![1, 2, 3],
            resumption_secret: [7; 32],
            lifetime: Duration::from_secs(lifetime_secs),
            age_add: 42,
            stored_at: Instant::now(),
            cipher_suite: CipherSuite::Aes128GcmSha256,
        }
    }

    #[test]
    fn store_and_get() {
        let mut cache = TicketCache::new();
        cache.store("example.com", ticket(3600));
        assert!(cache.get("example.com").is_some());
        assert!(cache.get("other.example").is_none());
    }

    #[test]
    fn newer_ticket_replaces() {
        let mut cache = TicketCache::new();
        cache.store("h", ticket(3600));
        let mut t2 = ticket(3600);
        t2.ticket = vec![9];
        cache.store("h", t2);
        assert_eq!(cache.get("h").unwrap().ticket, vec![9]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_ticket_is_dropped() {
        let mut cache = TicketCache::new();
        let mut t = ticket(10);
        t.stored_at = Instant::now() - Duration::from_secs(11);
        cache.store("h", t);
        assert!(cache.get("h").is_none());
        assert!(cache.is_empty());
    }
}
