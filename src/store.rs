//! The dynamic configuration store that holds scoped DNS entries.
//!
//! Each entry lives under `State:/Network/Service/<id>/DNS` and carries a
//! [`DnsRecord`]. The system resolver picks up a new or removed entry once
//! its key has been notified.

use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Regex matching every per-service DNS key.
pub const SERVICE_DNS_PATTERN: &str = "State:/Network/Service/[^/]+/DNS";

/// Field names inside a DNS record.
pub mod fields {
    /// Domains (and reverse zones) routed to the resolvers.
    pub const SUPPLEMENTAL_MATCH_DOMAINS: &str = "SupplementalMatchDomains";
    /// Resolver addresses.
    pub const SERVER_ADDRESSES: &str = "ServerAddresses";
    /// Search suffixes; forward domains only.
    pub const SEARCH_DOMAINS: &str = "SearchDomains";
}

/// Builds the store key for a service identifier.
#[must_use]
pub fn service_dns_key(id: &str) -> String {
    format!("State:/Network/Service/{id}/DNS")
}

/// The value stored under a service DNS key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsRecord {
    /// Forward domains followed by reverse zones.
    pub supplemental_match_domains: Vec<String>,
    /// Resolver IP addresses.
    pub server_addresses: Vec<String>,
    /// Forward domains used as search suffixes.
    pub search_domains: Vec<String>,
}

impl DnsRecord {
    /// Returns `true` if the record shares at least one match domain with
    /// `domains` and at least one resolver with `resolvers`.
    #[must_use]
    pub fn overlaps(&self, domains: &[String], resolvers: &[String]) -> bool {
        intersects(&self.supplemental_match_domains, domains)
            && intersects(&self.server_addresses, resolvers)
    }
}

fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|x| b.contains(x))
}

/// Key/value access to the configuration store.
pub trait DnsStore {
    /// Lists keys matching the regex `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    fn list_keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Reads the record under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried or the value is
    /// not a DNS record.
    fn get(&self, key: &str) -> Result<Option<DnsRecord>>;

    /// Writes `record` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn set(&self, key: &str, record: &DnsRecord) -> Result<()>;

    /// Deletes `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the removal.
    fn remove(&self, key: &str) -> Result<()>;

    /// Tells observers that `key` changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification cannot be posted.
    fn notify(&self, key: &str) -> Result<()>;
}

/// In-process store, used by tests and dry runs.
///
/// Pattern matching only understands the service DNS shape: a key matches
/// when it starts with `State:/Network/Service/` and ends with `/DNS`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: BTreeMap<String, DnsRecord>,
    notified: Vec<String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys notified so far, oldest first.
    #[must_use]
    pub fn notified(&self) -> Vec<String> {
        self.lock().notified.clone()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Returns `true` if no record is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DnsStore for MemoryStore {
    fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let keys = self
            .lock()
            .records
            .keys()
            .filter(|key| pattern != SERVICE_DNS_PATTERN || is_service_dns_key(key))
            .cloned()
            .collect();
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<DnsRecord>> {
        Ok(self.lock().records.get(key).cloned())
    }

    fn set(&self, key: &str, record: &DnsRecord) -> Result<()> {
        self.lock().records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().records.remove(key);
        Ok(())
    }

    fn notify(&self, key: &str) -> Result<()> {
        self.lock().notified.push(key.to_string());
        Ok(())
    }
}

fn is_service_dns_key(key: &str) -> bool {
    key.strip_prefix("State:/Network/Service/")
        .and_then(|rest| rest.strip_suffix("/DNS"))
        .is_some_and(|id| !id.is_empty() && !id.contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn service_key_shape() {
        assert_eq!(service_dns_key("ABC"), "State:/Network/Service/ABC/DNS");
        assert!(is_service_dns_key(&service_dns_key("ABC")));
        assert!(!is_service_dns_key("State:/Network/Service//DNS"));
        assert!(!is_service_dns_key("State:/Network/Service/a/b/DNS"));
        assert!(!is_service_dns_key("State:/Network/Global/DNS"));
    }

    #[test]
    fn overlap_needs_both_lists() {
        let record = DnsRecord {
            supplemental_match_domains: strings(&["a.test", "10.in-addr.arpa"]),
            server_addresses: strings(&["10.0.0.1", "10.0.0.2"]),
            search_domains: strings(&["a.test"]),
        };
        assert!(record.overlaps(&strings(&["10.in-addr.arpa"]), &strings(&["10.0.0.2"])));
        assert!(!record.overlaps(&strings(&["b.test"]), &strings(&["10.0.0.2"])));
        assert!(!record.overlaps(&strings(&["a.test"]), &strings(&["1.1.1.1"])));
        assert!(!record.overlaps(&[], &[]));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let key = service_dns_key("one");
        let record = DnsRecord {
            supplemental_match_domains: strings(&["a.test"]),
            server_addresses: strings(&["10.0.0.1"]),
            search_domains: strings(&["a.test"]),
        };

        store.set(&key, &record).unwrap();
        store.set("State:/Network/Global/DNS", &DnsRecord::default()).unwrap();
        store.notify(&key).unwrap();

        assert_eq!(store.list_keys(SERVICE_DNS_PATTERN).unwrap(), vec![key.clone()]);
        assert_eq!(store.get(&key).unwrap(), Some(record));
        assert_eq!(store.notified(), vec![key.clone()]);
        assert_eq!(store.len(), 2);

        store.remove(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
        assert!(store.list_keys(SERVICE_DNS_PATTERN).unwrap().is_empty());
    }
}
