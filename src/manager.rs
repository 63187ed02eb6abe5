//! Adding and removing scoped DNS entries.
//!
//! An existing entry is located by overlap: it matches when it shares at
//! least one match domain and at least one resolver with the requested
//! configuration. Exact set equality is not required.

use crate::coalesce::coalesce;
use crate::config::ScopedDnsConfig;
use crate::error::{Result, ScopedDnsError};
use crate::scutil::ScutilStore;
use crate::store::{DnsRecord, DnsStore, SERVICE_DNS_PATTERN, service_dns_key};
use uuid::Uuid;

/// Result of [`ScopedDnsManager::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// Key the record was written under.
    pub key: String,
    /// `true` if a matching entry was overwritten rather than created.
    pub replaced: bool,
}

/// An entry found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedEntry {
    /// Store key.
    pub key: String,
    /// Stored record.
    pub record: DnsRecord,
}

/// Manages scoped DNS entries in a [`DnsStore`].
///
/// # Lifecycle
///
/// 1. [`add`](Self::add) writes the record and notifies observers; the
///    system resolver starts routing matching queries immediately.
/// 2. [`remove`](Self::remove) deletes the matching record and notifies.
///
/// Entries live only in the dynamic store and disappear on reboot.
///
/// # Example
///
/// ```rust,ignore
/// use scoped_dns::{ScopedDnsConfig, ScopedDnsManager};
///
/// let manager = ScopedDnsManager::system();
/// let config = ScopedDnsConfig::from_command_line("corp.test", Some("10.0.0.0/8"), "10.0.0.1");
/// manager.add(&config)?;
/// // ...
/// manager.remove(&config)?;
/// ```
#[derive(Debug)]
pub struct ScopedDnsManager<S> {
    store: S,
}

impl ScopedDnsManager<ScutilStore> {
    /// Manager for the live system store.
    #[must_use]
    pub fn system() -> Self {
        Self::new(ScutilStore::new())
    }
}

impl<S: DnsStore> ScopedDnsManager<S> {
    /// Wraps a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Finds the first service DNS entry overlapping `config`.
    ///
    /// Entries that cannot be read are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store keys cannot be listed.
    pub fn find_matching(&self, config: &ScopedDnsConfig) -> Result<Option<ScopedEntry>> {
        let domains = config.domains.all();
        for key in self.store.list_keys(SERVICE_DNS_PATTERN)? {
            match self.store.get(&key) {
                Ok(Some(record)) if record.overlaps(&domains, &config.resolvers) => {
                    tracing::debug!(key = %key, "Found matching scoped DNS entry");
                    return Ok(Some(ScopedEntry { key, record }));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping unreadable DNS entry"),
            }
        }
        Ok(None)
    }

    /// Writes the entry for `config` and notifies observers.
    ///
    /// A matching entry is overwritten in place; otherwise a new key with a
    /// random service identifier is created.
    ///
    /// # Errors
    ///
    /// Returns [`ScopedDnsError::InvalidConfig`] for an empty config, or the
    /// store's error if the write or notification fails.
    pub fn add(&self, config: &ScopedDnsConfig) -> Result<AddOutcome> {
        config.validate()?;

        let (key, replaced) = match self.find_matching(config)? {
            Some(entry) => (entry.key, true),
            None => (new_service_key(), false),
        };

        self.store.set(&key, &config.record())?;
        self.store.notify(&key)?;

        tracing::info!(
            key = %key,
            replaced,
            domains = %config.domains,
            resolvers = %config.resolvers.join(", "),
            "Added scoped DNS entry"
        );
        Ok(AddOutcome { key, replaced })
    }

    /// Removes the entry matching `config` and notifies observers.
    ///
    /// # Errors
    ///
    /// Returns [`ScopedDnsError::NoMatchingEntry`] if nothing matches, or the
    /// store's error if the removal or notification fails.
    pub fn remove(&self, config: &ScopedDnsConfig) -> Result<ScopedEntry> {
        config.validate()?;

        let Some(entry) = self.find_matching(config)? else {
            return Err(ScopedDnsError::NoMatchingEntry {
                domains: config.domains.to_string(),
                resolvers: config.resolvers.join(", "),
            });
        };

        self.store.remove(&entry.key)?;
        self.store.notify(&entry.key)?;

        tracing::info!(
            key = %entry.key,
            domains = %coalesce(&entry.record.supplemental_match_domains),
            resolvers = %entry.record.server_addresses.join(", "),
            "Removed scoped DNS entry"
        );
        Ok(entry)
    }
}

fn new_service_key() -> String {
    service_dns_key(&Uuid::new_v4().to_string().to_uppercase())
}
