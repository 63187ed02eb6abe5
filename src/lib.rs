//! # scoped-dns
//!
//! Route DNS queries for chosen domains and IPv4 ranges to specific
//! resolvers through macOS scoped DNS entries.
//!
//! A scoped entry is a record under `State:/Network/Service/<id>/DNS` in
//! the system configuration store. Its `SupplementalMatchDomains` list
//! decides which queries go to its `ServerAddresses`. Forward domains are
//! listed as-is; IPv4 ranges are listed as the `in-addr.arpa` zones that
//! cover them, so reverse lookups for those addresses follow the same
//! resolvers.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use scoped_dns::{ScopedDnsConfig, ScopedDnsManager};
//!
//! let manager = ScopedDnsManager::system();
//! let config = ScopedDnsConfig::from_command_line(
//!     "corp.example",
//!     Some("10.0.0.0/8,192.168.1.128/25"),
//!     "10.0.0.53",
//! );
//!
//! // Requires root.
//! manager.add(&config)?;
//! println!("routing {}", config.domains); // corp.example, 10.0.0.0/8, 192.168.1.128/25
//!
//! manager.remove(&config)?;
//! ```
//!
//! ## Reverse zones
//!
//! Reverse delegation works per octet, so a `/25` becomes 128 zones:
//!
//! ```
//! use scoped_dns::{CidrBlock, coalesce};
//!
//! let zones = CidrBlock::parse("192.168.1.128/25").unwrap().reverse_zones();
//! assert_eq!(zones.len(), 128);
//! assert_eq!(zones[0], "128.1.168.192.in-addr.arpa");
//! assert_eq!(coalesce(&zones), "192.168.1.128/25");
//! ```
//!
//! ## Verification
//!
//! Changes take effect as soon as the key is notified. Verify with:
//!
//! ```bash
//! scutil --dns              # scoped entries appear as extra resolvers
//! dscacheutil -q host -a name host.corp.example
//! ```
//!
//! ## Permissions
//!
//! Writing to the dynamic store requires root. Entries are not persisted
//! and vanish on reboot.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cidr;
pub mod coalesce;
pub mod config;
pub mod domains;
pub mod error;
pub mod manager;
pub mod scutil;
pub mod store;
pub mod util;

pub use cidr::CidrBlock;
pub use coalesce::{MergePolicy, coalesce, coalesce_with};
pub use config::{ScopedDnsConfig, Verbosity};
pub use domains::DomainSet;
pub use error::{Result, ScopedDnsError};
pub use manager::{AddOutcome, ScopedDnsManager, ScopedEntry};
pub use scutil::ScutilStore;
pub use store::{DnsRecord, DnsStore, MemoryStore, SERVICE_DNS_PATTERN, service_dns_key};
