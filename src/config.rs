//! Scoped DNS entry configuration.

use crate::domains::DomainSet;
use crate::error::{Result, ScopedDnsError};
use crate::store::DnsRecord;
use crate::util::split_list;

/// Domains and resolvers for one scoped DNS entry.
///
/// # Example
///
/// ```
/// use scoped_dns::ScopedDnsConfig;
///
/// let config = ScopedDnsConfig::from_command_line("corp.test", Some("10.0.0.0/8"), "10.0.0.1, 10.0.0.2");
///
/// assert_eq!(config.domains.forward, vec!["corp.test"]);
/// assert_eq!(config.resolvers, vec!["10.0.0.1", "10.0.0.2"]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopedDnsConfig {
    /// Forward domains and reverse zones routed to the resolvers.
    pub domains: DomainSet,

    /// Resolver IP addresses.
    pub resolvers: Vec<String>,
}

impl ScopedDnsConfig {
    /// Creates a config with no resolvers.
    #[must_use]
    pub const fn new(domains: DomainSet) -> Self {
        Self {
            domains,
            resolvers: Vec::new(),
        }
    }

    /// Builds a config from the comma-separated `--domains`, `--cidrs` and
    /// `--resolvers` arguments.
    #[must_use]
    pub fn from_command_line(domains: &str, cidrs: Option<&str>, resolvers: &str) -> Self {
        Self {
            domains: DomainSet::from_command_line(domains, cidrs),
            resolvers: split_list(resolvers).map(str::to_string).collect(),
        }
    }

    /// Appends a resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.resolvers.push(resolver.into());
        self
    }

    /// Checks that there is something to route and somewhere to route it.
    ///
    /// # Errors
    ///
    /// Returns [`ScopedDnsError::InvalidConfig`] if the domain set or the
    /// resolver list is empty.
    pub fn validate(&self) -> Result<()> {
        if self.domains.is_empty() {
            return Err(ScopedDnsError::InvalidConfig("no domains given".into()));
        }
        if self.resolvers.is_empty() {
            return Err(ScopedDnsError::InvalidConfig("no resolvers given".into()));
        }
        Ok(())
    }

    /// The record written to the store for this entry.
    #[must_use]
    pub fn record(&self) -> DnsRecord {
        DnsRecord {
            supplemental_match_domains: self.domains.all(),
            server_addresses: self.resolvers.clone(),
            search_domains: self.domains.forward.clone(),
        }
    }
}

/// How much the command-line tool reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Nothing.
    Quiet,
    /// One line per action.
    #[default]
    Normal,
    /// Full domain and resolver details.
    Verbose,
}

impl Verbosity {
    /// Picks the level from the `--quiet` and `--verbose` flags; quiet wins.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Default log filter directive for this level.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "off",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout() {
        let config = ScopedDnsConfig::from_command_line(".a.test,b.test", Some("192.168.1.0/24"), "10.0.0.1");
        let record = config.record();
        assert_eq!(
            record.supplemental_match_domains,
            vec!["a.test", "b.test", "1.168.192.in-addr.arpa"]
        );
        assert_eq!(record.server_addresses, vec!["10.0.0.1"]);
        assert_eq!(record.search_domains, vec!["a.test", "b.test"]);
    }

    #[test]
    fn with_resolver_appends() {
        let config = ScopedDnsConfig::new(DomainSet::build(["a.test"], Vec::<&str>::new()))
            .with_resolver("10.0.0.1")
            .with_resolver("10.0.0.2");
        assert_eq!(config.resolvers, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn validate_requires_domains_and_resolvers() {
        assert!(ScopedDnsConfig::from_command_line("", None, "10.0.0.1").validate().is_err());
        assert!(ScopedDnsConfig::from_command_line("a.test", None, " , ").validate().is_err());
        assert!(ScopedDnsConfig::from_command_line("", Some("10.0.0.0/8"), "10.0.0.1").validate().is_ok());
    }

    #[test]
    fn verbosity_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert!(Verbosity::Quiet < Verbosity::Normal && Verbosity::Normal < Verbosity::Verbose);
        assert_eq!(Verbosity::Verbose.filter_directive(), "debug");
    }
}
