//! Forward domains plus the reverse zones derived from CIDR blocks.

use crate::cidr::CidrBlock;
use crate::coalesce::coalesce;
use crate::util::split_list;
use std::fmt;

/// Ordered forward domains and reverse zones handed to the store.
///
/// Duplicates are preserved in both lists.
///
/// # Example
///
/// ```
/// use scoped_dns::DomainSet;
///
/// let set = DomainSet::build([".example.com "], ["10.0.0.0/8", "bogus"]);
/// assert_eq!(set.forward, vec!["example.com"]);
/// assert_eq!(set.reverse, vec!["10.in-addr.arpa"]);
/// assert_eq!(set.to_string(), "example.com, 10.0.0.0/8");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSet {
    /// Forward domains, normalized.
    pub forward: Vec<String>,

    /// Reverse zones, in CIDR input order.
    pub reverse: Vec<String>,
}

impl DomainSet {
    /// Builds a set from forward domain texts and CIDR texts.
    ///
    /// Forward domains are trimmed and lose one leading `.`. CIDR texts that
    /// fail to parse are logged and skipped; the rest are expanded and
    /// concatenated in order.
    pub fn build<F, C>(forward_texts: F, cidr_texts: C) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let forward = forward_texts
            .into_iter()
            .map(|d| normalize_domain(d.as_ref()))
            .collect();

        let reverse = cidr_texts
            .into_iter()
            .filter_map(|text| {
                let text = text.as_ref().trim();
                CidrBlock::parse(text)
                    .inspect_err(|e| tracing::warn!(cidr = %text, error = %e, "Ignoring invalid CIDR"))
                    .ok()
            })
            .flat_map(|block| block.reverse_zones())
            .collect();

        Self { forward, reverse }
    }

    /// Builds a set from the comma-separated `--domains` and `--cidrs`
    /// arguments. Empty list entries are skipped.
    #[must_use]
    pub fn from_command_line(domains: &str, cidrs: Option<&str>) -> Self {
        Self::build(split_list(domains), cidrs.into_iter().flat_map(split_list))
    }

    /// Forward domains followed by reverse zones.
    #[must_use]
    pub fn all(&self) -> Vec<String> {
        self.forward.iter().chain(&self.reverse).cloned().collect()
    }

    /// Total number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len() + self.reverse.len()
    }

    /// Returns `true` if neither list holds a name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.reverse.is_empty()
    }
}

impl fmt::Display for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&coalesce(&self.all()))
    }
}

fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    domain.strip_prefix('.').unwrap_or(domain).to_string()
}
