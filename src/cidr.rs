//! IPv4 CIDR blocks and their `in-addr.arpa` reverse zones.
//!
//! Reverse delegation only exists at octet granularity. A block whose prefix
//! ends on an octet boundary maps to exactly one zone; a block whose prefix
//! ends mid-octet is flattened into one zone per value the partial octet can
//! take.
//!
//! ```
//! use scoped_dns::CidrBlock;
//!
//! let block: CidrBlock = "192.168.1.0/24".parse().unwrap();
//! assert_eq!(block.reverse_zones(), vec!["1.168.192.in-addr.arpa"]);
//!
//! let block: CidrBlock = "10.0.0.0/7".parse().unwrap();
//! assert_eq!(block.reverse_zones(), vec!["10.in-addr.arpa", "11.in-addr.arpa"]);
//! ```

use crate::error::{Result, ScopedDnsError};
use crate::util::split_list;
use std::fmt;
use std::str::FromStr;

/// Root of the IPv4 reverse-lookup namespace.
pub const REVERSE_ROOT: &str = "in-addr.arpa";

/// Suffix carried by every reverse zone below the root.
pub const REVERSE_SUFFIX: &str = ".in-addr.arpa";

/// Longest valid IPv4 prefix.
pub const MAX_PREFIX_LEN: u8 = 32;

/// An IPv4 address plus prefix length.
///
/// The address is kept exactly as given; host bits are not cleared. Only
/// the octets covered by the prefix influence [`reverse_zones`](Self::reverse_zones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrBlock {
    octets: [u8; 4],
    prefix_len: u8,
}

impl CidrBlock {
    /// Creates a block from raw octets.
    ///
    /// # Errors
    ///
    /// Returns [`ScopedDnsError::InvalidCidr`] if `prefix_len` exceeds 32.
    pub fn new(octets: [u8; 4], prefix_len: u8) -> Result<Self> {
        if prefix_len > MAX_PREFIX_LEN {
            return Err(ScopedDnsError::InvalidCidr {
                input: format_block(octets, prefix_len),
                reason: "prefix length out of range",
            });
        }
        Ok(Self { octets, prefix_len })
    }

    /// Parses `a.b.c.d/len`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopedDnsError::InvalidCidr`] when the text does not hold
    /// exactly one `/`, the prefix is not an integer in `0..=32`, or the
    /// address is not four dot-separated integers in `0..=255`.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason| ScopedDnsError::InvalidCidr {
            input: text.to_string(),
            reason,
        };

        let (address, prefix) = text
            .split_once('/')
            .ok_or_else(|| invalid("missing '/' separator"))?;
        if prefix.contains('/') {
            return Err(invalid("more than one '/' separator"));
        }

        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| invalid("prefix length is not a number"))?;
        if prefix_len > MAX_PREFIX_LEN {
            return Err(invalid("prefix length out of range"));
        }

        let parts: Vec<&str> = address.split('.').collect();
        if parts.len() != 4 {
            return Err(invalid("address must have exactly four octets"));
        }
        let mut octets = [0u8; 4];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u16>()
                .map_err(|_| invalid("octet is not a number"))?
                .try_into()
                .map_err(|_| invalid("octet out of range"))?;
        }

        Ok(Self { octets, prefix_len })
    }

    /// Parses a comma-separated list, dropping entries that fail to parse.
    ///
    /// Each dropped entry is logged at `warn`; the remaining entries are
    /// returned in input order.
    #[must_use]
    pub fn parse_list(text: &str) -> Vec<Self> {
        split_list(text)
            .filter_map(|entry| match Self::parse(entry) {
                Ok(block) => Some(block),
                Err(e) => {
                    tracing::warn!(cidr = %entry, error = %e, "Ignoring invalid CIDR");
                    None
                }
            })
            .collect()
    }

    /// Address octets, most significant first.
    #[must_use]
    pub const fn octets(&self) -> [u8; 4] {
        self.octets
    }

    /// Prefix length in bits.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Expands the block into the reverse zones that exactly cover it,
    /// ascending by the varying octet.
    ///
    /// Yields one zone when the prefix is a multiple of 8, otherwise
    /// `2^(8 - prefix_len % 8)` zones. Prefix 0 yields the bare
    /// [`REVERSE_ROOT`].
    #[must_use]
    pub fn reverse_zones(&self) -> Vec<String> {
        let full_octets = usize::from(self.prefix_len / 8);
        let partial_bits = self.prefix_len % 8;

        if partial_bits == 0 {
            if full_octets > self.octets.len() {
                return Vec::new();
            }
            return vec![zone_name(self.pinned_labels(full_octets))];
        }

        let octet_index = full_octets;
        if octet_index >= self.octets.len() {
            return Vec::new();
        }

        let mask = 0xFFu8 << (8 - partial_bits);
        let base = self.octets[octet_index] & mask;
        let range_size = 1u16 << (8 - partial_bits);
        let stable = self.pinned_labels(octet_index);

        (0..range_size)
            .map(|offset| {
                let value = u16::from(base) + offset;
                zone_name(std::iter::once(value.to_string()).chain(stable.iter().cloned()))
            })
            .collect()
    }

    /// Like [`reverse_zones`](Self::reverse_zones), but an empty expansion
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScopedDnsError::EmptyExpansion`] if no zone covers the block.
    pub fn try_reverse_zones(&self) -> Result<Vec<String>> {
        let zones = self.reverse_zones();
        if zones.is_empty() {
            return Err(ScopedDnsError::EmptyExpansion {
                cidr: self.to_string(),
            });
        }
        Ok(zones)
    }

    /// The first `count` octets as labels, least significant first.
    fn pinned_labels(&self, count: usize) -> Vec<String> {
        self.octets[..count]
            .iter()
            .rev()
            .map(u8::to_string)
            .collect()
    }
}

impl FromStr for CidrBlock {
    type Err = ScopedDnsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_block(self.octets, self.prefix_len))
    }
}

fn format_block(octets: [u8; 4], prefix_len: u8) -> String {
    let [a, b, c, d] = octets;
    format!("{a}.{b}.{c}.{d}/{prefix_len}")
}

/// Joins labels under `in-addr.arpa`; no labels gives the root itself.
fn zone_name<I>(labels: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let labels: Vec<String> = labels.into_iter().collect();
    if labels.is_empty() {
        REVERSE_ROOT.to_string()
    } else {
        format!("{}{REVERSE_SUFFIX}", labels.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones(text: &str) -> Vec<String> {
        CidrBlock::parse(text).unwrap().reverse_zones()
    }

    #[test]
    fn parse_accepts_valid_block() {
        let block = CidrBlock::parse("192.168.1.128/25").unwrap();
        assert_eq!(block.octets(), [192, 168, 1, 128]);
        assert_eq!(block.prefix_len(), 25);
        assert_eq!(block.to_string(), "192.168.1.128/25");
    }

    #[test]
    fn parse_keeps_host_bits() {
        let block: CidrBlock = "10.1.2.3/8".parse().unwrap();
        assert_eq!(block.octets(), [10, 1, 2, 3]);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for text in [
            "300.1.1.1/24",
            "10.0.0.1/33",
            "abc/24",
            "10.0.0.1",
            "10.0.0.0/8/8",
            "10.0.0/8",
            "10.0.0.0.0/8",
            "10.0.0.0/x",
            "10.0.0.-1/8",
            "",
        ] {
            let err = CidrBlock::parse(text).unwrap_err();
            assert!(err.is_invalid_cidr(), "{text} should be rejected");
        }
    }

    #[test]
    fn new_rejects_long_prefix() {
        assert!(CidrBlock::new([10, 0, 0, 0], 33).is_err());
        assert!(CidrBlock::new([10, 0, 0, 0], 32).is_ok());
    }

    #[test]
    fn parse_list_drops_invalid_entries() {
        let blocks = CidrBlock::parse_list("10.0.0.0/8, 300.1.1.1/24,abc/24, 192.168.0.0/16,10.0.0.1");
        let rendered: Vec<String> = blocks.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["10.0.0.0/8", "192.168.0.0/16"]);
    }

    #[test]
    fn octet_aligned_prefixes_give_one_zone() {
        assert_eq!(zones("10.0.0.0/8"), vec!["10.in-addr.arpa"]);
        assert_eq!(zones("172.16.0.0/16"), vec!["16.172.in-addr.arpa"]);
        assert_eq!(zones("192.168.1.0/24"), vec!["1.168.192.in-addr.arpa"]);
        assert_eq!(zones("192.168.1.7/32"), vec!["7.1.168.192.in-addr.arpa"]);
    }

    #[test]
    fn prefix_zero_is_whole_space() {
        assert_eq!(zones("0.0.0.0/0"), vec![REVERSE_ROOT]);
    }

    #[test]
    fn partial_octet_is_flattened() {
        let z = zones("192.168.1.128/25");
        assert_eq!(z.len(), 128);
        assert!(z.iter().all(|n| n.ends_with(".1.168.192.in-addr.arpa")));
        assert_eq!(z.first().unwrap(), "128.1.168.192.in-addr.arpa");
        assert_eq!(z.last().unwrap(), "255.1.168.192.in-addr.arpa");
    }

    #[test]
    fn partial_octet_masks_host_bits() {
        assert_eq!(
            zones("10.20.0.0/14"),
            vec![
                "20.10.in-addr.arpa",
                "21.10.in-addr.arpa",
                "22.10.in-addr.arpa",
                "23.10.in-addr.arpa",
            ]
        );
        assert_eq!(zones("10.23.0.0/14"), zones("10.20.0.0/14"));
    }

    #[test]
    fn partial_first_octet_has_no_stable_labels() {
        assert_eq!(zones("10.0.0.0/7"), vec!["10.in-addr.arpa", "11.in-addr.arpa"]);
        assert_eq!(zones("128.0.0.0/1").len(), 128);
        assert_eq!(zones("128.0.0.0/1")[0], "128.in-addr.arpa");
    }

    #[test]
    fn zone_count_follows_prefix() {
        for prefix in 0..=32u8 {
            let block = CidrBlock::new([172, 31, 200, 9], prefix).unwrap();
            let expected = if prefix % 8 == 0 {
                1
            } else {
                1usize << (8 - prefix % 8)
            };
            assert_eq!(block.reverse_zones().len(), expected, "prefix {prefix}");
            assert!(block.try_reverse_zones().is_ok());
        }
    }
}
