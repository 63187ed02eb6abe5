//! Display-only summary of forward domains and reverse zones.
//!
//! Reverse zones are grouped by everything but their leading label and
//! each group is folded back into CIDR notation. The result is meant for
//! log lines, not for parsing.

use crate::cidr::{REVERSE_ROOT, REVERSE_SUFFIX};
use std::collections::{BTreeMap, BTreeSet};

const SEPARATOR: &str = ", ";

/// How a contiguous run of zones in one group is folded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Any contiguous run of two or more values becomes one CIDR whose
    /// prefix drops `floor(log2(count))` bits. Runs that are not a power of
    /// two in size, or not aligned, render a block that does not match the
    /// zones exactly.
    #[default]
    Compatible,

    /// Only runs whose size is a power of two and whose first value is a
    /// multiple of that size are merged; anything else is listed per value.
    Strict,
}

impl MergePolicy {
    const fn allows(self, min: u8, count: usize) -> bool {
        match self {
            Self::Compatible => true,
            Self::Strict => count.is_power_of_two() && (min as usize) % count == 0,
        }
    }
}

/// Renders `domains` compactly with [`MergePolicy::Compatible`].
///
/// ```
/// use scoped_dns::{CidrBlock, coalesce};
///
/// let zones = CidrBlock::parse("192.168.1.128/25").unwrap().reverse_zones();
/// assert_eq!(coalesce(&zones), "192.168.1.128/25");
/// ```
#[must_use]
pub fn coalesce<S: AsRef<str>>(domains: &[S]) -> String {
    coalesce_with(domains, MergePolicy::Compatible)
}

/// Renders `domains` compactly: forward domains first, then one or more
/// CIDRs per reverse-zone group, all joined with `", "`.
///
/// Names under `in-addr.arpa` whose labels are not all octets are shown
/// verbatim alongside the forward domains.
#[must_use]
pub fn coalesce_with<S: AsRef<str>>(domains: &[S], policy: MergePolicy) -> String {
    let mut forward = Vec::new();
    let mut whole_space = false;
    // Keyed by the stable octets, most significant first.
    let mut groups: BTreeMap<Vec<u8>, BTreeSet<u8>> = BTreeMap::new();

    for domain in domains {
        let domain = domain.as_ref();
        if domain == REVERSE_ROOT {
            whole_space = true;
            continue;
        }
        match split_reverse(domain) {
            Some((varying, stable)) => {
                groups.entry(stable).or_default().insert(varying);
            }
            None => forward.push(domain),
        }
    }

    let mut cidrs = Vec::new();
    if whole_space {
        cidrs.push("0.0.0.0/0".to_string());
    }
    for (stable, values) in &groups {
        cidrs.extend(render_group(stable, values, policy));
    }

    [forward.join(SEPARATOR), cidrs.join(SEPARATOR)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Splits `v.c.b.a.in-addr.arpa` into `v` and `[a, b, c]`.
fn split_reverse(domain: &str) -> Option<(u8, Vec<u8>)> {
    let labels = domain.strip_suffix(REVERSE_SUFFIX)?;
    let mut octets = labels
        .split('.')
        .map(|label| label.parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;
    if octets.is_empty() || octets.len() > 4 {
        return None;
    }
    let varying = octets.remove(0);
    octets.reverse();
    Some((varying, octets))
}

fn render_group(stable: &[u8], values: &BTreeSet<u8>, policy: MergePolicy) -> Vec<String> {
    let group_prefix = 8 * (stable.len() + 1);
    let (Some(&min), Some(&max)) = (values.first(), values.last()) else {
        return Vec::new();
    };
    let count = values.len();
    let contiguous = count > 1 && usize::from(max - min) + 1 == count;

    if contiguous && policy.allows(min, count) {
        let range_bits = count.ilog2() as usize;
        return vec![format_cidr(stable, min, group_prefix - range_bits)];
    }

    values
        .iter()
        .map(|&value| format_cidr(stable, value, group_prefix))
        .collect()
}

fn format_cidr(stable: &[u8], value: u8, prefix_len: usize) -> String {
    let mut octets: Vec<String> = stable.iter().map(u8::to_string).collect();
    octets.push(value.to_string());
    octets.resize(4, "0".to_string());
    format!("{}/{prefix_len}", octets.join("."))
}
