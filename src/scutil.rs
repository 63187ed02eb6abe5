//! [`DnsStore`] backed by the macOS `scutil` tool.
//!
//! Every operation spawns `scutil` once and feeds it a short command
//! script on stdin:
//!
//! ```text
//! d.init
//! d.add SupplementalMatchDomains * example.com 10.in-addr.arpa
//! d.add ServerAddresses * 10.0.0.1
//! d.add SearchDomains * example.com
//! set State:/Network/Service/<id>/DNS
//! quit
//! ```
//!
//! Writes require root; `scutil` reports refusals on stdout, which is
//! surfaced as [`ScopedDnsError::Store`].

use crate::error::{Result, ScopedDnsError};
use crate::store::{DnsRecord, DnsStore, fields};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default location of the tool.
const DEFAULT_SCUTIL: &str = "/usr/sbin/scutil";

/// Talks to the system configuration store through `scutil`.
#[derive(Debug, Clone)]
pub struct ScutilStore {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ScutilStore {
    /// Targets `/usr/sbin/scutil`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_SCUTIL),
            args: Vec::new(),
        }
    }

    /// Targets a different executable (useful for testing).
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds leading arguments passed before the script is piped in.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the executable path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, script: &str) -> Result<String> {
        tracing::trace!(program = %self.program.display(), script = %script, "Running scutil");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes())?;
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScopedDnsError::Store(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs a mutating script; any output means `scutil` refused it.
    fn run_quiet(&self, script: &str) -> Result<()> {
        let stdout = self.run(script)?;
        let message = stdout.trim();
        if message.is_empty() {
            Ok(())
        } else {
            Err(ScopedDnsError::Store(message.to_string()))
        }
    }
}

impl Default for ScutilStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsStore for ScutilStore {
    fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let stdout = self.run(&format!("list {pattern}\nquit\n"))?;
        Ok(parse_list(&stdout))
    }

    fn get(&self, key: &str) -> Result<Option<DnsRecord>> {
        let stdout = self.run(&format!("show {key}\nquit\n"))?;
        parse_show(&stdout)
    }

    fn set(&self, key: &str, record: &DnsRecord) -> Result<()> {
        let script = set_script(key, record)?;
        self.run_quiet(&script)?;
        tracing::debug!(key = %key, "Wrote DNS record");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.run_quiet(&format!("remove {key}\nquit\n"))?;
        tracing::debug!(key = %key, "Removed DNS record");
        Ok(())
    }

    fn notify(&self, key: &str) -> Result<()> {
        self.run_quiet(&format!("notify {key}\nquit\n"))?;
        tracing::debug!(key = %key, "Notified DNS record change");
        Ok(())
    }
}

/// Builds the dictionary-and-set script. Empty lists are left out.
fn set_script(key: &str, record: &DnsRecord) -> Result<String> {
    let mut script = String::from("d.init\n");
    for (field, values) in [
        (fields::SUPPLEMENTAL_MATCH_DOMAINS, &record.supplemental_match_domains),
        (fields::SERVER_ADDRESSES, &record.server_addresses),
        (fields::SEARCH_DOMAINS, &record.search_domains),
    ] {
        if values.is_empty() {
            continue;
        }
        if let Some(bad) = values.iter().find(|v| v.is_empty() || v.contains(char::is_whitespace)) {
            return Err(ScopedDnsError::InvalidConfig(format!(
                "{field} value {bad:?} cannot be passed to scutil"
            )));
        }
        script.push_str(&format!("d.add {field} * {}\n", values.join(" ")));
    }
    script.push_str(&format!("set {key}\nquit\n"));
    Ok(script)
}

/// Extracts keys from `list` output (`  subKey [0] = <key>`).
fn parse_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("subKey"))
        .filter_map(|line| line.split_once(" = "))
        .map(|(_, key)| key.trim().to_string())
        .collect()
}

/// Parses `show` output of a DNS dictionary.
///
/// ```text
/// <dictionary> {
///   ServerAddresses : <array> {
///     0 : 10.0.0.1
///   }
/// }
/// ```
fn parse_show(output: &str) -> Result<Option<DnsRecord>> {
    let output = output.trim();
    if output.is_empty() || output.contains("No such key") {
        return Ok(None);
    }
    if !output.starts_with("<dictionary>") {
        return Err(ScopedDnsError::Store(format!(
            "unexpected scutil output: {output}"
        )));
    }

    let mut record = DnsRecord::default();
    let mut current: Option<&str> = None;
    for line in output.lines().skip(1).map(str::trim) {
        if line == "}" {
            current = None;
            continue;
        }
        let Some((name, value)) = line.split_once(" : ") else {
            continue;
        };
        if value == "<array> {" {
            current = Some(name);
            continue;
        }
        let Some(field) = current else {
            continue;
        };
        if name.parse::<usize>().is_ok() {
            if let Some(list) = field_mut(&mut record, field) {
                list.push(value.to_string());
            }
        }
    }
    Ok(Some(record))
}

fn field_mut<'a>(record: &'a mut DnsRecord, field: &str) -> Option<&'a mut Vec<String>> {
    match field {
        fields::SUPPLEMENTAL_MATCH_DOMAINS => Some(&mut record.supplemental_match_domains),
        fields::SERVER_ADDRESSES => Some(&mut record.server_addresses),
        fields::SEARCH_DOMAINS => Some(&mut record.search_domains),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_OUTPUT: &str = "<dictionary> {
  DomainName : corp.test
  SearchDomains : <array> {
    0 : corp.test
  }
  ServerAddresses : <array> {
    0 : 10.0.0.1
    1 : 10.0.0.2
  }
  SupplementalMatchDomains : <array> {
    0 : corp.test
    1 : 10.in-addr.arpa
  }
}
";

    fn record() -> DnsRecord {
        DnsRecord {
            supplemental_match_domains: vec!["corp.test".into(), "10.in-addr.arpa".into()],
            server_addresses: vec!["10.0.0.1".into(), "10.0.0.2".into()],
            search_domains: vec!["corp.test".into()],
        }
    }

    #[test]
    fn parse_show_reads_arrays() {
        assert_eq!(parse_show(SHOW_OUTPUT).unwrap(), Some(record()));
    }

    #[test]
    fn parse_show_missing_key() {
        assert_eq!(parse_show("  No such key\n").unwrap(), None);
        assert_eq!(parse_show("").unwrap(), None);
    }

    #[test]
    fn parse_show_rejects_garbage() {
        assert!(matches!(
            parse_show("scutil: permission denied"),
            Err(ScopedDnsError::Store(_))
        ));
    }

    #[test]
    fn parse_list_extracts_keys() {
        let output = "  subKey [0] = State:/Network/Service/AAA/DNS\n  subKey [1] = State:/Network/Service/BBB/DNS\n";
        assert_eq!(
            parse_list(output),
            vec![
                "State:/Network/Service/AAA/DNS",
                "State:/Network/Service/BBB/DNS"
            ]
        );
        assert!(parse_list("  no keys.\n").is_empty());
    }

    #[test]
    fn set_script_layout() {
        let script = set_script("State:/Network/Service/X/DNS", &record()).unwrap();
        assert_eq!(
            script,
            "d.init\n\
             d.add SupplementalMatchDomains * corp.test 10.in-addr.arpa\n\
             d.add ServerAddresses * 10.0.0.1 10.0.0.2\n\
             d.add SearchDomains * corp.test\n\
             set State:/Network/Service/X/DNS\n\
             quit\n"
        );
    }

    #[test]
    fn set_script_skips_empty_lists() {
        let record = DnsRecord {
            supplemental_match_domains: vec!["10.in-addr.arpa".into()],
            server_addresses: vec!["10.0.0.1".into()],
            search_domains: Vec::new(),
        };
        let script = set_script("K", &record).unwrap();
        assert!(!script.contains("SearchDomains"));
    }

    #[test]
    fn set_script_rejects_whitespace() {
        let record = DnsRecord {
            supplemental_match_domains: vec!["bad domain".into()],
            ..DnsRecord::default()
        };
        assert!(matches!(
            set_script("K", &record),
            Err(ScopedDnsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_program() {
        assert_eq!(ScutilStore::new().program(), Path::new("/usr/sbin/scutil"));
    }
}
