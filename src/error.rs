//! Error types.

use thiserror::Error;

/// Result alias for scoped DNS operations.
pub type Result<T> = std::result::Result<T, ScopedDnsError>;

/// Errors returned by parsing, store access and entry management.
#[derive(Debug, Error)]
pub enum ScopedDnsError {
    /// A CIDR literal could not be parsed.
    #[error("invalid CIDR {input:?}: {reason}")]
    InvalidCidr {
        /// The text as given.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// The block cannot be expressed as reverse zones.
    #[error("CIDR {cidr} does not expand to any reverse zone")]
    EmptyExpansion {
        /// The offending block.
        cidr: String,
    },

    /// Spawning or talking to the store tool failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration store rejected a request or returned garbage.
    #[error("configuration store error: {0}")]
    Store(String),

    /// Nothing in the store matches the requested domains and resolvers.
    #[error("no scoped DNS entries found matching domains {domains} and resolvers {resolvers}")]
    NoMatchingEntry {
        /// Display form of the requested domains.
        domains: String,
        /// Comma-separated resolvers.
        resolvers: String,
    },

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl ScopedDnsError {
    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied)
    }

    /// Returns `true` for [`ScopedDnsError::InvalidCidr`].
    #[must_use]
    pub const fn is_invalid_cidr(&self) -> bool {
        matches!(self, Self::InvalidCidr { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_cidr_message_quotes_input() {
        let err = ScopedDnsError::InvalidCidr {
            input: "abc/24".into(),
            reason: "octet is not a number",
        };
        assert!(err.is_invalid_cidr());
        assert_eq!(
            err.to_string(),
            "invalid CIDR \"abc/24\": octet is not a number"
        );
    }

    #[test]
    fn permission_denied_detected() {
        let err = ScopedDnsError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(err.is_permission_denied());
        assert!(!ScopedDnsError::Store("x".into()).is_permission_denied());
    }
}
