//! Error types for dial operations

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DialError>;

/// Message carried by [`DialError::Restricted`].
pub const RESTRICTED_MESSAGE: &str = "no unrestricted ip address found";

#[derive(Debug, Error)]
pub enum DialError {
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error(transparent)]
    Resolve(io::Error),

    /// Nothing resolved, or every resolved address was filtered out.
    /// Deliberately carries no detail about which case applied.
    #[error("no unrestricted ip address found")]
    Restricted,

    /// Failure of the last candidate attempted.
    #[error(transparent)]
    Connect(io::Error),

    #[error("dial cancelled")]
    Cancelled,
}

impl DialError {
    pub(crate) fn invalid_address(address: &str, reason: &'static str) -> Self {
        DialError::InvalidAddress {
            address: address.to_string(),
            reason,
        }
    }

    /// True for the restricted-destination sentinel
    pub fn is_restricted(&self) -> bool {
        matches!(self, DialError::Restricted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_message_is_fixed() {
        assert_eq!(DialError::Restricted.to_string(), RESTRICTED_MESSAGE);
        assert!(DialError::Restricted.is_restricted());
    }

    #[test]
    fn test_resolve_error_is_verbatim() {
        let err = DialError::Resolve(io::Error::new(io::ErrorKind::NotFound, "no such host"));
        assert_eq!(err.to_string(), "no such host");
        assert!(!err.is_restricted());
    }

    #[test]
    fn test_invalid_address_display() {
        let err = DialError::invalid_address("example.com", "missing port");
        assert!(err.to_string().contains("example.com"));
        assert!(err.to_string().contains("missing port"));
    }
}
