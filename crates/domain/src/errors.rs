//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Escalation;

/// Main error type for the separation submission service.
///
/// Variants map one-to-one onto the failure taxonomy of the integration:
/// credential-tier errors (`Assertion`, `TokenExchange`, `Config`) abort a
/// run, per-record errors (`UserLookup`, `Termination`) are isolated to the
/// record that produced them.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum OffboardError {
    #[error("SAML assertion error: {0}")]
    Assertion(String),

    #[error("Token exchange error: {0}")]
    TokenExchange(String),

    #[error("User lookup error: {0}")]
    UserLookup(String),

    #[error("Termination call error: {0}")]
    Termination(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OffboardError {
    /// Whether this error invalidates the whole run rather than a single
    /// record. Credential-tier failures make every subsequent call pointless.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::Assertion(_) | Self::TokenExchange(_) | Self::Config(_))
    }

    /// Which audience is responsible for acting on this error.
    pub fn escalation(&self) -> Escalation {
        match self {
            Self::UserLookup(_) | Self::Termination(_) => Escalation::Hr,
            _ => Escalation::It,
        }
    }
}

/// Result type alias for offboard operations
pub type Result<T> = std::result::Result<T, OffboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_tier_is_fatal() {
        assert!(OffboardError::Assertion("no response".into()).is_credential_failure());
        assert!(OffboardError::TokenExchange("empty token".into()).is_credential_failure());
        assert!(OffboardError::Config("missing key".into()).is_credential_failure());
    }

    #[test]
    fn record_tier_is_isolated() {
        assert!(!OffboardError::UserLookup("not found".into()).is_credential_failure());
        assert!(!OffboardError::Termination("bad id".into()).is_credential_failure());
    }

    #[test]
    fn escalation_routing() {
        assert_eq!(OffboardError::Assertion("x".into()).escalation(), Escalation::It);
        assert_eq!(OffboardError::TokenExchange("x".into()).escalation(), Escalation::It);
        assert_eq!(OffboardError::UserLookup("x".into()).escalation(), Escalation::Hr);
        assert_eq!(OffboardError::Termination("x".into()).escalation(), Escalation::Hr);
    }
}
