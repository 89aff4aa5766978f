//! Bearer token with buffered expiry
//!
//! Tokens are replaced, never mutated: a refresh produces a fresh
//! [`BearerToken`] and the previous one is dropped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_EXPIRY_BUFFER_SECS;

/// Short-lived credential presented on each authenticated call.
///
/// `expires_at` already includes the safety buffer: the token is treated as
/// expired five minutes before its server-reported expiry so a call started
/// near the boundary cannot be invalidated mid-flight. When the reported
/// lifetime is shorter than the buffer the token is immediately expired,
/// not negative-lived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerToken {
    /// Opaque token value sent as `Authorization: Bearer <value>`
    pub value: String,
    /// Buffered expiry instant (UTC)
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Create a token issued at `issued_at` with a server-reported lifetime
    /// of `expires_in` seconds, applying the expiry buffer.
    #[must_use]
    pub fn issue(value: String, expires_in: i64, issued_at: DateTime<Utc>) -> Self {
        let lifetime = (expires_in - TOKEN_EXPIRY_BUFFER_SECS).max(0);
        Self { value, expires_at: issued_at + Duration::seconds(lifetime) }
    }

    /// Whether the token must not be used for a call starting at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_subtracted_from_lifetime() {
        let issued = Utc::now();
        let token = BearerToken::issue("t".into(), 400, issued);

        // 400s reported minus the 300s buffer leaves a 100s window
        assert_eq!((token.expires_at - issued).num_seconds(), 100);
        assert!(!token.is_expired(issued));
        assert!(token.is_expired(issued + Duration::seconds(100)));
    }

    #[test]
    fn short_lifetime_is_immediately_expired() {
        let issued = Utc::now();
        let token = BearerToken::issue("t".into(), 100, issued);

        assert_eq!(token.expires_at, issued);
        assert!(token.is_expired(issued));
    }

    #[test]
    fn zero_lifetime_is_immediately_expired() {
        let issued = Utc::now();
        let token = BearerToken::issue("t".into(), 0, issued);
        assert!(token.is_expired(issued));
    }
}
