//! Configuration structures
//!
//! Two layers of configuration exist:
//! - [`Settings`]: process-level settings (database location, tenant list),
//!   loaded once at startup from environment or file.
//! - [`TenantConfig`]: the per-tenant, per-purpose key/value mapping pulled
//!   from the config store at the start of each run. Immutable for the
//!   lifetime of the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{OffboardError, Result};

/// Well-known tenant configuration keys.
///
/// A missing required key is a fatal configuration error: the run aborts
/// before any record is processed.
pub mod keys {
    /// SAML assertion endpoint
    pub const SAML_ENDPOINT: &str = "saml_endpoint";
    /// OAuth token endpoint
    pub const TOKEN_ENDPOINT: &str = "token_endpoint";
    /// OAuth client id
    pub const CLIENT_ID: &str = "client_id";
    /// Employee Central company id
    pub const COMPANY_ID: &str = "company_id";
    /// OAuth grant type
    pub const GRANT_TYPE: &str = "grant_type";
    /// Name of the JSON field carrying the token value (varies per tenant)
    pub const TOKEN_FIELD: &str = "token_field";
    /// Signing key for the SAML assertion request
    pub const SAML_PRIVATE_KEY: &str = "saml_private_key";
    /// API user id for the SAML assertion request
    pub const SAML_USER_ID: &str = "saml_user_id";
    /// User directory endpoint template containing the `{dasid}` placeholder
    pub const USER_ENDPOINT: &str = "user_endpoint";
    /// Employment termination endpoint
    pub const TERMINATION_ENDPOINT: &str = "termination_endpoint";
    /// Metadata URI embedded in the termination payload
    pub const TERMINATION_URI: &str = "termination_uri";

    /// SMTP host for notification delivery
    pub const SMTP_HOST: &str = "smtp_host";
    /// SMTP port for notification delivery
    pub const SMTP_PORT: &str = "smtp_port";
    /// Notification sender address
    pub const EMAIL_FROM: &str = "email_from";
    /// Comma-separated IT recipient list
    pub const NOTIFY_TO_IT: &str = "notify_to_it";
    /// Comma-separated IT cc list
    pub const NOTIFY_CC_IT: &str = "notify_cc_it";
    /// Comma-separated HR recipient list
    pub const NOTIFY_TO_HR: &str = "notify_to_hr";
    /// Comma-separated HR cc list
    pub const NOTIFY_CC_HR: &str = "notify_cc_hr";
    /// Subject template (supports `{{run_date}}`)
    pub const EMAIL_SUBJECT_TEMPLATE: &str = "email_subject_template";
    /// HTML body template (supports `{{run_date}}`, `{{run_id}}`, `{{table}}`)
    pub const EMAIL_BODY_TEMPLATE: &str = "email_body_template";
}

/// Immutable per-tenant configuration mapping.
///
/// Loaded once per run; never mutated. Lookups distinguish optional keys
/// ([`TenantConfig::get`]) from required keys ([`TenantConfig::require`]),
/// where absence is a fatal [`OffboardError::Config`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantConfig {
    values: BTreeMap<String, String>,
}

impl TenantConfig {
    /// Wrap a key/value mapping loaded from the config store.
    #[must_use]
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Look up an optional key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a required key.
    ///
    /// # Errors
    /// Returns [`OffboardError::Config`] if the key is absent or blank.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(OffboardError::Config(format!("missing required config key `{key}`"))),
        }
    }

    /// Number of entries in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for TenantConfig {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub run: RunSettings,
    pub http: HttpSettings,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file path
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

/// Run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Tenants processed sequentially, in order
    pub tenants: Vec<String>,
    /// Directory for the fallback audit log files
    pub log_dir: String,
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Outbound request timeout in seconds
    pub timeout_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(entries: &[(&str, &str)]) -> TenantConfig {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn require_returns_present_value() {
        let config = config_with(&[(keys::CLIENT_ID, "client-1")]);
        assert_eq!(config.require(keys::CLIENT_ID).unwrap(), "client-1");
    }

    #[test]
    fn require_rejects_missing_key() {
        let config = config_with(&[]);
        let err = config.require(keys::TOKEN_ENDPOINT).unwrap_err();
        assert!(matches!(err, OffboardError::Config(_)));
        assert!(err.to_string().contains(keys::TOKEN_ENDPOINT));
    }

    #[test]
    fn require_rejects_blank_value() {
        let config = config_with(&[(keys::SAML_ENDPOINT, "   ")]);
        assert!(config.require(keys::SAML_ENDPOINT).is_err());
    }

    #[test]
    fn get_is_optional() {
        let config = config_with(&[]);
        assert!(config.get(keys::NOTIFY_CC_IT).is_none());
    }
}
