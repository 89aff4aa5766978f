//! Token manager for the SAML-to-OAuth exchange
//!
//! Manages the bearer-token lifecycle for one tenant run:
//! - SAML assertion generation (form POST against the tenant's IdP endpoint)
//! - Assertion-for-token exchange with a per-tenant token field name
//! - All-or-nothing refresh with the five-minute expiry buffer
//!
//! The state machine is `NoToken -> Valid -> NoToken`; refresh is atomic
//! from the caller's perspective. There is no partial credential state: if
//! either step fails, the previously held token is left untouched and the
//! failure is reported.

use async_trait::async_trait;
use chrono::Utc;
use offboard_core::SessionTokens;
use offboard_domain::config::keys;
use offboard_domain::{BearerToken, OffboardError, Result, TenantConfig};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::http::HttpTransport;

/// Bearer-token session backed by the SAML assertion flow.
pub struct TokenManager {
    transport: HttpTransport,
    current: RwLock<Option<BearerToken>>,
}

impl TokenManager {
    /// Create a manager over the shared transport. No token is held until
    /// the first successful refresh.
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport, current: RwLock::new(None) }
    }

    /// Return the held token if it is still valid, refreshing otherwise.
    ///
    /// # Errors
    /// Propagates refresh failures ([`OffboardError::Assertion`] or
    /// [`OffboardError::TokenExchange`]).
    pub async fn get_valid(&self, config: &TenantConfig) -> Result<BearerToken> {
        if let Some(token) = self.current().await {
            if !token.is_expired(Utc::now()) {
                return Ok(token);
            }
        }
        self.refresh(config).await
    }

    /// POST the assertion request to the tenant's SAML endpoint.
    ///
    /// The response body is the assertion itself; an empty body is as much
    /// of a failure as an unreachable endpoint or a non-2xx status.
    async fn generate_assertion(&self, config: &TenantConfig) -> Result<String> {
        let url = config.require(keys::SAML_ENDPOINT)?;
        let form = [
            ("client_id", config.require(keys::CLIENT_ID)?),
            ("token_url", config.require(keys::TOKEN_ENDPOINT)?),
            ("private_key", config.require(keys::SAML_PRIVATE_KEY)?),
            ("user_id", config.require(keys::SAML_USER_ID)?),
        ];

        let builder =
            self.transport.request(Method::POST, url).header(ACCEPT, "*/*").form(&form);
        let response = self
            .transport
            .send(builder)
            .await
            .map_err(|err| OffboardError::Assertion(format!("SAML endpoint unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OffboardError::Assertion(format!(
                "SAML endpoint returned HTTP {status}"
            )));
        }

        let assertion = response.text().await.map_err(|err| {
            OffboardError::Assertion(format!("failed to read SAML response: {err}"))
        })?;
        if assertion.trim().is_empty() {
            return Err(OffboardError::Assertion("SAML endpoint returned an empty assertion".into()));
        }

        debug!(endpoint = url, "generated SAML assertion");
        Ok(assertion)
    }

    /// Exchange the assertion for a bearer token.
    ///
    /// The JSON field carrying the token value varies per tenant, so it is
    /// looked up by the configured name; `expires_in` defaults to 0 when
    /// absent, which yields an immediately expired token.
    async fn exchange_for_token(
        &self,
        config: &TenantConfig,
        assertion: &str,
    ) -> Result<(String, i64)> {
        let url = config.require(keys::TOKEN_ENDPOINT)?;
        let form = [
            ("company_id", config.require(keys::COMPANY_ID)?),
            ("client_id", config.require(keys::CLIENT_ID)?),
            ("grant_type", config.require(keys::GRANT_TYPE)?),
            ("assertion", assertion),
        ];

        let builder = self.transport.request(Method::POST, url).form(&form);
        let response = self.transport.send(builder).await.map_err(|err| {
            OffboardError::TokenExchange(format!("token endpoint unreachable: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OffboardError::TokenExchange(format!(
                "token endpoint returned HTTP {status}"
            )));
        }

        let envelope: Value = response.json().await.map_err(|err| {
            OffboardError::TokenExchange(format!("failed to parse token response: {err}"))
        })?;

        let field = config.require(keys::TOKEN_FIELD)?;
        let token = envelope
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default();
        if token.is_empty() {
            return Err(OffboardError::TokenExchange(format!(
                "token field `{field}` missing or empty in token response"
            )));
        }

        let expires_in = match envelope.get("expires_in") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            _ => 0,
        };

        Ok((token, expires_in))
    }
}

#[async_trait]
impl SessionTokens for TokenManager {
    async fn refresh(&self, config: &TenantConfig) -> Result<BearerToken> {
        let assertion = self.generate_assertion(config).await?;
        let (value, expires_in) = self.exchange_for_token(config, &assertion).await?;

        let token = BearerToken::issue(value, expires_in, Utc::now());
        *self.current.write().await = Some(token.clone());

        info!(expires_at = %token.expires_at, "bearer token refreshed");
        Ok(token)
    }

    async fn current(&self) -> Option<BearerToken> {
        self.current.read().await.clone()
    }
}
