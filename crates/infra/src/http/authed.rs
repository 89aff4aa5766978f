//! Authenticated HTTP client
//!
//! Wraps the shared transport with bearer-token handling: every request
//! carries `Authorization: Bearer <token>`, and a 401/403 answer triggers
//! exactly one token refresh followed by one identical reissue. A second
//! 401/403 is surfaced to the caller, never re-refreshed: a permanently
//! misconfigured credential must not turn into a retry loop.

use std::sync::Arc;

use offboard_core::SessionTokens;
use offboard_domain::{Result, TenantConfig};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::auth::TokenManager;
use crate::http::HttpTransport;

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Bearer-authenticated client over the shared transport.
#[derive(Clone)]
pub struct AuthedClient {
    transport: HttpTransport,
    tokens: Arc<TokenManager>,
}

impl AuthedClient {
    pub fn new(transport: HttpTransport, tokens: Arc<TokenManager>) -> Self {
        Self { transport, tokens }
    }

    /// GET with an `Accept: */*` header.
    pub async fn get(&self, config: &TenantConfig, url: &str) -> Result<Response> {
        self.send(config, Method::GET, url, None, "*/*").await
    }

    /// POST a JSON body with an `Accept: application/json` header.
    pub async fn post_json(
        &self,
        config: &TenantConfig,
        url: &str,
        body: &str,
    ) -> Result<Response> {
        self.send(config, Method::POST, url, Some(body), "application/json").await
    }

    /// Issue a request with the current token, re-authenticating at most
    /// once on an authorization failure.
    ///
    /// # Errors
    /// Propagates transport failures and refresh failures; HTTP error
    /// statuses (including a repeated 401/403) are returned as responses
    /// for the caller to classify.
    async fn send(
        &self,
        config: &TenantConfig,
        method: Method,
        url: &str,
        body: Option<&str>,
        accept: &str,
    ) -> Result<Response> {
        let token = self.tokens.get_valid(config).await?;
        let response =
            self.transport.send(self.build(method.clone(), url, body, accept, &token.value)).await?;

        if !is_auth_failure(response.status()) {
            return Ok(response);
        }

        warn!(%method, url, status = %response.status(), "authorization failure, refreshing token");

        // If the refresh itself fails there is nothing left to try; the
        // credential failure propagates and no further retry happens.
        let token = self.tokens.refresh(config).await?;
        debug!(%method, url, "reissuing request with refreshed token");
        self.transport.send(self.build(method, url, body, accept, &token.value)).await
    }

    fn build(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        accept: &str,
        token: &str,
    ) -> RequestBuilder {
        let mut builder = self
            .transport
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, accept);

        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body.to_string());
        }

        builder
    }
}
