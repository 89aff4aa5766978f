use std::time::Duration;

use offboard_domain::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use offboard_domain::{OffboardError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

/// Shared outbound HTTP transport.
///
/// One instance is created at process start and passed by handle into every
/// component that makes outbound calls. Connection reuse across a run is
/// mandatory: a transport must never be constructed per call. The underlying
/// client is stateless across calls besides connection pooling, so a single
/// handle is safe to share.
///
/// This layer performs no retries of its own; status-level handling (the
/// single re-authentication on 401/403) lives in [`super::AuthedClient`].
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Start building a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder.
    ///
    /// # Errors
    /// Returns [`OffboardError::Network`] on transport failure; HTTP error
    /// statuses are returned as responses, not errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder
            .build()
            .map_err(|err| OffboardError::Internal(format!("invalid HTTP request: {err}")))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, %url, %status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(OffboardError::Network(format!("HTTP request failed: {err}")))
            }
        }
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS), user_agent: None }
    }
}

impl HttpTransportBuilder {
    /// Bounded timeout applied to every outbound call; a stuck remote
    /// endpoint must not block a run indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| OffboardError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpTransport { client })
    }
}
