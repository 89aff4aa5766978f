//! Employee Central OData client

use async_trait::async_trait;
use offboard_core::{DirectoryGateway, TerminationCall, TerminationGateway, TerminationPayload};
use offboard_domain::config::keys;
use offboard_domain::constants::DAS_ID_PLACEHOLDER;
use offboard_domain::{OffboardError, Result, TenantConfig};
use tracing::{debug, warn};

use super::atom;
use crate::http::AuthedClient;

/// Client for the Employee Central user directory and termination API.
///
/// All calls go through the authenticated client, so 401/403 recovery
/// happens transparently underneath; this layer only interprets bodies.
pub struct EcClient {
    authed: AuthedClient,
}

impl EcClient {
    pub fn new(authed: AuthedClient) -> Self {
        Self { authed }
    }
}

/// Keep credential failures (which abort the run) distinct from the
/// per-record tier while rewrapping everything else.
fn wrap_record_error(err: OffboardError, wrap: fn(String) -> OffboardError) -> OffboardError {
    if err.is_credential_failure() {
        err
    } else {
        wrap(err.to_string())
    }
}

#[async_trait]
impl DirectoryGateway for EcClient {
    async fn resolve_user_id(&self, config: &TenantConfig, das_id: &str) -> Result<String> {
        let template = config.require(keys::USER_ENDPOINT)?;
        let url = template.replace(DAS_ID_PLACEHOLDER, &format!("'{das_id}'"));

        let response = self
            .authed
            .get(config, &url)
            .await
            .map_err(|err| wrap_record_error(err, OffboardError::UserLookup))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            OffboardError::UserLookup(format!("failed to read user directory response: {err}"))
        })?;

        if !status.is_success() {
            return Err(OffboardError::UserLookup(format!(
                "user directory returned HTTP {status}"
            )));
        }

        let user_id = atom::extract_user_id(&body).map_err(|err| {
            OffboardError::UserLookup(format!("failed to parse user directory response: {err}"))
        })?;

        match user_id {
            Some(user_id) => {
                debug!(das_id, user_id, "resolved user id");
                Ok(user_id)
            }
            None => {
                warn!(das_id, "userId element not found in user directory response");
                Err(OffboardError::UserLookup(
                    "userId element not found or empty in user directory response".into(),
                ))
            }
        }
    }
}

#[async_trait]
impl TerminationGateway for EcClient {
    async fn submit(
        &self,
        config: &TenantConfig,
        payload: &TerminationPayload,
    ) -> Result<TerminationCall> {
        let url = config.require(keys::TERMINATION_ENDPOINT)?;
        let request_body = payload.to_json()?;

        let response = self
            .authed
            .post_json(config, url, &request_body)
            .await
            .map_err(|err| wrap_record_error(err, OffboardError::Termination))?;

        // The body is captured raw even for error statuses: termination
        // failures regularly arrive as 200 with an embedded error payload,
        // so interpretation belongs to the classifier.
        let response_body = response.text().await.map_err(|err| {
            OffboardError::Termination(format!("failed to read termination response: {err}"))
        })?;

        Ok(TerminationCall { request_body, response_body })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::TokenManager;
    use crate::http::HttpTransport;

    const USER_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://www.w3.org/2005/Atom"
       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices">
  <content type="application/xml">
    <m:properties><d:userId>7654321</d:userId></m:properties>
  </content>
</entry>"#;

    fn tenant_config(server_uri: &str) -> TenantConfig {
        [
            (keys::SAML_ENDPOINT, format!("{server_uri}/saml")),
            (keys::TOKEN_ENDPOINT, format!("{server_uri}/oauth/token")),
            (keys::CLIENT_ID, "client-1".to_string()),
            (keys::COMPANY_ID, "company-1".to_string()),
            (keys::GRANT_TYPE, "urn:ietf:params:oauth:grant-type:saml2-bearer".to_string()),
            (keys::TOKEN_FIELD, "access_token".to_string()),
            (keys::SAML_PRIVATE_KEY, "pem-key".to_string()),
            (keys::SAML_USER_ID, "api-user".to_string()),
            (
                keys::USER_ENDPOINT,
                format!("{server_uri}/odata/v2/User?$filter=username eq {{dasid}}"),
            ),
            (keys::TERMINATION_ENDPOINT, format!("{server_uri}/odata/v2/upsert")),
            (keys::TERMINATION_URI, "EmpEmploymentTermination".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    async fn mount_token_flow(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/saml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("signed-assertion"))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ec-token",
                "expires_in": 3600
            })))
            .mount(server)
            .await;
    }

    fn ec_client() -> EcClient {
        let transport = HttpTransport::new().expect("transport");
        let tokens = Arc::new(TokenManager::new(transport.clone()));
        EcClient::new(AuthedClient::new(transport, tokens))
    }

    #[tokio::test]
    async fn resolves_user_id_with_quoted_das_id() {
        let server = MockServer::start().await;
        mount_token_flow(&server).await;
        Mock::given(method("GET"))
            .and(path("/odata/v2/User"))
            .and(query_param("$filter", "username eq 'jdoe'"))
            .and(header("Authorization", "Bearer ec-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(USER_FEED))
            .expect(1)
            .mount(&server)
            .await;

        let client = ec_client();
        let user_id = client
            .resolve_user_id(&tenant_config(&server.uri()), "jdoe")
            .await
            .expect("user id");

        assert_eq!(user_id, "7654321");
    }

    #[tokio::test]
    async fn missing_user_id_element_is_a_lookup_failure() {
        let server = MockServer::start().await;
        mount_token_flow(&server).await;
        Mock::given(method("GET"))
            .and(path("/odata/v2/User"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#,
            ))
            .mount(&server)
            .await;

        let client = ec_client();
        let result = client.resolve_user_id(&tenant_config(&server.uri()), "ghost").await;

        match result {
            Err(OffboardError::UserLookup(msg)) => {
                assert!(msg.contains("userId element not found"));
            }
            other => panic!("expected lookup failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lookup_error_status_is_a_lookup_failure() {
        let server = MockServer::start().await;
        mount_token_flow(&server).await;
        Mock::given(method("GET"))
            .and(path("/odata/v2/User"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ec_client();
        let result = client.resolve_user_id(&tenant_config(&server.uri()), "jdoe").await;

        match result {
            Err(OffboardError::UserLookup(msg)) => assert!(msg.contains("500")),
            other => panic!("expected lookup failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_captures_request_and_response_bodies() {
        let server = MockServer::start().await;
        mount_token_flow(&server).await;
        Mock::given(method("POST"))
            .and(path("/odata/v2/upsert"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "d": [{"status": "OK", "message": ""}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ec_client();
        let payload = TerminationPayload::build(
            "1234567",
            "7654321",
            NaiveDate::from_ymd_opt(2025, 7, 30).unwrap(),
            "RESIGNATION",
            "EmpEmploymentTermination",
        );
        let call =
            client.submit(&tenant_config(&server.uri()), &payload).await.expect("call outcome");

        assert!(call.request_body.contains("\"personIdExternal\":\"1234567\""));
        assert!(call.request_body.contains("/Date(1753833600000)/"));
        assert!(call.response_body.contains("OK"));
    }

    #[tokio::test]
    async fn submit_returns_error_payload_body_for_classification() {
        let server = MockServer::start().await;
        mount_token_flow(&server).await;
        // embedded failure with a 200 status: returned, not raised
        Mock::given(method("POST"))
            .and(path("/odata/v2/upsert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "d": [{"status": "Error", "message": "bad id"}]
            })))
            .mount(&server)
            .await;

        let client = ec_client();
        let payload = TerminationPayload::build(
            "1",
            "2",
            NaiveDate::from_ymd_opt(2025, 7, 30).unwrap(),
            "RESIGNATION",
            "EmpEmploymentTermination",
        );
        let call = client.submit(&tenant_config(&server.uri()), &payload).await.expect("call");

        assert!(call.response_body.contains("bad id"));
    }

    #[tokio::test]
    async fn credential_failure_during_lookup_stays_fatal() {
        let server = MockServer::start().await;
        // No token flow mocks: the initial refresh cannot succeed.
        Mock::given(method("POST"))
            .and(path("/saml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ec_client();
        let result = client.resolve_user_id(&tenant_config(&server.uri()), "jdoe").await;

        match result {
            Err(err) => assert!(err.is_credential_failure()),
            Ok(_) => panic!("expected credential failure"),
        }
    }
}
