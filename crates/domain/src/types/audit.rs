//! Audit trail types
//!
//! Every remote call attempt (including a failed assertion or token
//! exchange) produces exactly one append-only [`AuditEntry`]. The rows feed
//! both postmortem diagnosis and the post-run email notification, so every
//! field must stay renderable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which audience a failure is escalated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Escalation {
    It,
    Hr,
}

impl Escalation {
    /// Stable storage / display form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::It => "IT",
            Self::Hr => "HR",
        }
    }

    /// Parse the storage form, defaulting unknown values to IT.
    #[must_use]
    pub fn parse_or_it(value: &str) -> Self {
        if value.eq_ignore_ascii_case("HR") {
            Self::Hr
        } else {
            Self::It
        }
    }
}

impl std::fmt::Display for Escalation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One durable record of a single remote-call attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub tenant: String,
    /// DAS id of the affected employee; empty for credential-level failures
    pub subject_id: String,
    pub success: bool,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    /// Source-chain and context detail captured for postmortem diagnosis
    pub error_details: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub escalate_to: Escalation,
}

impl AuditEntry {
    /// A successful call attempt.
    #[must_use]
    pub fn success(
        tenant: &str,
        run_id: Uuid,
        subject_id: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant: tenant.to_string(),
            subject_id: subject_id.to_string(),
            success: true,
            request_body: None,
            response_body: None,
            error_message: None,
            error_details: None,
            started_at,
            ended_at: Utc::now(),
            run_id,
            escalate_to: Escalation::Hr,
        }
    }

    /// A failed call attempt escalated to `escalate_to`.
    #[must_use]
    pub fn failure(
        tenant: &str,
        run_id: Uuid,
        subject_id: &str,
        started_at: DateTime<Utc>,
        escalate_to: Escalation,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.to_string(),
            subject_id: subject_id.to_string(),
            success: false,
            request_body: None,
            response_body: None,
            error_message: Some(error_message.into()),
            error_details: None,
            started_at,
            ended_at: Utc::now(),
            run_id,
            escalate_to,
        }
    }

    /// Attach the outbound request body.
    #[must_use]
    pub fn with_request(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// Attach the raw response body.
    #[must_use]
    pub fn with_response(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    /// Attach postmortem detail (source chain, record correlation).
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// Outcome of one notification email delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLogEntry {
    pub tenant: String,
    pub sender: String,
    pub recipients: String,
    pub cc: String,
    pub subject: String,
    pub body: String,
    pub sent: bool,
    pub failure_reason: Option<String>,
    pub audience: Escalation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_round_trips_storage_form() {
        assert_eq!(Escalation::parse_or_it(Escalation::It.as_str()), Escalation::It);
        assert_eq!(Escalation::parse_or_it(Escalation::Hr.as_str()), Escalation::Hr);
        assert_eq!(Escalation::parse_or_it("hr"), Escalation::Hr);
        assert_eq!(Escalation::parse_or_it("garbage"), Escalation::It);
    }

    #[test]
    fn failure_entry_carries_message_and_details() {
        let entry = AuditEntry::failure(
            "acme",
            Uuid::new_v4(),
            "jdoe",
            Utc::now(),
            Escalation::Hr,
            "userId element not found",
        )
        .with_details("resignation_id=42");

        assert!(!entry.success);
        assert_eq!(entry.escalate_to, Escalation::Hr);
        assert_eq!(entry.error_message.as_deref(), Some("userId element not found"));
        assert_eq!(entry.error_details.as_deref(), Some("resignation_id=42"));
    }
}
