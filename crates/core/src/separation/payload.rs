//! Termination payload construction
//!
//! Builds the Employee Central `EmpEmploymentTermination` wire payload:
//!
//! ```json
//! {
//!     "__metadata": { "uri": "EmpEmploymentTermination" },
//!     "personIdExternal": "1234567",
//!     "userId": "1234567",
//!     "endDate": "/Date(1558556800000)/",
//!     "eventReason": "NO_SHOW_EVENT_REASON"
//! }
//! ```

use chrono::{NaiveDate, NaiveTime};
use offboard_domain::{OffboardError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Metadata {
    uri: String,
}

/// JSON payload for one employment termination event.
#[derive(Debug, Clone, Serialize)]
pub struct TerminationPayload {
    #[serde(rename = "__metadata")]
    metadata: Metadata,
    #[serde(rename = "personIdExternal")]
    person_id_external: String,
    #[serde(rename = "userId")]
    user_id: String,
    /// Vendor epoch-millis-in-string format, kept as a string
    #[serde(rename = "endDate")]
    end_date: String,
    #[serde(rename = "eventReason")]
    event_reason: String,
}

impl TerminationPayload {
    /// Build a payload for one record.
    ///
    /// The end date is the calendar day interpreted as midnight UTC. No
    /// local-zone conversion and no fixed offset: either would shift the
    /// date across the midnight boundary on hosts that are not at UTC+0.
    #[must_use]
    pub fn build(
        person_id: &str,
        user_id: &str,
        last_working_day: NaiveDate,
        event_reason: &str,
        metadata_uri: &str,
    ) -> Self {
        let millis = utc_midnight_millis(last_working_day);

        Self {
            metadata: Metadata { uri: metadata_uri.to_string() },
            person_id_external: person_id.to_string(),
            user_id: user_id.to_string(),
            end_date: format!("/Date({millis})/"),
            event_reason: event_reason.to_string(),
        }
    }

    /// Serialize to the JSON body sent over the wire.
    ///
    /// # Errors
    /// Returns [`OffboardError::Internal`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| OffboardError::Internal(format!("failed to serialize payload: {e}")))
    }
}

/// Epoch milliseconds of midnight UTC on the given calendar day.
fn utc_midnight_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}
