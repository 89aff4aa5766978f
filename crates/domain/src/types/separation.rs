//! Pending separation records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Processing status of a separation record within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Succeeded,
    Failed,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One pending employee-separation event awaiting submission.
///
/// Pulled from the record store at run start. The status transition is the
/// sole output of processing a record; persisting the final status is the
/// record store's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationRecord {
    /// External person id (DAS id) used for directory lookup
    pub das_id: String,
    /// Unique id correlating back to the persistent source row
    pub resignation_id: i64,
    /// Last working day, a timezone-naive calendar date
    pub last_working_day: NaiveDate,
    /// Event reason code submitted with the termination
    pub event_reason: String,
    /// Remote user id, resolved lazily during processing
    pub sf_user_id: Option<String>,
    pub status: RecordStatus,
}

impl SeparationRecord {
    /// A freshly loaded record with nothing resolved yet.
    #[must_use]
    pub fn pending(
        das_id: String,
        resignation_id: i64,
        last_working_day: NaiveDate,
        event_reason: String,
    ) -> Self {
        Self {
            das_id,
            resignation_id,
            last_working_day,
            event_reason,
            sf_user_id: None,
            status: RecordStatus::Pending,
        }
    }
}
