//! Domain types and models

pub mod audit;
pub mod run;
pub mod separation;
pub mod token;

// Re-export for convenience
pub use audit::{AuditEntry, EmailLogEntry, Escalation};
pub use run::{RunContext, RunCounters};
pub use separation::{RecordStatus, SeparationRecord};
pub use token::BearerToken;
