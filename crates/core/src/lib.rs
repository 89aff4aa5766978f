//! # Offboard Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The termination payload builder and response classifier
//! - The per-tenant batch runner
//!
//! ## Architecture Principles
//! - Only depends on `offboard-domain`
//! - No database, HTTP, or SMTP code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod separation;

// Re-export specific items to avoid ambiguity
pub use separation::classifier::{classify, Classification};
pub use separation::payload::TerminationPayload;
pub use separation::ports::{
    AuditSink, ConfigStore, DirectoryGateway, RecordStore, SessionTokens, TerminationCall,
    TerminationGateway,
};
pub use separation::runner::BatchRunner;
