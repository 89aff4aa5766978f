//! Employee separation submission
//!
//! The authenticated-call orchestration core: ports to the outside world,
//! the termination payload builder, the response classifier, and the batch
//! runner that ties them together for one tenant run.

pub mod classifier;
pub mod payload;
pub mod ports;
pub mod runner;
