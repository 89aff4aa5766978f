//! # Offboard App
//!
//! Application wiring layer.
//!
//! This crate contains:
//! - The application context (dependency injection)
//! - The `offboard` binary entry point
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;

// Re-export for convenience
pub use context::AppContext;
