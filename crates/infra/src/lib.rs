//! # Offboard Infra
//!
//! Infrastructure layer - adapters behind the core's port traits.
//!
//! This crate contains:
//! - Shared HTTP transport and the authenticated client
//! - SAML-to-OAuth token manager
//! - Employee Central integration (user lookup, termination submission)
//! - SQLite repositories (config, records, audit, email log)
//! - SMTP notification dispatch
//! - Process settings loader
//!
//! ## Architecture
//! - Depends on `offboard-domain` and `offboard-core`
//! - Implements the core's ports; owns every I/O concern

pub mod auth;
pub mod config;
pub mod database;
pub mod http;
pub mod integrations;
pub mod notify;
