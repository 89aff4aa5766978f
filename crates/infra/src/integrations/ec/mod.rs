//! Employee Central integration
//!
//! User-directory lookups and employment-termination submission against the
//! Employee Central OData API, through the authenticated client.

mod atom;
mod client;

pub use client::EcClient;
