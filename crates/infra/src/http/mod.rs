//! HTTP transport and authenticated client

mod authed;
mod client;

pub use authed::AuthedClient;
pub use client::{HttpTransport, HttpTransportBuilder};
