//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Token lifecycle
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300; // treat tokens as expired 5 min early

// HTTP transport
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Config store purposes
pub const CONFIG_PURPOSE_API: &str = "separation_ec";
pub const CONFIG_PURPOSE_EMAIL: &str = "separation_ec_email";

// User directory endpoint templates substitute the quoted DAS id here
pub const DAS_ID_PLACEHOLDER: &str = "{dasid}";
