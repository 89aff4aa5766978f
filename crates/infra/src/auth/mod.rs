//! SAML-to-OAuth authentication

mod token_manager;

pub use token_manager::TokenManager;
