//! Guest social login
//!
//! Two-leg authorization-code flow for Google and Facebook that ends in a
//! redirect to the captive gateway's login endpoint.
//!
//! - `login`: build the provider authorization URL, carrying the gateway's
//!   raw query string as `state`
//! - `callback`: exchange the code, fetch the email, record it, and send the
//!   guest to the gateway with the email as username

mod flow;
mod gateway;
mod handler;
mod provider;

pub use flow::OAuthFlow;
pub use gateway::GatewayParams;
pub use handler::auth_handler;
pub use provider::{AuthStep, Provider, ProviderCredentials};
