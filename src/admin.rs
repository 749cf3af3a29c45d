//! Admin login.
//!
//! Credentials come from configuration (itself fed by `ADMIN_USERNAME` and
//! `ADMIN_PASSWORD`). A successful login returns whatever the configured
//! [`SessionIssuer`] hands out.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::AdminConfig;

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Submitted username
    #[serde(default)]
    pub username: String,
    /// Submitted password
    #[serde(default)]
    pub password: String,
}

/// Login response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    /// Whether the credentials matched
    pub success: bool,
    /// Session token on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LoginResponse {
    fn granted(token: String) -> Self {
        Self {
            success: true,
            token: Some(token),
            message: None,
        }
    }

    fn denied() -> Self {
        Self {
            success: false,
            token: None,
            message: Some("Invalid username or password".to_string()),
        }
    }
}

/// Produces the token returned on a successful admin login.
pub trait SessionIssuer: Send + Sync + 'static {
    /// Issue a token for `username`
    fn issue(&self, username: &str) -> String;
}

/// Hands out the same opaque token to every admin.
///
/// The token is not checked by any endpoint; it only satisfies the admin
/// UI's login gate.
#[derive(Debug, Clone)]
pub struct StaticTokenIssuer {
    token: String,
}

impl StaticTokenIssuer {
    /// Create an issuer for a fixed token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl SessionIssuer for StaticTokenIssuer {
    fn issue(&self, _username: &str) -> String {
        self.token.clone()
    }
}

/// Expected admin credentials
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    /// Create from explicit values
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Take the credentials from configuration
    #[must_use]
    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(&config.username, &config.password)
    }

    /// Compare both fields without short-circuiting on the first mismatch.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        (user_ok & pass_ok).into()
    }

    /// Check a login request and build the response body.
    ///
    /// Surrounding whitespace in the submitted values is ignored.
    #[must_use]
    pub fn login(&self, request: &LoginRequest, issuer: &dyn SessionIssuer) -> LoginResponse {
        let username = request.username.trim();
        if self.verify(username, request.password.trim()) {
            tracing::info!(username, "Admin login succeeded");
            LoginResponse::granted(issuer.issue(username))
        } else {
            tracing::warn!(username, "Admin login rejected");
            LoginResponse::denied()
        }
    }
}
