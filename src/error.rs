//! Error types for the WiFi portal

use std::io;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Result type alias for the WiFi portal
pub type Result<T> = std::result::Result<T, Error>;

/// WiFi portal errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request (bad id, bad body)
    #[error("{0}")]
    Validation(String),

    /// Record or route not found
    #[error("{0}")]
    NotFound(String),

    /// Login provider switched off or missing its client id
    #[error("{0} login is disabled or misconfigured")]
    ProviderDisabled(String),

    /// OAuth callback without an authorization code
    #[error("Code missing")]
    MissingCode,

    /// Authorization code could not be exchanged for an access token
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Provider profile endpoint failed
    #[error("Failed to get user info: {0}")]
    UserInfoFailed(String),

    /// Provider returned a profile without an email address
    #[error("Identity provider did not return an email address")]
    MissingEmail,

    /// Dependency unavailable (store, filesystem, provider)
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status the error is reported with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingCode | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::ProviderDisabled(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code for the JSON body
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Json(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::ProviderDisabled(_) => "provider_disabled",
            Self::MissingCode => "missing_code",
            Self::TokenExchangeFailed(_) => "token_exchange_failed",
            Self::UserInfoFailed(_) => "userinfo_failed",
            Self::MissingEmail => "missing_email",
            Self::Config(_) => "not_configured",
            Self::Upstream(_) | Self::Database(_) | Self::Http(_) => "upstream_failure",
            Self::Io(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show a guest: server-side details are dropped.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::TokenExchangeFailed(_) => "Token exchange failed".to_string(),
            Self::UserInfoFailed(_) => "Failed to get user info".to_string(),
            Self::MissingEmail => self.to_string(),
            _ if self.status_code().is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Like [`IntoResponse`] but with [`Error::public_message`] in the body.
    #[must_use]
    pub fn into_public_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (
            status,
            Json(json!({
                "success": false,
                "error": self.code(),
                "message": self.public_message(),
            })),
        )
            .into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (
            status,
            Json(json!({
                "success": false,
                "error": self.code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
