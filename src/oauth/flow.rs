//! Authorization-code exchange against Google and Facebook.
//!
//! The token response is trusted as-is: no signature or claim checks are
//! made on it, and only `access_token` is read.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::provider::{Provider, ProviderCredentials};
use crate::config::OAuthConfig;
use crate::{Error, Result};

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Profile endpoint response
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

/// Drives the outbound half of the login flow.
#[derive(Clone)]
pub struct OAuthFlow {
    http_client: Client,
    config: OAuthConfig,
}

impl OAuthFlow {
    /// Create a flow with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self::with_client(http_client, config))
    }

    /// Create a flow around an existing client
    #[must_use]
    pub fn with_client(http_client: Client, config: OAuthConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Provider authorization URL carrying `state` verbatim.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configured endpoint is not a valid URL.
    pub fn authorize_url(
        &self,
        provider: Provider,
        credentials: &ProviderCredentials,
        state: &str,
    ) -> Result<String> {
        let endpoints = self.config.endpoints(provider);
        let redirect_uri = self.config.redirect_uri(provider);

        let params: Vec<(&str, &str)> = match provider {
            Provider::Google => vec![
                ("client_id", credentials.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", endpoints.scope.as_str()),
                ("state", state),
            ],
            Provider::Facebook => vec![
                ("client_id", credentials.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("state", state),
                ("scope", endpoints.scope.as_str()),
            ],
        };

        let url = Url::parse_with_params(&endpoints.authorize_url, &params).map_err(|e| {
            Error::Config(format!("Invalid {provider} authorize_url: {e}"))
        })?;
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Google takes a form POST; Facebook takes a GET with query parameters.
    ///
    /// # Errors
    ///
    /// Returns `Error::TokenExchangeFailed` if the call fails, the provider
    /// answers with a non-success status, or no access token comes back.
    pub async fn exchange_code(
        &self,
        provider: Provider,
        credentials: &ProviderCredentials,
        code: &str,
    ) -> Result<String> {
        let token_url = &self.config.endpoints(provider).token_url;
        let redirect_uri = self.config.redirect_uri(provider);

        let request = match provider {
            Provider::Google => self.http_client.post(token_url).form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ]),
            Provider::Facebook => self.http_client.get(token_url).query(&[
                ("client_id", credentials.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("code", code),
            ]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::TokenExchangeFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenExchangeFailed(format!(
                "HTTP {status} - {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::TokenExchangeFailed(format!("unreadable response: {e}")))?;

        if token.access_token.is_empty() {
            return Err(Error::TokenExchangeFailed(
                "response carried no access_token".to_string(),
            ));
        }

        debug!(provider = provider.slug(), "Exchanged authorization code");
        Ok(token.access_token)
    }

    /// Fetch the guest's email. An empty string means the provider
    /// returned no email.
    ///
    /// # Errors
    ///
    /// Returns `Error::UserInfoFailed` if the profile call fails or answers
    /// with a non-success status.
    pub async fn fetch_email(&self, provider: Provider, access_token: &str) -> Result<String> {
        let userinfo_url = &self.config.endpoints(provider).userinfo_url;

        let request = match provider {
            Provider::Google => self
                .http_client
                .get(userinfo_url)
                .query(&[("access_token", access_token)]),
            Provider::Facebook => self
                .http_client
                .get(userinfo_url)
                .query(&[("fields", "email"), ("access_token", access_token)]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::UserInfoFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::UserInfoFailed(format!("HTTP {}", response.status())));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| Error::UserInfoFailed(format!("unreadable response: {e}")))?;

        Ok(info.email.unwrap_or_default())
    }
}
