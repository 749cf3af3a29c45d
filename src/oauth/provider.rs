//! Supported identity providers.

use std::fmt;
use std::str::FromStr;

use portal_core::PageSettings;

use crate::store::EmailSource;
use crate::{Error, Result};

/// Identity provider a guest can log in with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Google OAuth 2.0
    Google,
    /// Facebook Login
    Facebook,
}

/// Step of the two-leg redirect flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// Browser is sent to the provider
    Login,
    /// Provider sends the browser back with a code
    Callback,
}

/// Client credentials for one provider, read from page settings.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    /// Google client id or Facebook app id
    pub client_id: String,
    /// Matching secret
    pub client_secret: String,
}

impl Provider {
    /// Path segment used in `/auth/{provider}/...`
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }

    /// Source tag for collected emails
    #[must_use]
    pub fn email_source(self) -> EmailSource {
        match self {
            Self::Google => EmailSource::Google,
            Self::Facebook => EmailSource::Facebook,
        }
    }

    /// Credentials for this provider, or `ProviderDisabled` when the login
    /// switch is off or the client id is blank.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProviderDisabled` when the provider may not be used.
    pub fn credentials(self, settings: &PageSettings) -> Result<ProviderCredentials> {
        let (enabled, id, secret) = match self {
            Self::Google => (
                settings.google_enabled(),
                &settings.google_client_id,
                &settings.google_client_secret,
            ),
            Self::Facebook => (
                settings.facebook_enabled(),
                &settings.facebook_app_id,
                &settings.facebook_app_secret,
            ),
        };

        if !enabled || id.is_empty() {
            return Err(Error::ProviderDisabled(self.to_string()));
        }

        Ok(ProviderCredentials {
            client_id: id.clone(),
            client_secret: secret.clone(),
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Google => "Google",
            Self::Facebook => "Facebook",
        })
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            other => Err(Error::NotFound(format!("Unknown auth provider: {other}"))),
        }
    }
}

impl FromStr for AuthStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "login" => Ok(Self::Login),
            "callback" => Ok(Self::Callback),
            other => Err(Error::NotFound(format!("Unknown auth step: {other}"))),
        }
    }
}
