//! Captive gateway login redirect.
//!
//! The gateway sends the guest to the portal with `ip`, `link-login-only`
//! and `link-orig` in the query string. That raw query travels through the
//! provider as the OAuth `state` and is decoded here once the email is known.

use url::form_urlencoded;

use crate::config::GatewayConfig;

/// Gateway parameters recovered from the OAuth state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayParams {
    /// Gateway address
    pub ip: String,
    /// Gateway login endpoint
    pub login_url: String,
    /// Where the guest was originally headed
    pub destination: String,
}

impl GatewayParams {
    /// Decode the state, substituting defaults for absent or empty values.
    #[must_use]
    pub fn from_state(state: &str, defaults: &GatewayConfig) -> Self {
        let mut ip = None;
        let mut login_url = None;
        let mut destination = None;

        for (key, value) in form_urlencoded::parse(state.as_bytes()) {
            let slot = match &*key {
                "ip" => &mut ip,
                "link-login-only" => &mut login_url,
                "link-orig" => &mut destination,
                _ => continue,
            };
            // first occurrence wins
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let ip = ip
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| defaults.default_ip.clone());
        let login_url = login_url
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("http://{ip}/login"));
        let destination = destination
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| defaults.default_destination.clone());

        Self {
            ip,
            login_url,
            destination,
        }
    }

    /// URL that logs the guest into the gateway with `email` as username.
    #[must_use]
    pub fn login_redirect(&self, email: &str, password: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", email)
            .append_pair("password", password)
            .append_pair("dst", &self.destination)
            .finish();
        format!("{}?{query}", self.login_url)
    }
}
