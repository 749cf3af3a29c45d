//! Page branding and login-provider settings.
//!
//! Settings are persisted as loose key/value pairs. [`PageSettings`] is the
//! typed view over them, with a hardcoded fallback for every key that has
//! never been stored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Recognised setting keys.
pub mod keys {
    /// CSS background value, e.g. `url(/img/nuanu.png)`
    pub const BACKGROUND_IMAGE: &str = "background_image";
    /// CSS colour shown behind the background image
    pub const BACKGROUND_COLOR: &str = "background_color";
    /// Heading on the login page
    pub const PAGE_TITLE: &str = "page_title";
    /// Label of the connect button
    pub const BUTTON_TEXT: &str = "button_text";
    /// `"true"` when Google login is offered
    pub const GOOGLE_LOGIN_ENABLED: &str = "google_login_enabled";
    /// `"true"` when Facebook login is offered
    pub const FACEBOOK_LOGIN_ENABLED: &str = "facebook_login_enabled";
    /// Google OAuth client id
    pub const GOOGLE_CLIENT_ID: &str = "google_client_id";
    /// Google OAuth client secret
    pub const GOOGLE_CLIENT_SECRET: &str = "google_client_secret";
    /// Facebook app id
    pub const FACEBOOK_APP_ID: &str = "facebook_app_id";
    /// Facebook app secret
    pub const FACEBOOK_APP_SECRET: &str = "facebook_app_secret";

    /// Every key the portal reads.
    pub const ALL: [&str; 10] = [
        BACKGROUND_IMAGE,
        BACKGROUND_COLOR,
        PAGE_TITLE,
        BUTTON_TEXT,
        GOOGLE_LOGIN_ENABLED,
        FACEBOOK_LOGIN_ENABLED,
        GOOGLE_CLIENT_ID,
        GOOGLE_CLIENT_SECRET,
        FACEBOOK_APP_ID,
        FACEBOOK_APP_SECRET,
    ];
}

/// Default background when nothing has been uploaded.
pub const DEFAULT_BACKGROUND_IMAGE: &str = "url(/img/nuanu.png)";
/// Default background colour.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#667eea";
/// Default page heading.
pub const DEFAULT_PAGE_TITLE: &str = "Welcome To NUANU Free WiFi";
/// Default button label.
pub const DEFAULT_BUTTON_TEXT: &str = "Connect to WiFi";

/// Settings as served to the login page and the admin UI.
///
/// All values are strings, including the boolean flags, because that is the
/// shape the front end reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSettings {
    pub background_image: String,
    /// Always `"url"`; kept for front-end compatibility.
    pub background_image_type: String,
    /// Always empty; kept for front-end compatibility.
    pub background_image_data: String,
    pub background_color: String,
    pub page_title: String,
    pub button_text: String,
    pub google_login_enabled: String,
    pub facebook_login_enabled: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub facebook_app_id: String,
    pub facebook_app_secret: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            background_image: DEFAULT_BACKGROUND_IMAGE.to_string(),
            background_image_type: "url".to_string(),
            background_image_data: String::new(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            page_title: DEFAULT_PAGE_TITLE.to_string(),
            button_text: DEFAULT_BUTTON_TEXT.to_string(),
            google_login_enabled: "false".to_string(),
            facebook_login_enabled: "false".to_string(),
            google_client_id: String::new(),
            google_client_secret: String::new(),
            facebook_app_id: String::new(),
            facebook_app_secret: String::new(),
        }
    }
}

impl PageSettings {
    /// Build settings from stored pairs, falling back to defaults for
    /// absent keys. Unknown keys are ignored.
    #[must_use]
    pub fn from_stored(stored: &HashMap<String, String>) -> Self {
        let mut settings = Self::default();
        for (key, value) in stored {
            if let Some(slot) = settings.slot_mut(key) {
                slot.clone_from(value);
            }
        }
        settings
    }

    /// Blank out the OAuth secrets.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.google_client_secret.clear();
        self.facebook_app_secret.clear();
        self
    }

    /// Whether Google login is switched on.
    #[must_use]
    pub fn google_enabled(&self) -> bool {
        self.google_login_enabled == "true"
    }

    /// Whether Facebook login is switched on.
    #[must_use]
    pub fn facebook_enabled(&self) -> bool {
        self.facebook_login_enabled == "true"
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut String> {
        let slot = match key {
            keys::BACKGROUND_IMAGE => &mut self.background_image,
            keys::BACKGROUND_COLOR => &mut self.background_color,
            keys::PAGE_TITLE => &mut self.page_title,
            keys::BUTTON_TEXT => &mut self.button_text,
            keys::GOOGLE_LOGIN_ENABLED => &mut self.google_login_enabled,
            keys::FACEBOOK_LOGIN_ENABLED => &mut self.facebook_login_enabled,
            keys::GOOGLE_CLIENT_ID => &mut self.google_client_id,
            keys::GOOGLE_CLIENT_SECRET => &mut self.google_client_secret,
            keys::FACEBOOK_APP_ID => &mut self.facebook_app_id,
            keys::FACEBOOK_APP_SECRET => &mut self.facebook_app_secret,
            _ => return None,
        };
        Some(slot)
    }
}

/// Partial settings update submitted by the admin UI.
///
/// Missing and empty fields are both treated as "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub background_image: Option<String>,
    pub background_color: Option<String>,
    pub page_title: Option<String>,
    pub button_text: Option<String>,
    pub google_login_enabled: Option<String>,
    pub facebook_login_enabled: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub facebook_app_id: Option<String>,
    pub facebook_app_secret: Option<String>,
}

impl SettingsUpdate {
    /// The `(key, value)` pairs that should be written, skipping empty values.
    #[must_use]
    pub fn changes(&self) -> Vec<(&'static str, &str)> {
        let fields = [
            (keys::PAGE_TITLE, &self.page_title),
            (keys::BUTTON_TEXT, &self.button_text),
            (keys::BACKGROUND_IMAGE, &self.background_image),
            (keys::BACKGROUND_COLOR, &self.background_color),
            (keys::GOOGLE_LOGIN_ENABLED, &self.google_login_enabled),
            (keys::FACEBOOK_LOGIN_ENABLED, &self.facebook_login_enabled),
            (keys::GOOGLE_CLIENT_ID, &self.google_client_id),
            (keys::GOOGLE_CLIENT_SECRET, &self.google_client_secret),
            (keys::FACEBOOK_APP_ID, &self.facebook_app_id),
            (keys::FACEBOOK_APP_SECRET, &self.facebook_app_secret),
        ];

        fields
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v))
            })
            .collect()
    }
}
