//! Persistence layer for settings, ads and collected emails.
//!
//! Each concern has its own trait so handlers only depend on what they use.
//! [`PgStore`] is the production backend; [`MemoryStore`] backs tests and
//! the `--memory` development mode.

mod memory;
mod postgres;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use portal_core::{AdDraft, ScheduledAd};
use serde::{Deserialize, Serialize};

use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Where a collected email came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailSource {
    /// Google login
    Google,
    /// Facebook login
    Facebook,
}

impl EmailSource {
    /// Lowercase name as stored
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }

    /// Parse a stored source name
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "google" => Some(Self::Google),
            "facebook" => Some(Self::Facebook),
            _ => None,
        }
    }
}

/// An email address captured by a successful social login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedEmail {
    /// Row id
    pub id: i64,
    /// Address as returned by the provider
    pub email: String,
    /// Provider the guest logged in with
    pub source: EmailSource,
    /// Capture time
    pub created_at: DateTime<Utc>,
}

/// Key/value settings storage.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync + 'static {
    /// Every stored pair. Absent keys are simply missing from the map.
    async fn get_all(&self) -> Result<HashMap<String, String>>;

    /// Insert or overwrite one key, stamping its update time.
    async fn upsert(&self, key: &str, value: &str) -> Result<()>;
}

/// Scheduled ad storage.
#[async_trait::async_trait]
pub trait AdStore: Send + Sync + 'static {
    /// All ads, newest first.
    async fn list(&self) -> Result<Vec<ScheduledAd>>;

    /// Ads with `is_active` set, in any order.
    async fn list_active(&self) -> Result<Vec<ScheduledAd>>;

    /// Persist a new ad and return its id.
    async fn create(&self, draft: AdDraft) -> Result<i64>;

    /// Replace every field of an ad. Returns `false` when `id` is unknown.
    async fn update(&self, id: i64, draft: AdDraft) -> Result<bool>;

    /// Delete an ad. Returns `false` when `id` is unknown.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Collected email storage.
#[async_trait::async_trait]
pub trait EmailStore: Send + Sync + 'static {
    /// Append one captured address.
    async fn record(&self, email: &str, source: EmailSource) -> Result<()>;

    /// All captured addresses, newest first.
    async fn list(&self) -> Result<Vec<CollectedEmail>>;
}
