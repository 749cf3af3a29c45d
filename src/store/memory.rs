//! In-process store used by tests and `serve --memory`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use portal_core::{AdDraft, ScheduledAd};

use super::{AdStore, CollectedEmail, EmailSource, EmailStore, SettingsStore};
use crate::Result;

#[derive(Default)]
struct Inner {
    settings: HashMap<String, (String, DateTime<Utc>)>,
    ads: Vec<ScheduledAd>,
    emails: Vec<CollectedEmail>,
    next_ad_id: i64,
    next_email_id: i64,
}

/// Everything held behind one lock. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemoryStore {
    async fn get_all(&self) -> Result<HashMap<String, String>> {
        Ok(self
            .inner
            .read()
            .settings
            .iter()
            .map(|(k, (v, _))| (k.clone(), v.clone()))
            .collect())
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .write()
            .settings
            .insert(key.to_string(), (value.to_string(), Utc::now()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl AdStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ScheduledAd>> {
        let mut ads = self.inner.read().ads.clone();
        ads.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(ads)
    }

    async fn list_active(&self) -> Result<Vec<ScheduledAd>> {
        Ok(self
            .inner
            .read()
            .ads
            .iter()
            .filter(|ad| ad.is_active)
            .cloned()
            .collect())
    }

    async fn create(&self, draft: AdDraft) -> Result<i64> {
        let mut inner = self.inner.write();
        inner.next_ad_id += 1;
        let id = inner.next_ad_id;
        inner.ads.push(draft.into_ad(id, Utc::now()));
        Ok(id)
    }

    async fn update(&self, id: i64, draft: AdDraft) -> Result<bool> {
        let mut inner = self.inner.write();
        let Some(slot) = inner.ads.iter_mut().find(|ad| ad.id == id) else {
            return Ok(false);
        };
        *slot = draft.into_ad(id, slot.created_at);
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write();
        let before = inner.ads.len();
        inner.ads.retain(|ad| ad.id != id);
        Ok(inner.ads.len() != before)
    }
}

#[async_trait::async_trait]
impl EmailStore for MemoryStore {
    async fn record(&self, email: &str, source: EmailSource) -> Result<()> {
        let mut inner = self.inner.write();
        inner.next_email_id += 1;
        let id = inner.next_email_id;
        inner.emails.push(CollectedEmail {
            id,
            email: email.to_string(),
            source,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CollectedEmail>> {
        let mut emails = self.inner.read().emails.clone();
        emails.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(emails)
    }
}
