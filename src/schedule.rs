//! Active-ad evaluation against the venue's local clock.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SubsecRound, Utc};
use portal_core::{ScheduledAd, select_active};

use crate::Result;
use crate::store::AdStore;

/// Source of the current instant.
pub trait Clock: Send + Sync + 'static {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant, for tests and previews.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Picks the ad to show right now.
#[derive(Clone)]
pub struct AdScheduler {
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl AdScheduler {
    /// Create a scheduler evaluating windows at `offset` from UTC.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { clock, offset }
    }

    /// Venue-local date and time of day, truncated to whole seconds to
    /// match the `HH:MM:SS` window bounds.
    #[must_use]
    pub fn local_now(&self) -> (NaiveDate, NaiveTime) {
        let local = self.clock.now().with_timezone(&self.offset);
        (local.date_naive(), local.time().trunc_subsecs(0))
    }

    /// The most recently created active ad whose window contains the
    /// venue-local present, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn current(&self, ads: &dyn AdStore) -> Result<Option<ScheduledAd>> {
        let candidates = ads.list_active().await?;
        let (date, time) = self.local_now();
        Ok(select_active(&candidates, date, time).cloned())
    }
}
