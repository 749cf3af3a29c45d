//! Scheduled promotional ads.
//!
//! An ad carries optional date and time-of-day bounds. A bound that is not
//! set never blocks the ad; a bound that is set is compared inclusively.
//!
//! Date and time bounds are checked independently, so a time window such as
//! `22:00`–`02:00` that wraps past midnight can never be satisfied and the
//! ad is effectively never live.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAd {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    #[serde(with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(with = "optional_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "optional_time")]
    pub end_time: Option<NaiveTime>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Ad fields as submitted by the admin UI for create and update.
///
/// Blank strings for the date/time bounds mean "unbounded". An omitted
/// `is_active` means active on update as well as on create; pausing an ad
/// takes an explicit `false`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, with = "optional_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "optional_time")]
    pub end_time: Option<NaiveTime>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl AdDraft {
    /// Materialise the draft as a stored ad.
    #[must_use]
    pub fn into_ad(self, id: i64, created_at: DateTime<Utc>) -> ScheduledAd {
        ScheduledAd {
            id,
            title: self.title,
            description: self.description,
            image: self.image,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_active: self.is_active,
            created_at,
        }
    }
}

impl ScheduledAd {
    /// Whether every configured bound holds at the given local date and time.
    ///
    /// Does not look at `is_active`.
    #[must_use]
    pub fn in_window(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.start_date.is_none_or(|d| d <= date)
            && self.end_date.is_none_or(|d| date <= d)
            && self.start_time.is_none_or(|t| t <= time)
            && self.end_time.is_none_or(|t| time <= t)
    }

    /// Whether the ad should be shown at the given local date and time.
    #[must_use]
    pub fn is_live_at(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.is_active && self.in_window(date, time)
    }
}

/// Pick the ad to show: the most recently created one that is live.
///
/// Ties on `created_at` go to the higher id.
pub fn select_active<'a, I>(ads: I, date: NaiveDate, time: NaiveTime) -> Option<&'a ScheduledAd>
where
    I: IntoIterator<Item = &'a ScheduledAd>,
{
    ads.into_iter()
        .filter(|ad| ad.is_live_at(date, time))
        .max_by_key(|ad| (ad.created_at, ad.id))
}

/// Accepted input formats for time-of-day bounds.
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Parse a time-of-day bound, accepting `HH:MM` as well as `HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

/// Serde for `Option<NaiveDate>` as `YYYY-MM-DD`, with `""` read as `None`.
pub mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `YYYY-MM-DD` or `null`.
    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from `null`, `""` or `YYYY-MM-DD`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid date '{s}': {e}"))),
        }
    }
}

/// Serde for `Option<NaiveTime>` as `HH:MM:SS`, with `""` read as `None`.
pub mod optional_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `HH:MM:SS` or `null`.
    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from `null`, `""`, `HH:MM` or `HH:MM:SS`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_time(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{s}'"))),
        }
    }
}
