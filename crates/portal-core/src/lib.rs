//! Captive portal core primitives.
//!
//! Plain data types shared by the portal service: the recognised page
//! settings with their fallback values, and scheduled ads together with the
//! window evaluation that decides which ad is live at a given local moment.
//! Nothing here performs I/O.

pub mod ads;
pub mod settings;

pub use ads::{AdDraft, ScheduledAd, select_active};
pub use settings::{PageSettings, SettingsUpdate};
