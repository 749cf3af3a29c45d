//! WiFi Portal Library
//!
//! Backend for a captive-portal WiFi hotspot.
//!
//! # Features
//!
//! - **Branding**: page title, button text, background and login switches as
//!   key/value settings with built-in defaults
//! - **Scheduled ads**: date and time-of-day windows evaluated in the venue's
//!   local time
//! - **Social login**: Google and Facebook authorization-code flow ending in a
//!   redirect to the captive gateway's login endpoint
//! - **Admin**: credential check, image upload, collected guest emails

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admin;
pub mod cli;
pub mod config;
pub mod error;
pub mod oauth;
pub mod portal;
pub mod schedule;
pub mod store;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(format!("Failed to install tracing: {e}")))?,
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(format!("Failed to install tracing: {e}")))?,
    }

    Ok(())
}
