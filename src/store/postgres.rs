//! PostgreSQL store.
//!
//! Tables are created with `IF NOT EXISTS` so the store can attach to a
//! database populated by earlier deployments. `scheduled_ads.created_at` is a
//! plain `TIMESTAMP` holding UTC wall time, stamped explicitly on insert so the
//! session time zone never leaks in; `collected_emails.created_at` is
//! `TIMESTAMPTZ`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use portal_core::{AdDraft, ScheduledAd};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use tracing::{debug, info};

use super::{AdStore, CollectedEmail, EmailSource, EmailStore, SettingsStore};
use crate::config::DatabaseConfig;
use crate::{Error, Result};

const SCHEMA: [&str; 4] = [
    r"
    CREATE TABLE IF NOT EXISTS page_settings (
        key TEXT PRIMARY KEY,
        value TEXT,
        setting_key TEXT,
        setting_value TEXT,
        created_at TIMESTAMP DEFAULT NOW(),
        updated_at TIMESTAMP DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS scheduled_ads (
        id SERIAL PRIMARY KEY,
        title TEXT,
        description TEXT,
        image TEXT,
        start_date DATE,
        end_date DATE,
        start_time TIME,
        end_time TIME,
        is_active BOOLEAN DEFAULT TRUE,
        created_at TIMESTAMP DEFAULT (NOW() AT TIME ZONE 'UTC')
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS collected_emails (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL,
        source TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_collected_emails_created_at ON collected_emails(created_at)",
];

const AD_COLUMNS: &str = "id, title, description, image, start_date, end_date, start_time, end_time, is_active, created_at";

const INSERT_AD: &str = r"
    INSERT INTO scheduled_ads
        (title, description, image, start_date, end_date, start_time, end_time, is_active, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW() AT TIME ZONE 'UTC')
    RETURNING id
    ";

/// Store backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build a pool without connecting. Connections are opened on first use,
    /// so the server can start while the database is still unreachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection URL cannot be parsed.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure all tables exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or a statement fails.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database tables ensured");
        Ok(())
    }
}

fn ad_from_row(row: &PgRow) -> Result<ScheduledAd> {
    let created_at: Option<NaiveDateTime> = row.try_get("created_at")?;
    Ok(ScheduledAd {
        id: i64::from(row.try_get::<i32, _>("id")?),
        title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        description: row
            .try_get::<Option<String>, _>("description")?
            .unwrap_or_default(),
        image: row.try_get::<Option<String>, _>("image")?.unwrap_or_default(),
        start_date: row.try_get::<Option<NaiveDate>, _>("start_date")?,
        end_date: row.try_get::<Option<NaiveDate>, _>("end_date")?,
        start_time: row.try_get::<Option<NaiveTime>, _>("start_time")?,
        end_time: row.try_get::<Option<NaiveTime>, _>("end_time")?,
        is_active: row.try_get::<Option<bool>, _>("is_active")?.unwrap_or(true),
        created_at: created_at.unwrap_or_default().and_utc(),
    })
}

fn ad_id(id: i64) -> Result<i32> {
    i32::try_from(id).map_err(|_| Error::NotFound(format!("Ad {id} not found")))
}

#[async_trait::async_trait]
impl SettingsStore for PgStore {
    async fn get_all(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query("SELECT key, value FROM page_settings")
            .fetch_all(&self.pool)
            .await?;

        let mut settings = HashMap::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("key")?;
            let value: Option<String> = row.try_get("value")?;
            settings.insert(key, value.unwrap_or_default());
        }
        Ok(settings)
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO page_settings (key, value, setting_key, setting_value, updated_at)
            VALUES ($1, $2, $1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = $2, setting_value = $2, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        debug!(key, "Setting saved");
        Ok(())
    }
}

#[async_trait::async_trait]
impl AdStore for PgStore {
    async fn list(&self) -> Result<Vec<ScheduledAd>> {
        let rows = sqlx::query(&format!(
            "SELECT {AD_COLUMNS} FROM scheduled_ads ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ad_from_row).collect()
    }

    async fn list_active(&self) -> Result<Vec<ScheduledAd>> {
        let rows = sqlx::query(&format!(
            "SELECT {AD_COLUMNS} FROM scheduled_ads WHERE is_active = TRUE"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ad_from_row).collect()
    }

    async fn create(&self, draft: AdDraft) -> Result<i64> {
        let row = sqlx::query(INSERT_AD)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(&draft.image)
            .bind(draft.start_date)
            .bind(draft.end_date)
            .bind(draft.start_time)
            .bind(draft.end_time)
            .bind(draft.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(i64::from(row.try_get::<i32, _>("id")?))
    }

    async fn update(&self, id: i64, draft: AdDraft) -> Result<bool> {
        let Ok(id) = ad_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query(
            r"
            UPDATE scheduled_ads
            SET title = $1, description = $2, image = $3, start_date = $4, end_date = $5,
                start_time = $6, end_time = $7, is_active = $8
            WHERE id = $9
            ",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.image)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(draft.is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let Ok(id) = ad_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM scheduled_ads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl EmailStore for PgStore {
    async fn record(&self, email: &str, source: EmailSource) -> Result<()> {
        sqlx::query("INSERT INTO collected_emails (email, source) VALUES ($1, $2)")
            .bind(email)
            .bind(source.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CollectedEmail>> {
        let rows = sqlx::query(
            "SELECT id, email, source, created_at FROM collected_emails ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut emails = Vec::with_capacity(rows.len());
        for row in rows {
            let source: String = row.try_get("source")?;
            let Some(source) = EmailSource::parse(&source) else {
                debug!(source, "Skipping email with unknown source");
                continue;
            };
            emails.push(CollectedEmail {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
                source,
                created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            });
        }
        Ok(emails)
    }
}
