//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderName, HeaderValue, Method, Uri, header},
    middleware,
    routing::{get, post, put},
};
use portal_core::{AdDraft, PageSettings, ScheduledAd, SettingsUpdate};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    services::ServeDir, trace::TraceLayer,
};
use tracing::{debug, info, warn};

use super::middleware::request_log_middleware;
use super::upload::upload_handler;
use crate::admin::{AdminCredentials, LoginRequest, LoginResponse, SessionIssuer, StaticTokenIssuer};
use crate::config::{Config, CorsConfig};
use crate::oauth::{OAuthFlow, auth_handler};
use crate::schedule::{AdScheduler, Clock};
use crate::store::{AdStore, CollectedEmail, EmailStore, SettingsStore};
use crate::{Error, Result};

/// Headroom on top of the largest file for multipart framing and other fields
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    /// Effective configuration
    pub config: Arc<Config>,
    /// Page settings storage
    pub settings: Arc<dyn SettingsStore>,
    /// Scheduled ad storage
    pub ads: Arc<dyn AdStore>,
    /// Collected guest emails
    pub emails: Arc<dyn EmailStore>,
    /// Active-ad selection
    pub scheduler: AdScheduler,
    /// Expected admin credentials
    pub admin: AdminCredentials,
    /// Token handed out on admin login
    pub sessions: Arc<dyn SessionIssuer>,
    /// Outbound OAuth calls
    pub oauth: OAuthFlow,
}

impl AppState {
    /// Wire one store implementing every storage trait into the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule offset is invalid or the OAuth HTTP
    /// client cannot be built.
    pub fn new<S>(config: Config, store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self>
    where
        S: SettingsStore + AdStore + EmailStore + 'static,
    {
        let scheduler = AdScheduler::new(clock, config.schedule.offset()?);
        let oauth = OAuthFlow::new(config.oauth.clone())?;
        let admin = AdminCredentials::from_config(&config.admin);
        let sessions = Arc::new(StaticTokenIssuer::new(&config.admin.token));

        Ok(Self {
            config: Arc::new(config),
            settings: Arc::clone(&store) as Arc<dyn SettingsStore>,
            ads: Arc::clone(&store) as Arc<dyn AdStore>,
            emails: store as Arc<dyn EmailStore>,
            scheduler,
            admin,
            sessions,
            oauth,
        })
    }

    /// Current page settings. A store failure is logged and the defaults
    /// are returned instead.
    pub async fn page_settings(&self) -> PageSettings {
        match self.settings.get_all().await {
            Ok(stored) => PageSettings::from_stored(&stored),
            Err(e) => {
                warn!(error = %e, "Failed to read settings, using defaults");
                PageSettings::default()
            }
        }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    let image_dir = state.config.uploads.resolved_image_dir();
    let body_limit = state
        .config
        .server
        .max_body_size
        .max(state.config.uploads.max_file_size + MULTIPART_OVERHEAD);

    info!(path = %image_dir.display(), "Serving images");

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/settings",
            get(get_settings_handler).post(update_settings_handler),
        )
        .route("/api/upload", post(upload_handler))
        .route("/api/auth/login", post(admin_login_handler))
        .route("/api/ads", get(list_ads_handler).post(create_ad_handler))
        .route(
            "/api/ads/{id}",
            put(update_ad_handler).delete(delete_ad_handler),
        )
        .route("/api/active-ad", get(active_ad_handler))
        .route("/api/emails", get(list_emails_handler))
        .route("/auth/{provider}/{step}", get(auth_handler))
        .nest_service("/img", ServeDir::new(image_dir))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_log_middleware))
        .layer(cors_layer(&state.config.cors))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}

/// Parse a JSON body, reporting any failure as a validation error with
/// `message`.
fn parse_body<T: DeserializeOwned>(body: &Bytes, message: &str) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejected request body");
        Error::Validation(message.to_string())
    })
}

fn parse_ad_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| {
        warn!(id = %raw, "Invalid ad id");
        Error::Validation("Invalid ID format".to_string())
    })
}

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Unmatched routes
async fn not_found_handler(uri: Uri) -> Error {
    warn!(path = %uri.path(), "No route");
    Error::NotFound(format!("Not found: {}", uri.path()))
}

/// GET /api/settings
async fn get_settings_handler(State(state): State<Arc<AppState>>) -> Json<PageSettings> {
    let settings = state.page_settings().await;
    if state.config.settings.redact_secrets {
        Json(settings.redacted())
    } else {
        Json(settings)
    }
}

/// POST /api/settings
async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let update: SettingsUpdate = parse_body(&body, "Invalid request body")?;

    for (key, value) in update.changes() {
        state.settings.upsert(key, value).await?;
        debug!(key, "Updated setting");
    }

    Ok(Json(json!({ "success": true })))
}

/// POST /api/auth/login
async fn admin_login_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LoginResponse>> {
    let request: LoginRequest = parse_body(&body, "Invalid request")?;
    Ok(Json(state.admin.login(&request, state.sessions.as_ref())))
}

/// GET /api/ads
async fn list_ads_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ScheduledAd>>> {
    Ok(Json(state.ads.list().await?))
}

/// POST /api/ads
async fn create_ad_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let draft: AdDraft = parse_body(&body, "Invalid request body")?;
    let title = draft.title.clone();
    let id = state.ads.create(draft).await?;
    info!(ad_id = id, title = %title, "Created ad");
    Ok(Json(json!({ "success": true, "id": id })))
}

/// PUT /api/ads/{id}
async fn update_ad_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let id = parse_ad_id(&raw_id)?;
    let draft: AdDraft = parse_body(&body, "Invalid request body")?;
    let active = draft.is_active;

    if !state.ads.update(id, draft).await? {
        return Err(Error::NotFound(format!("Ad {id} not found")));
    }

    info!(ad_id = id, active, "Updated ad");
    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/ads/{id}
async fn delete_ad_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_ad_id(&raw_id)?;

    if !state.ads.delete(id).await? {
        return Err(Error::NotFound(format!("Ad {id} not found")));
    }

    info!(ad_id = id, "Deleted ad");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/active-ad
async fn active_ad_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let ad = state.scheduler.current(state.ads.as_ref()).await?;
    Ok(Json(json!({ "ad": ad })))
}

/// GET /api/emails
async fn list_emails_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CollectedEmail>>> {
    Ok(Json(state.emails.list().await?))
}
