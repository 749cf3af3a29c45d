//! End-to-end tests for the JSON API
//!
//! Drives the full router (middleware, CORS, fallback) against the
//! in-memory store:
//! - Settings defaults and partial updates
//! - Ad CRUD and active-ad selection in venue time
//! - Admin login
//! - Image upload
//! - Degraded behaviour with the database down

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use wifi_portal::config::Config;
use wifi_portal::portal::{AppState, create_router};
use wifi_portal::schedule::FixedClock;
use portal_core::{AdDraft, ScheduledAd};
use wifi_portal::store::{
    AdStore, CollectedEmail, EmailSource, EmailStore, MemoryStore, SettingsStore,
};

struct TestPortal {
    router: Router,
    store: Arc<MemoryStore>,
    images: tempfile::TempDir,
}

fn portal_with(mut config: Config, now: DateTime<Utc>) -> TestPortal {
    let images = tempfile::tempdir().unwrap();
    config.uploads.image_dir = images.path().join("img");

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, Arc::clone(&store), Arc::new(FixedClock(now))).unwrap();

    TestPortal {
        router: create_router(Arc::new(state)),
        store,
        images,
    }
}

fn portal() -> TestPortal {
    portal_with(Config::default(), Utc::now())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn raw_request(method: &str, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

// ============================================================================
// Health and routing
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let p = portal();
    let (status, body) = send(&p.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let p = portal();
    let (status, body) = send(&p.router, get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn cors_preflight_allows_admin_origin() {
    let p = portal();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/settings")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = p.router.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn settings_default_when_store_is_empty() {
    let p = portal();
    let (status, body) = send(&p.router, get("/api/settings")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["background_image"], "url(/img/nuanu.png)");
    assert_eq!(body["background_image_type"], "url");
    assert_eq!(body["background_image_data"], "");
    assert_eq!(body["background_color"], "#667eea");
    assert_eq!(body["page_title"], "Welcome To NUANU Free WiFi");
    assert_eq!(body["button_text"], "Connect to WiFi");
    assert_eq!(body["google_login_enabled"], "false");
    assert_eq!(body["facebook_login_enabled"], "false");
}

#[tokio::test]
async fn settings_update_ignores_empty_fields() {
    let p = portal();

    // GIVEN: a stored title
    let (status, _) = send(
        &p.router,
        json_request("POST", "/api/settings", &json!({"page_title": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // WHEN: the admin form posts an empty title and a new button label
    let (status, body) = send(
        &p.router,
        json_request(
            "POST",
            "/api/settings",
            &json!({"page_title": "", "button_text": "Go"}),
        ),
    )
    .await;

    // THEN: the title is kept and only the button changes
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    let (_, settings) = send(&p.router, get("/api/settings")).await;
    assert_eq!(settings["page_title"], "Hello");
    assert_eq!(settings["button_text"], "Go");
}

#[tokio::test]
async fn settings_update_rejects_malformed_body() {
    let p = portal();
    let (status, body) = send(&p.router, raw_request("POST", "/api/settings", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request body");
}

#[tokio::test]
async fn settings_secrets_are_blanked_when_redaction_is_on() {
    let mut config = Config::default();
    config.settings.redact_secrets = true;
    let p = portal_with(config, Utc::now());
    p.store.upsert("google_client_id", "gid").await.unwrap();
    p.store.upsert("google_client_secret", "gsecret").await.unwrap();

    let (_, body) = send(&p.router, get("/api/settings")).await;

    assert_eq!(body["google_client_id"], "gid");
    assert_eq!(body["google_client_secret"], "");
}

// ============================================================================
// Ads
// ============================================================================

#[tokio::test]
async fn ad_round_trip_keeps_null_bounds() {
    let p = portal();

    let (status, created) = send(
        &p.router,
        json_request(
            "POST",
            "/api/ads",
            &json!({
                "title": "Sunset",
                "description": "Happy hour",
                "image": "/img/sunset.png",
                "start_date": "",
                "end_date": "2030-12-31",
                "start_time": "17:00",
                "end_time": ""
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);

    let (_, ads) = send(&p.router, get("/api/ads")).await;
    let ad = &ads[0];
    assert_eq!(ad["id"], created["id"]);
    assert_eq!(ad["title"], "Sunset");
    assert_eq!(ad["start_date"], Value::Null);
    assert_eq!(ad["end_date"], "2030-12-31");
    assert_eq!(ad["start_time"], "17:00:00");
    assert_eq!(ad["end_time"], Value::Null);
    assert_eq!(ad["is_active"], true);
}

#[tokio::test]
async fn update_and_delete_ad() {
    let p = portal();
    let (_, created) = send(
        &p.router,
        json_request("POST", "/api/ads", &json!({"title": "Old"})),
    )
    .await;
    let uri = format!("/api/ads/{}", created["id"]);

    let (status, body) = send(
        &p.router,
        json_request("PUT", &uri, &json!({"title": "New", "is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, ads) = send(&p.router, get("/api/ads")).await;
    assert_eq!(ads[0]["title"], "New");
    assert_eq!(ads[0]["is_active"], false);

    let delete = Request::delete(uri.as_str()).body(Body::empty()).unwrap();
    let (status, _) = send(&p.router, delete).await;
    assert_eq!(status, StatusCode::OK);

    let (_, ads) = send(&p.router, get("/api/ads")).await;
    assert_eq!(ads, json!([]));
}

#[tokio::test]
async fn update_without_is_active_keeps_ad_live() {
    let p = portal();
    let (_, created) = send(
        &p.router,
        json_request("POST", "/api/ads", &json!({"title": "Old", "is_active": true})),
    )
    .await;
    let uri = format!("/api/ads/{}", created["id"]);

    let (status, _) = send(&p.router, json_request("PUT", &uri, &json!({"title": "New"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, ads) = send(&p.router, get("/api/ads")).await;
    assert_eq!(ads[0]["title"], "New");
    assert_eq!(ads[0]["is_active"], true);
}

#[tokio::test]
async fn update_with_bad_id_or_body_is_400() {
    let p = portal();

    let (status, body) = send(
        &p.router,
        json_request("PUT", "/api/ads/abc", &json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid ID format");

    let (status, body) = send(&p.router, raw_request("PUT", "/api/ads/1", "[1,2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request body");
}

#[tokio::test]
async fn update_or_delete_missing_ad_is_404() {
    let p = portal();

    let (status, _) = send(
        &p.router,
        json_request("PUT", "/api/ads/999", &json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let delete = Request::delete("/api/ads/999").body(Body::empty()).unwrap();
    let (status, _) = send(&p.router, delete).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn active_ad_follows_venue_calendar() {
    let january_ad = json!({
        "title": "January promo",
        "start_date": "2025-01-01",
        "end_date": "2025-01-31"
    });

    // 04:00 UTC is noon in UTC+8
    let mid_january = Utc.with_ymd_and_hms(2025, 1, 15, 4, 0, 0).unwrap();
    let p = portal_with(Config::default(), mid_january);
    send(&p.router, json_request("POST", "/api/ads", &january_ad)).await;

    let (status, body) = send(&p.router, get("/api/active-ad")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ad"]["title"], "January promo");

    let february = Utc.with_ymd_and_hms(2025, 2, 1, 4, 0, 0).unwrap();
    let p = portal_with(Config::default(), february);
    send(&p.router, json_request("POST", "/api/ads", &january_ad)).await;

    let (status, body) = send(&p.router, get("/api/active-ad")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ad": null}));
}

// ============================================================================
// Admin login
// ============================================================================

#[tokio::test]
async fn admin_login_with_configured_credentials() {
    let mut config = Config::default();
    config.admin.username = "boss".to_string();
    config.admin.password = "hunter2".to_string();
    let p = portal_with(config, Utc::now());

    let (status, body) = send(
        &p.router,
        json_request(
            "POST",
            "/api/auth/login",
            &json!({"username": " boss ", "password": "hunter2"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "token": "nuanu_mock_token_2026"}));
}

#[tokio::test]
async fn admin_login_failure_is_generic() {
    let p = portal();

    let (status, body) = send(
        &p.router,
        json_request(
            "POST",
            "/api/auth/login",
            &json!({"username": "admin", "password": "wrong"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": false, "message": "Invalid username or password"})
    );

    let (status, body) = send(&p.router, raw_request("POST", "/api/auth/login", "nope")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request");
}

// ============================================================================
// Upload
// ============================================================================

const BOUNDARY: &str = "portal-test-boundary";

fn multipart_upload(file_name: &str, data: &str, is_ad: Option<&str>) -> Request<Body> {
    let mut body = String::new();
    if let Some(flag) = is_ad {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"is_ad\"\r\n\r\n{flag}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n{data}\r\n--{BOUNDARY}--\r\n"
    ));

    Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn background_upload_is_stored_and_applied() {
    let p = portal();

    let (status, body) = send(&p.router, multipart_upload("beach.png", "PNGDATA", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/img/upload_"), "{url}");
    assert!(url.ends_with("_beach.png"), "{url}");

    let file_name = url.trim_start_matches("/img/");
    let saved = std::fs::read_to_string(p.images.path().join("img").join(file_name)).unwrap();
    assert_eq!(saved, "PNGDATA");

    let (_, settings) = send(&p.router, get("/api/settings")).await;
    assert_eq!(settings["background_image"], format!("url({url})"));

    // the stored file is served back under /img
    let response = p.router.clone().oneshot(get(url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ad_upload_leaves_background_alone() {
    let p = portal();

    let (status, _) = send(&p.router, multipart_upload("promo.png", "AD", Some("true"))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = send(&p.router, get("/api/settings")).await;
    assert_eq!(settings["background_image"], "url(/img/nuanu.png)");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mut config = Config::default();
    config.uploads.max_file_size = 4;
    let p = portal_with(config, Utc::now());

    let (status, body) = send(&p.router, multipart_upload("big.png", "TOO LARGE", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File too large");
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let p = portal();
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"is_ad\"\r\n\r\ntrue\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&p.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file received");
}

// ============================================================================
// Collected emails
// ============================================================================

#[tokio::test]
async fn emails_endpoint_lists_newest_first() {
    use wifi_portal::store::{EmailSource, EmailStore};

    let p = portal();
    p.store.record("first@example.com", EmailSource::Google).await.unwrap();
    p.store.record("second@example.com", EmailSource::Facebook).await.unwrap();

    let (status, body) = send(&p.router, get("/api/emails")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["email"], "second@example.com");
    assert_eq!(body[0]["source"], "facebook");
    assert_eq!(body[1]["email"], "first@example.com");
}

// ============================================================================
// Unreachable database
// ============================================================================

/// Store whose every call fails the way a dropped database connection does
struct UnreachableStore;

fn unreachable() -> wifi_portal::Error {
    wifi_portal::Error::Upstream("connection refused".to_string())
}

#[async_trait::async_trait]
impl SettingsStore for UnreachableStore {
    async fn get_all(&self) -> wifi_portal::Result<std::collections::HashMap<String, String>> {
        Err(unreachable())
    }

    async fn upsert(&self, _key: &str, _value: &str) -> wifi_portal::Result<()> {
        Err(unreachable())
    }
}

#[async_trait::async_trait]
impl AdStore for UnreachableStore {
    async fn list(&self) -> wifi_portal::Result<Vec<ScheduledAd>> {
        Err(unreachable())
    }

    async fn list_active(&self) -> wifi_portal::Result<Vec<ScheduledAd>> {
        Err(unreachable())
    }

    async fn create(&self, _draft: AdDraft) -> wifi_portal::Result<i64> {
        Err(unreachable())
    }

    async fn update(&self, _id: i64, _draft: AdDraft) -> wifi_portal::Result<bool> {
        Err(unreachable())
    }

    async fn delete(&self, _id: i64) -> wifi_portal::Result<bool> {
        Err(unreachable())
    }
}

#[async_trait::async_trait]
impl EmailStore for UnreachableStore {
    async fn record(&self, _email: &str, _source: EmailSource) -> wifi_portal::Result<()> {
        Err(unreachable())
    }

    async fn list(&self) -> wifi_portal::Result<Vec<CollectedEmail>> {
        Err(unreachable())
    }
}

fn portal_without_database() -> Router {
    let state = AppState::new(
        Config::default(),
        Arc::new(UnreachableStore),
        Arc::new(FixedClock(Utc::now())),
    )
    .unwrap();
    create_router(Arc::new(state))
}

#[tokio::test]
async fn settings_read_falls_back_to_defaults_when_store_is_down() {
    // GIVEN a portal whose database cannot be reached
    let router = portal_without_database();

    // WHEN the login page asks for its settings
    let (status, body) = send(&router, get("/api/settings")).await;

    // THEN the built-in branding is served
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page_title"], "Welcome To NUANU Free WiFi");
    assert_eq!(body["background_image"], "url(/img/nuanu.png)");
    assert_eq!(body["google_login_enabled"], "false");
}

#[tokio::test]
async fn social_login_is_disabled_when_store_is_down() {
    let router = portal_without_database();

    let (status, body) = send(&router, get("/auth/google/login?ip=10.0.0.1")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "provider_disabled");
}

#[tokio::test]
async fn writes_and_ad_lookup_fail_when_store_is_down() {
    let router = portal_without_database();

    let (status, body) = send(
        &router,
        json_request("POST", "/api/settings", &json!({"page_title": "Hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "upstream_failure");

    let (status, body) = send(&router, get("/api/active-ad")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "upstream_failure");
}
