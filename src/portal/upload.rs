//! Image upload

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use chrono::Utc;
use portal_core::settings::keys;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::AppState;
use crate::{Error, Result};

/// POST /api/upload
///
/// Multipart fields: `file` (required) and `is_ad`. Unless `is_ad` is
/// `"true"`, the upload becomes the page background.
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let max_size = state.config.uploads.max_file_size;
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut is_ad = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.len() > max_size {
                    return Err(Error::Validation("File too large".to_string()));
                }
                file = Some((name, data.to_vec()));
            }
            Some("is_ad") => {
                is_ad = field.text().await.map_err(multipart_error)? == "true";
            }
            _ => {}
        }
    }

    let Some((original_name, data)) = file else {
        return Err(Error::Validation("No file received".to_string()));
    };

    let filename = format!(
        "upload_{}_{}",
        Utc::now().timestamp(),
        sanitize_filename(&original_name)
    );
    let dir = state.config.uploads.resolved_image_dir();
    save(&dir, &filename, &data).await?;

    let url = format!("/img/{filename}");
    info!(file = %filename, bytes = data.len(), is_ad, "Stored upload");

    if !is_ad {
        let background = format!("url({url})");
        if let Err(e) = state.settings.upsert(keys::BACKGROUND_IMAGE, &background).await {
            warn!(error = %e, "Failed to set uploaded image as background");
        }
    }

    Ok(Json(json!({ "success": true, "url": url })))
}

async fn save(dir: &Path, filename: &str, data: &[u8]) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::Upstream(format!("Failed to save file: {e}")))?;
    tokio::fs::write(dir.join(filename), data)
        .await
        .map_err(|e| Error::Upstream(format!("Failed to save file: {e}")))
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::Validation("File too large".to_string())
    } else {
        Error::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

/// Reduce a client-supplied name to a safe basename.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\beach.png"), "beach.png");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
    }

    #[test]
    fn sanitize_never_returns_empty_or_dots() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("dir/"), "file");
    }
}
