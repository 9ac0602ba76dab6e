//! Signing endpoint
//!
//! `POST /api/v1/sign` takes a multipart body: `file` (the PDF), `signature`
//! (a PNG/JPEG data URL from the drawing surface) and `placement` (JSON with
//! the page index and UI geometry). The quota check before the export and
//! the usage registration after it are both best-effort: neither a missing
//! quota row, an exhausted advisory quota, nor a failed registration blocks
//! delivery of the signed bytes.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::quota::QuotaStatus;
use crate::signing::geometry::{CanvasGeometry, UiPoint, ViewportGeometry};
use crate::signing::{self, SignRequest};
use crate::state::AppState;

use super::signatures::quota_status;

/// Uploaded documents are capped well above typical contract sizes.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the sign router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(sign_document))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Placement parameters sent by the client alongside the file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacementRequest {
    /// 0-based target page.
    #[serde(default)]
    page_index: usize,
    /// Signature overlay top-left, container pixels.
    position: UiPoint,
    /// Display zoom factor of the rendered page.
    #[serde(default = "default_factor")]
    zoom: f64,
    /// User-adjustable overlay scale factor.
    #[serde(default = "default_factor")]
    signature_scale: f64,
    /// Live measurement of the rendered page surface, when available.
    canvas: Option<CanvasGeometry>,
    /// Client viewport width, used to estimate geometry when no live
    /// measurement was taken.
    viewport_width: Option<f64>,
}

fn default_factor() -> f64 {
    1.0
}

/// Viewport measurements as reported by the request, with the configured
/// fallback width standing in when the client sent nothing usable.
struct RequestViewport {
    canvas: Option<CanvasGeometry>,
    viewport_width: Option<f64>,
    fallback_width: f64,
}

impl ViewportGeometry for RequestViewport {
    fn canvas(&self) -> Option<CanvasGeometry> {
        self.canvas
    }

    fn viewport_width(&self) -> Option<f64> {
        Some(self.viewport_width.unwrap_or(self.fallback_width))
    }
}

async fn sign_document(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut pdf_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut signature_data_url: Option<String> = None;
    let mut placement_json: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|name| name.to_string());
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(|name| name.to_string());
                pdf_bytes = Some(field.bytes().await?.to_vec());
            }
            Some("signature") => signature_data_url = Some(field.text().await?),
            Some("placement") => placement_json = Some(field.text().await?),
            _ => {}
        }
    }

    let pdf = pdf_bytes.ok_or_else(|| AppError::BadRequest("missing 'file' field".to_string()))?;
    let signature_data_url = signature_data_url
        .ok_or_else(|| AppError::BadRequest("missing 'signature' field".to_string()))?;
    let placement_json = placement_json
        .ok_or_else(|| AppError::BadRequest("missing 'placement' field".to_string()))?;
    let placement: PlacementRequest = serde_json::from_str(&placement_json)
        .map_err(|e| AppError::BadRequest(format!("invalid placement: {}", e)))?;
    let file_name = file_name.unwrap_or_else(|| "document.pdf".to_string());

    // Advisory pre-check. Failures and exhausted quotas are surfaced to the
    // caller but never block the export.
    let status_before = match quota_status(&state, &user_id).await {
        Ok(status) => {
            if let Some(status) = &status {
                if !status.can_sign {
                    tracing::info!(
                        user_id = %user_id,
                        plan = status.plan.as_str(),
                        "quota exhausted, proceeding with advisory export"
                    );
                }
            }
            status
        }
        Err(e) => {
            tracing::warn!(user_id = %user_id, "quota check failed, continuing: {}", e);
            None
        }
    };

    let request = SignRequest {
        pdf,
        signature_data_url,
        page_index: placement.page_index,
        ui_position: placement.position,
        ui_zoom: placement.zoom,
        signature_scale: placement.signature_scale,
    };
    let viewport = RequestViewport {
        canvas: placement.canvas,
        viewport_width: placement.viewport_width,
        fallback_width: state.config().signing.fallback_viewport_width,
    };

    // Parsing and re-serializing the document is CPU-bound; keep it off the
    // async workers.
    let signed = tokio::task::spawn_blocking(move || signing::sign_pdf(&request, &viewport))
        .await
        .map_err(|e| AppError::Internal(format!("signing task failed: {}", e)))??;

    // Best-effort usage recording; the signed document is already final.
    let status_after = match register_usage(&state, &user_id, &file_name).await {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!(user_id = %user_id, "could not record signature usage: {}", e);
            status_before
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    let disposition = format!(
        "attachment; filename=\"signed-{}\"",
        sanitize_filename(&file_name)
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"signed-document.pdf\"")),
    );
    if let Some(status) = &status_after {
        if let Ok(value) = HeaderValue::from_str(&status.remaining.to_string()) {
            headers.insert("x-quota-remaining", value);
        }
        if let Ok(value) = HeaderValue::from_str(status.plan.as_str()) {
            headers.insert("x-quota-plan", value);
        }
    }

    Ok((headers, signed.bytes).into_response())
}

/// Record one usage unit and return the refreshed standing.
async fn register_usage(
    state: &AppState,
    user_id: &str,
    file_name: &str,
) -> Result<Option<QuotaStatus>> {
    use crate::db::{SignatureRepository, UserRepository};

    let users = UserRepository::new(state.db());
    if users.get(user_id).await?.is_none() {
        tracing::debug!(user_id = %user_id, "unprovisioned user, skipping usage recording");
        return Ok(None);
    }

    SignatureRepository::new(state.db())
        .create(user_id, file_name)
        .await?;

    quota_status(state, user_id).await
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/'))
        .collect();
    if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_parses_with_defaults() {
        let placement: PlacementRequest =
            serde_json::from_str(r#"{"position":{"x":100.0,"y":200.0}}"#).unwrap();
        assert_eq!(placement.page_index, 0);
        assert_eq!(placement.zoom, 1.0);
        assert_eq!(placement.signature_scale, 1.0);
        assert!(placement.canvas.is_none());
    }

    #[test]
    fn placement_parses_measured_canvas() {
        let placement: PlacementRequest = serde_json::from_str(
            r#"{
                "pageIndex": 2,
                "position": {"x": 10.0, "y": 20.0},
                "zoom": 1.5,
                "signatureScale": 0.8,
                "canvas": {"width": 800.0, "height": 1035.0, "offsetX": 4.0, "offsetY": 2.0}
            }"#,
        )
        .unwrap();
        assert_eq!(placement.page_index, 2);
        let canvas = placement.canvas.unwrap();
        assert_eq!(canvas.width, 800.0);
        assert_eq!(canvas.offset_x, 4.0);
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("contract.pdf"), "contract.pdf");
        assert_eq!(sanitize_filename("a\"b\\c/d.pdf"), "abcd.pdf");
        assert_eq!(sanitize_filename("\u{0}\u{1}"), "document.pdf");
    }
}
