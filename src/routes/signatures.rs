//! Signature quota API routes
//!
//! `check-limit` reports the caller's standing against their plan;
//! `register` records one usage unit after an export. Whether an exhausted
//! quota rejects registration depends on the configured policy; the
//! default is advisory.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::{SignatureRecord, SignatureRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::quota::{period_window, QuotaStatus};
use crate::state::AppState;

/// Create the signatures router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-limit", get(check_limit))
        .route("/register", post(register))
        .route("/recent/:limit", get(recent))
}

/// Compute the caller's quota standing. `None` when the user has not been
/// provisioned.
pub(crate) async fn quota_status(state: &AppState, user_id: &str) -> Result<Option<QuotaStatus>> {
    let users = UserRepository::new(state.db());
    let Some(user) = users.get(user_id).await? else {
        return Ok(None);
    };

    let plan = user.plan();
    let (start, end) = period_window(plan, Utc::now());
    let count = SignatureRepository::new(state.db())
        .count_between(user_id, start, end)
        .await?;

    Ok(Some(QuotaStatus::evaluate(plan, count)))
}

/// Report quota standing for the authenticated caller
async fn check_limit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<QuotaStatus>> {
    let status = quota_status(&state, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    file_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    success: bool,
    signature: SignatureRecord,
    message: String,
}

/// Record one usage unit for the caller
async fn register(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    if request.file_name.trim().is_empty() {
        return Err(AppError::BadRequest("fileName is required".to_string()));
    }

    let status = quota_status(&state, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;

    if state.config().quota.enforced && !status.can_sign {
        return Err(AppError::Forbidden(format!(
            "Signature limit exceeded. Plan: {}. Max signatures: {} per {}.",
            status.plan.as_str(),
            status.max_signatures,
            match status.period {
                crate::quota::QuotaPeriod::Week => "week",
                crate::quota::QuotaPeriod::Month => "month",
            }
        )));
    }

    let record = SignatureRepository::new(state.db())
        .create(&user_id, request.file_name.trim())
        .await?;

    tracing::info!(
        user_id = %user_id,
        file_name = %record.file_name,
        remaining = (status.remaining - 1).max(0),
        "signature registered"
    );

    Ok(Json(RegisterResponse {
        success: true,
        signature: record,
        message: "Signature registered successfully".to_string(),
    }))
}

/// Recent usage rows for the caller
async fn recent(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(limit): Path<i32>,
) -> Result<Json<Vec<SignatureRecord>>> {
    let records = SignatureRepository::new(state.db())
        .recent(&user_id, limit.clamp(1, 100))
        .await?;
    Ok(Json(records))
}
