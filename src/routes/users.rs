//! User profile API routes
//!
//! Provisioning replaces the identity vendor's `user.created` webhook:
//! the external provider (or a trusted proxy in front of it) posts the
//! profile here. Plan changes land the same way from the billing side.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::{NewUser, User, UserRepository};
use crate::error::{AppError, Result};
use crate::quota::Plan;
use crate::state::AppState;

/// Create the users router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(provision_user))
        .route("/me", get(current_user).delete(remove_user))
        .route("/plan", put(set_plan))
}

/// Provision (or refresh) a user profile
async fn provision_user(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    if new_user.id.trim().is_empty() {
        return Err(AppError::BadRequest("user id must not be empty".to_string()));
    }
    if new_user.email.trim().is_empty() {
        return Err(AppError::BadRequest("email must not be empty".to_string()));
    }

    let repo = UserRepository::new(state.db());
    let user = repo.upsert(&new_user).await?;
    tracing::info!(user_id = %user.id, plan = %user.plan, "user provisioned");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Fetch the caller's own profile
async fn current_user(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<User>> {
    let repo = UserRepository::new(state.db());
    let user = repo
        .get(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;
    Ok(Json(user))
}

/// Remove the caller's profile and, via cascade, their usage rows.
/// Mirrors the identity provider's account-deleted event.
async fn remove_user(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<StatusCode> {
    let repo = UserRepository::new(state.db());
    let deleted = repo.delete(&user_id).await?;
    if deleted {
        tracing::info!(user_id = %user_id, "user deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("User not found: {}", user_id)))
    }
}

#[derive(Debug, Deserialize)]
struct PlanUpdate {
    plan: Plan,
}

/// Change the caller's plan tier
async fn set_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(update): Json<PlanUpdate>,
) -> Result<Json<User>> {
    let repo = UserRepository::new(state.db());
    let user = repo
        .set_plan(&user_id, update.plan)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;
    tracing::info!(user_id = %user.id, plan = %user.plan, "plan updated");
    Ok(Json(user))
}
