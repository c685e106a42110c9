use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tower_sessions::Session;

use identity::auth::CurrentIdentity;
use identity::models::ProfileUpdate;
use identity::{AuthError, IdentityInfo};

use super::AppState;

/// Destroy the caller's session.
pub async fn logout(
    State(state): State<AppState>,
    CurrentIdentity(id): CurrentIdentity,
    session: Session,
) -> Result<StatusCode, AuthError> {
    state.codec.revoke(&session).await?;
    tracing::info!(identity = %id, "logout");
    Ok(StatusCode::OK)
}

/// The authenticated identity, without its password hash.
pub async fn me(
    State(state): State<AppState>,
    CurrentIdentity(id): CurrentIdentity,
) -> Result<Json<IdentityInfo>, AuthError> {
    let identity = state
        .store
        .get_by_id(id)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    Ok(Json(identity.to_info()))
}

/// Change the caller's own profile fields. Absent fields stay as they are.
pub async fn update_me(
    State(state): State<AppState>,
    CurrentIdentity(id): CurrentIdentity,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<IdentityInfo>, AuthError> {
    let Json(update) = payload.map_err(|e| AuthError::InvalidInput(e.body_text()))?;
    if update.is_empty() {
        return Err(AuthError::InvalidInput("nothing to update".to_string()));
    }

    let identity = state
        .store
        .update_profile(id, update)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    tracing::info!(identity = %id, "profile updated");
    Ok(Json(identity.to_info()))
}
