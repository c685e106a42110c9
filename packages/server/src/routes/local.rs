//! Email and password endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Redirect;
use axum::Json;
use tower_sessions::Session;

use identity::auth::{LocalLogin, LocalRegistration};
use identity::AuthError;

use super::AppState;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AuthError::InvalidInput(e.body_text()))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LocalLogin>, JsonRejection>,
) -> Result<Redirect, AuthError> {
    let proof = body(payload)?;
    let id = state.local.login(&proof).await?;
    state.codec.issue(&session, id).await?;

    tracing::info!(identity = %id, "local login");
    Ok(Redirect::to(&state.redirects.success))
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LocalRegistration>, JsonRejection>,
) -> Result<Redirect, AuthError> {
    let proof = body(payload)?;
    let id = state.local.register(&proof).await?;
    state.codec.issue(&session, id).await?;

    tracing::info!(identity = %id, "local registration");
    Ok(Redirect::to(&state.redirects.success))
}
