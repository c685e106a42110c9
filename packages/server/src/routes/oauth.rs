//! # OAuth endpoints
//!
//! `GET /auth/{provider}/{flow}` starts an authorization and parks its CSRF
//! state and PKCE verifier in the session. The provider sends the user back to
//! `GET /auth/{provider}/{flow}/callback`, which consumes the pending record,
//! exchanges the code and runs the provider's verifier for the flow. Both
//! outcomes are browser redirects: the success URL, or the failure URL with an
//! `error` code.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use identity::providers::{Flow, PendingAuthorization, RegisteredProvider, SESSION_PENDING_AUTH_KEY};
use identity::{AuthError, Provider};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Resolve path segments to a configured provider. Unknown names, the local
/// provider and unconfigured providers all resolve to `None`.
fn resolve<'a>(
    state: &'a AppState,
    provider: &str,
    flow: &str,
) -> Option<(&'a RegisteredProvider, Flow)> {
    let provider: Provider = provider.parse().ok()?;
    let flow: Flow = flow.parse().ok()?;
    state.providers.get(provider).map(|registered| (registered, flow))
}

pub async fn authorize(
    State(state): State<AppState>,
    Path((provider, flow)): Path<(String, String)>,
    session: Session,
) -> Response {
    let Some((registered, flow)) = resolve(&state, &provider, &flow) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let request = registered.client.authorize(flow);
    let pending = PendingAuthorization {
        provider: registered.client.provider(),
        flow,
        csrf_state: request.csrf_state,
        pkce_verifier: request.pkce_verifier,
    };
    if let Err(e) = session.insert(SESSION_PENDING_AUTH_KEY, &pending).await {
        return AuthError::from(e).into_response();
    }

    tracing::debug!(provider = %pending.provider, flow = %flow, "redirecting to provider");
    Redirect::to(&request.url).into_response()
}

pub async fn callback(
    State(state): State<AppState>,
    Path((provider, flow)): Path<(String, String)>,
    Query(params): Query<CallbackParams>,
    session: Session,
) -> Response {
    let Some((registered, flow)) = resolve(&state, &provider, &flow) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match complete(&state, registered, flow, params, &session).await {
        Ok(id) => {
            tracing::info!(identity = %id, provider = %provider, flow = %flow, "oauth success");
            Redirect::to(&state.redirects.success).into_response()
        }
        Err(e) => {
            tracing::warn!(provider = %provider, flow = %flow, "oauth failure: {}", e);
            Redirect::to(&state.redirects.failure_for(&e)).into_response()
        }
    }
}

async fn complete(
    state: &AppState,
    registered: &RegisteredProvider,
    flow: Flow,
    params: CallbackParams,
    session: &Session,
) -> Result<Uuid, AuthError> {
    // The pending record is single use, whatever the outcome.
    let pending = session
        .remove::<PendingAuthorization>(SESSION_PENDING_AUTH_KEY)
        .await?
        .ok_or_else(|| AuthError::Provider("no authorization in progress".to_string()))?;

    if let Some(error) = params.error {
        return Err(AuthError::Provider(format!("authorization denied: {error}")));
    }
    let code = params
        .code
        .ok_or_else(|| AuthError::InvalidInput("missing code".to_string()))?;
    let csrf_state = params
        .state
        .ok_or_else(|| AuthError::InvalidInput("missing state".to_string()))?;
    pending.check(registered.client.provider(), flow, &csrf_state)?;

    let profile = registered
        .client
        .exchange_code(flow, &code, pending.pkce_verifier)
        .await?;

    let id = match flow {
        Flow::Login => registered.verifier.login(&profile).await?,
        Flow::Register => registered.verifier.register(&profile).await?,
    };
    state.codec.issue(session, id).await?;
    Ok(id)
}
