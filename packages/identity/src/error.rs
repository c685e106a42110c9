//! # Error taxonomy for authentication and identity resolution
//!
//! Every fallible operation in this crate returns [`AuthError`]. Store-level
//! failures arrive as [`StoreError`](crate::store::StoreError) and are folded in
//! through `From`, which is where a unique-constraint violation on `email`
//! becomes [`AuthError::DuplicateIdentity`].
//!
//! [`AuthError`] is also an axum response: the HTTP layer returns it directly
//! and gets `{"error": {"code", "message"}}` with a matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Local login failed. Never says whether the email or the password was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("no identity exists for this email")]
    IdentityNotFound,
    #[error("an identity with this email already exists")]
    DuplicateIdentity,
    #[error("the provider reports this email as unverified")]
    EmailUnverified,
    #[error("provider profile is missing `{0}`")]
    MissingProfileField(&'static str),
    #[error("missing, expired or invalid session")]
    InvalidToken,
    #[error("{0}")]
    InvalidInput(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Store(StoreError),
    #[error("session error: {0}")]
    Session(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code, also used in failure redirects.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::IdentityNotFound => "identity_not_found",
            AuthError::DuplicateIdentity => "duplicate_identity",
            AuthError::EmailUnverified => "email_unverified",
            AuthError::MissingProfileField(_) => "missing_profile_field",
            AuthError::InvalidToken => "unauthorized",
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::Provider(_) => "provider_error",
            AuthError::Configuration(_) => "configuration_error",
            AuthError::Store(_) => "store_error",
            AuthError::Session(_) => "session_error",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::IdentityNotFound => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::DuplicateIdentity => StatusCode::CONFLICT,
            AuthError::InvalidInput(_)
            | AuthError::MissingProfileField(_)
            | AuthError::EmailUnverified => StatusCode::BAD_REQUEST,
            AuthError::Provider(_) => StatusCode::BAD_GATEWAY,
            AuthError::Configuration(_)
            | AuthError::Store(_)
            | AuthError::Session(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateIdentity,
            StoreError::Invalid(reason) => AuthError::InvalidInput(reason),
            other => AuthError::Store(other),
        }
    }
}

impl From<tower_sessions::session::Error> for AuthError {
    fn from(e: tower_sessions::session::Error) -> Self {
        AuthError::Session(e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Backend details stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}
