use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Domain errors returned by the account handlers, mapped to HTTP status
/// codes at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Email in use")]
    EmailInUse,
    #[error("Verification has already been passed")]
    AlreadyVerified,
    #[error("{0}")]
    Auth(&'static str),
    #[error("Not found")]
    NotFound,
    /// Unexpected collaborator failure (database, hasher, signer, mailer).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::EmailInUse => StatusCode::CONFLICT,
            ApiError::AlreadyVerified => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // The underlying cause stays in the server log only.
            ApiError::Internal(err) => {
                error!(error = %err, "unhandled error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
