use api_shared::auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("failed to read seed file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed data: {0}")]
    SeedParse(#[from] serde_yaml::Error),
    #[error("invalid seed data: {0}")]
    InvalidSeed(String),

    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(#[from] AuthError),
}

pub type StubResult<T> = std::result::Result<T, StubError>;

impl StubError {
    fn status(&self) -> StatusCode {
        match self {
            StubError::NotFound(_) => StatusCode::NOT_FOUND,
            StubError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StubError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StubError::SeedRead { .. } | StubError::SeedParse(_) | StubError::InvalidSeed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors are rendered as `{"detail": "..."}`.
impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "stub request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
