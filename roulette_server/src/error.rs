use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use roulette_shared::ApiError;
use tracing::error;

/// Handler error: an [`ApiError`] rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self(ApiError::Invalid(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(ApiError::NotFound(msg.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0.body())).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        error!(error = %err, "database error");
        Self(ApiError::Internal)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        error!(error = %err, "filesystem error");
        Self(ApiError::Internal)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self(ApiError::Invalid(err.body_text()))
    }
}
