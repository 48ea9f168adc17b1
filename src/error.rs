use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::client::ClientError;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    /// The backend answered with a failure we pass through.
    Upstream(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unauthorized(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg) => msg,
        };
        // Same error shape the backend uses, so clients parse one format.
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ClientError> for ApiError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Api { status, message } => match status {
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                StatusCode::BAD_REQUEST | StatusCode::CONFLICT => ApiError::BadRequest(message),
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
                _ => ApiError::Upstream(message),
            },
            ClientError::Http(err) => {
                error!("HTTP error: {err}");
                ApiError::Upstream("Failed to reach booking service".into())
            }
        }
    }
}
