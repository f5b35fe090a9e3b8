use crate::server::{service::dto::SerialResponse, telemetry::increment_request_errors};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Error half of every handler. Rendered as `{ "success": false, "message" }`
/// with a status code chosen from the library error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serialno::Error> for ApiError {
    fn from(err: serialno::Error) -> Self {
        use serialno::Error;

        let message = err.to_string();
        match err {
            Error::NotFound { .. } | Error::FormatIdNotFound { .. } => Self::NotFound(message),
            Error::InvalidFormat { .. } | Error::CounterDecrease { .. } => {
                Self::BadRequest(message)
            }
            Error::DuplicateKey { .. } => Self::Conflict(message),
            _ => {
                error!(error = %message, "serial service failure");
                Self::Internal(message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {err}");
        Self::Internal(String::from("internal error"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        increment_request_errors(status.as_u16());
        (status, Json(SerialResponse::failure(self.to_string()))).into_response()
    }
}
