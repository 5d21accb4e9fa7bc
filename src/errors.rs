use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid timestamp '{0}': expected YYYY-MM-DDTHH:MM")]
    InvalidTimestamp(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("remote record has no usable id: {0}")]
    InvalidId(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("remote store rejected the request: {0}")]
    RemoteRejected(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<TimestampError> for StoreError {
    fn from(err: TimestampError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::RemoteUnavailable(format!("request timed out: {err}"))
        } else {
            Self::RemoteUnavailable(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("unknown time zone '{0}'")]
    UnknownZone(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput(_) => Self::bad_request(err.to_string()),
            StoreError::RemoteUnavailable(_) | StoreError::RemoteRejected(_) => {
                Self::bad_gateway(err.to_string())
            }
        }
    }
}

impl From<TimestampError> for AppError {
    fn from(err: TimestampError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = FailureBody {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
