use axum::http::StatusCode;
use axum::Json;
use thiserror::Error;

/// Failures raised by the ledger core: period resolution, navigation,
/// aggregation inputs and record validation.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("invalid period kind: {0}")]
    InvalidPeriodKind(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid direction: {0} (expected -1 or 1)")]
    InvalidDirection(i32),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid commission: {0}")]
    InvalidCommission(String),

    #[error("{0}")]
    InvalidBackup(String),

    #[error("date out of range: {0}")]
    DateOutOfRange(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
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

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
