use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PassError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("random source failure: {0}")]
    Entropy(#[from] rand::Error),

    #[error("unique key already taken")]
    Conflict,

    #[error("no free short code after {attempts} attempts")]
    Capacity { attempts: usize },

    #[error("referenced user does not exist")]
    UnknownUser,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("unsupported target URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("target URL contains whitespace or control characters")]
    UnservableTarget,

    #[error("lifetime must be positive")]
    InvalidTtl,

    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("token length {0} is below the 16 byte minimum")]
    InvalidTokenLength(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing or invalid session")]
    Unauthorized,

    #[error("Not found")]
    NotFound,
}

impl PassError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, PassError::Conflict)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PassError::DatabaseError(_) | PassError::Entropy(_) | PassError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PassError::Conflict => StatusCode::CONFLICT,
            PassError::Capacity { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PassError::UnknownUser
            | PassError::UrlParse(_)
            | PassError::UnsupportedScheme(_)
            | PassError::UnservableTarget
            | PassError::InvalidTtl
            | PassError::InvalidAlphabet(_)
            | PassError::InvalidTokenLength(_) => StatusCode::BAD_REQUEST,
            PassError::Unauthorized => StatusCode::UNAUTHORIZED,
            PassError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<figment::Error> for PassError {
    fn from(e: figment::Error) -> Self {
        PassError::Config(e.to_string())
    }
}

impl IntoResponse for PassError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let (code, message) = match &self {
            PassError::DatabaseError(_) | PassError::Entropy(_) | PassError::Config(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
            PassError::Conflict => ("CONFLICT", self.to_string()),
            PassError::Capacity { .. } => (
                "CAPACITY",
                "Could not allocate a short code, try again later.".to_string(),
            ),
            PassError::UnknownUser => ("UNKNOWN_USER", self.to_string()),
            PassError::UrlParse(_)
            | PassError::UnsupportedScheme(_)
            | PassError::UnservableTarget => ("INVALID_URL", self.to_string()),
            PassError::InvalidTtl
            | PassError::InvalidAlphabet(_)
            | PassError::InvalidTokenLength(_) => {
                ("BAD_REQUEST", self.to_string())
            }
            PassError::Unauthorized => ("UNAUTHORIZED", "Authentication required.".to_string()),
            PassError::NotFound => ("NOT_FOUND", "Resource not found.".to_string()),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
